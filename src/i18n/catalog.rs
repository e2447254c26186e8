// SPDX-License-Identifier: MPL-2.0
//! Message and template catalogs.
//!
//! Each locale owns two Fluent resources embedded from `assets/i18n/<locale>/`:
//!
//! - `messages.ftl`: literal strings, looked up with [`Catalog::lookup_message`]
//! - `templates.ftl`: patterns over `{ $param }` variables, rendered with
//!   [`Catalog::lookup_template`]. Every template lists a default token for
//!   each of its parameters as an attribute of the same name, so rendering
//!   with a partial parameter bag never fails:
//!
//! ```text
//! page_of = Page { $page } / { $totalPages }
//!     .page = ?
//!     .totalPages = ?
//! ```
//!
//! Both lookups fall back from the requested locale to [`Locale::DEFAULT`].

use super::locale::Locale;
use crate::error::{Error, Result};
use fluent_bundle::{FluentArgs, FluentBundle, FluentResource};
use fluent_syntax::ast;
use rust_embed::RustEmbed;
use std::collections::{BTreeSet, HashMap};

#[derive(RustEmbed)]
#[folder = "assets/i18n/"]
struct Asset;

const MESSAGES_FILE: &str = "messages.ftl";
const TEMPLATES_FILE: &str = "templates.ftl";

/// Parameter bag passed to templates. Order is irrelevant.
pub type Params = HashMap<String, String>;

/// Which of the two catalogs an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CatalogKind {
    Message,
    Template,
}

/// A key defined for some locale but absent from another.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MissingKey {
    pub locale: Locale,
    pub kind: CatalogKind,
    pub key: String,
}

struct LocaleCatalog {
    messages: FluentBundle<FluentResource>,
    templates: FluentBundle<FluentResource>,
    message_keys: BTreeSet<String>,
    template_keys: BTreeSet<String>,
}

/// Per-locale message and template catalogs.
pub struct Catalog {
    locales: HashMap<Locale, LocaleCatalog>,
}

impl Catalog {
    /// Loads the catalogs compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] if a catalog file is missing or not valid Fluent.
    pub fn embedded() -> Result<Self> {
        let mut sources = Vec::with_capacity(Locale::ALL.len());
        for locale in Locale::ALL {
            sources.push((
                locale,
                embedded_source(locale, MESSAGES_FILE)?,
                embedded_source(locale, TEMPLATES_FILE)?,
            ));
        }
        Self::from_sources(sources)
    }

    /// Builds catalogs from `(locale, messages.ftl, templates.ftl)` sources.
    /// Locales without a source simply have no entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalog`] if any source is not valid Fluent.
    pub fn from_sources<I, S>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Locale, S, S)>,
        S: Into<String>,
    {
        let mut locales = HashMap::new();
        for (locale, messages, templates) in sources {
            let (messages, message_keys) = build_bundle(locale, messages.into(), MESSAGES_FILE)?;
            let (templates, template_keys) =
                build_bundle(locale, templates.into(), TEMPLATES_FILE)?;
            locales.insert(
                locale,
                LocaleCatalog {
                    messages,
                    templates,
                    message_keys,
                    template_keys,
                },
            );
        }
        Ok(Self { locales })
    }

    /// The literal message for `key` in exactly `locale`, without fallback.
    #[must_use]
    pub fn message(&self, locale: Locale, key: &str) -> Option<String> {
        let bundle = &self.locales.get(&locale)?.messages;
        let pattern = bundle.get_message(key)?.value()?;
        let mut errors = Vec::new();
        let value = bundle.format_pattern(pattern, None, &mut errors);
        if !errors.is_empty() {
            log::warn!("message `{key}` ({locale}) failed to format: {errors:?}");
            return None;
        }
        Some(value.into_owned())
    }

    /// Resolves `key`: `locale`, then the default locale, then `fallback`,
    /// then the empty string.
    #[must_use]
    pub fn lookup_message(&self, locale: Locale, key: &str, fallback: Option<&str>) -> String {
        self.message(locale, key)
            .or_else(|| self.default_locale_entry(locale, |default| self.message(default, key)))
            .or_else(|| fallback.map(str::to_string))
            .unwrap_or_default()
    }

    /// Renders the template for `key` in exactly `locale`, without fallback.
    ///
    /// Parameters absent from `params` take the template's declared default.
    #[must_use]
    pub fn template(&self, locale: Locale, key: &str, params: &Params) -> Option<String> {
        let bundle = &self.locales.get(&locale)?.templates;
        let message = bundle.get_message(key)?;
        let pattern = message.value()?;

        let mut errors = Vec::new();
        let mut values: HashMap<String, String> = message
            .attributes()
            .map(|attribute| {
                let default = bundle.format_pattern(attribute.value(), None, &mut errors);
                (attribute.id().to_string(), default.into_owned())
            })
            .collect();
        values.extend(params.iter().map(|(name, value)| (name.clone(), value.clone())));

        let mut args = FluentArgs::new();
        for (name, value) in values {
            args.set(name, value);
        }
        let rendered = bundle.format_pattern(pattern, Some(&args), &mut errors);
        if !errors.is_empty() {
            log::debug!("template `{key}` ({locale}) rendered with errors: {errors:?}");
        }
        Some(rendered.into_owned())
    }

    /// Renders `key` from `locale`, else from the default locale, else `""`.
    #[must_use]
    pub fn lookup_template(&self, locale: Locale, key: &str, params: &Params) -> String {
        self.template(locale, key, params)
            .or_else(|| {
                self.default_locale_entry(locale, |default| self.template(default, key, params))
            })
            .unwrap_or_default()
    }

    /// Keys of one catalog for one locale, sorted.
    pub fn keys(&self, locale: Locale, kind: CatalogKind) -> impl Iterator<Item = &str> {
        self.locales
            .get(&locale)
            .into_iter()
            .flat_map(move |catalog| match kind {
                CatalogKind::Message => catalog.message_keys.iter(),
                CatalogKind::Template => catalog.template_keys.iter(),
            })
            .map(String::as_str)
    }

    /// Every key that some loaded locale defines and another loaded locale
    /// lacks, sorted by locale, catalog and key.
    #[must_use]
    pub fn missing_keys(&self) -> Vec<MissingKey> {
        let mut missing = Vec::new();
        for kind in [CatalogKind::Message, CatalogKind::Template] {
            let all: BTreeSet<&str> = self
                .locales
                .keys()
                .flat_map(|locale| self.keys(*locale, kind))
                .collect();
            for locale in self.locales.keys() {
                let present: BTreeSet<&str> = self.keys(*locale, kind).collect();
                missing.extend(all.difference(&present).map(|key| MissingKey {
                    locale: *locale,
                    kind,
                    key: (*key).to_string(),
                }));
            }
        }
        missing.sort();
        missing
    }

    fn default_locale_entry(
        &self,
        locale: Locale,
        lookup: impl FnOnce(Locale) -> Option<String>,
    ) -> Option<String> {
        if locale == Locale::DEFAULT {
            None
        } else {
            lookup(Locale::DEFAULT)
        }
    }
}

fn embedded_source(locale: Locale, file: &str) -> Result<String> {
    let path = format!("{}/{}", locale.as_str(), file);
    let asset = Asset::get(&path)
        .ok_or_else(|| Error::Catalog(format!("missing embedded catalog {path}")))?;
    Ok(String::from_utf8_lossy(asset.data.as_ref()).into_owned())
}

fn build_bundle(
    locale: Locale,
    source: String,
    label: &str,
) -> Result<(FluentBundle<FluentResource>, BTreeSet<String>)> {
    let resource = FluentResource::try_new(source).map_err(|(_, errors)| {
        Error::Catalog(format!("{locale}/{label}: parse errors {errors:?}"))
    })?;
    let ids = message_ids(&resource);
    let mut bundle = FluentBundle::new(vec![locale.language_identifier()]);
    bundle.set_use_isolating(false);
    bundle
        .add_resource(resource)
        .map_err(|errors| Error::Catalog(format!("{locale}/{label}: {errors:?}")))?;
    Ok((bundle, ids))
}

/// Identifiers of the messages in a parsed resource. Terms and comments are
/// not messages.
fn message_ids(resource: &FluentResource) -> BTreeSet<String> {
    resource
        .entries()
        .filter_map(|entry| match entry {
            ast::Entry::Message(message) => Some(message.id.name.to_string()),
            _ => None,
        })
        .collect()
}
