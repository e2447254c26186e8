// SPDX-License-Identifier: MPL-2.0
//! Translation applier: resolves every directive under a root and writes the
//! result to its target.
//!
//! A pass holds the [`ReentrancyGuard`] from start to finish and never yields,
//! so observers see either none or all of its writes as the engine's own.
//! Targets already holding the resolved value are not rewritten, which makes
//! a repeated pass with the same locale mutation-free.

use super::catalog::Catalog;
use super::directive::{collect, template_params, Directive, Target};
use super::guard::ReentrancyGuard;
use super::locale::Locale;
use crate::dom::{Document, NodeId};

/// Message used for the page title when the whole page is translated.
pub const APP_NAME_KEY: &str = "app_name";

/// Writes translations for one locale into a document.
pub struct Applier<'a> {
    catalog: &'a Catalog,
    guard: &'a ReentrancyGuard,
}

impl<'a> Applier<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, guard: &'a ReentrancyGuard) -> Self {
        Self { catalog, guard }
    }

    /// Translates `root` and everything below it into `locale`.
    ///
    /// When `root` is the document node or the body, the page title is
    /// retitled from [`APP_NAME_KEY`] as well.
    pub fn apply(&self, doc: &mut Document, locale: Locale, root: NodeId) {
        let _scope = self.guard.acquire();
        let mut writes = 0usize;

        for directive in Directive::ALL {
            for element in collect(doc, root, directive) {
                if self.apply_directive(doc, locale, directive, element) {
                    writes += 1;
                }
            }
        }

        if root == doc.root() || root == doc.body() {
            let title = doc.title();
            let translated = self.catalog.lookup_message(locale, APP_NAME_KEY, Some(&title));
            if translated != title {
                doc.set_title(&translated);
                writes += 1;
            }
        }

        log::trace!("applied {locale} under {root:?}: {writes} write(s)");
    }

    /// Returns whether the element was written.
    fn apply_directive(
        &self,
        doc: &mut Document,
        locale: Locale,
        directive: Directive,
        element: NodeId,
    ) -> bool {
        let target = directive.target();
        let resolved = match directive {
            Directive::LanguageIndicator => locale.indicator().to_string(),
            Directive::Template => {
                let Some(key) = directive.key(doc, element) else {
                    return false;
                };
                let rendered =
                    self.catalog
                        .lookup_template(locale, key, &template_params(doc, element));
                // Empty means no template anywhere: keep what is displayed.
                if rendered.is_empty() {
                    return false;
                }
                rendered
            }
            Directive::Text | Directive::Title | Directive::AriaLabel | Directive::Placeholder => {
                let Some(key) = directive.key(doc, element) else {
                    return false;
                };
                let current = current_value(doc, element, target);
                self.catalog
                    .lookup_message(locale, key, current.as_deref())
            }
        };
        write_target(doc, element, target, &resolved)
    }
}

fn current_value(doc: &Document, element: NodeId, target: Target) -> Option<String> {
    match target {
        Target::TextContent => Some(doc.text_content(element)),
        Target::Attribute(name) => doc.get_attribute(element, name).map(str::to_string),
    }
}

fn write_target(doc: &mut Document, element: NodeId, target: Target, value: &str) -> bool {
    match target {
        Target::TextContent => {
            if doc.text_content(element) == value {
                return false;
            }
            doc.set_text_content(element, value);
        }
        Target::Attribute(name) => match doc.get_attribute(element, name) {
            Some(current) if current == value => return false,
            None if value.is_empty() => return false,
            _ => doc.set_attribute(element, name, value),
        },
    }
    true
}
