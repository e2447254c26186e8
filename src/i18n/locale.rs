// SPDX-License-Identifier: MPL-2.0
//! Supported locales and locale resolution.
//!
//! Resolution is total: every input, including absent or malformed ones,
//! yields a supported [`Locale`].

use crate::storage::PreferenceStore;
use std::fmt;
use std::str::FromStr;
use unic_langid::{langid, LanguageIdentifier};

/// A language the dashboard renders text in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    /// Every supported locale, default first.
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Zh];

    /// The locale used when nothing else resolves, and the lookup fallback.
    pub const DEFAULT: Locale = Locale::En;

    /// Maps any input to a supported locale: text starting with `zh`
    /// (case-insensitive) is Chinese, everything else is English.
    #[must_use]
    pub fn normalize(input: Option<&str>) -> Locale {
        match input {
            Some(text) if text.get(..2).is_some_and(|prefix| prefix.eq_ignore_ascii_case("zh")) => {
                Locale::Zh
            }
            _ => Locale::DEFAULT,
        }
    }

    /// [`Locale::normalize`] over the textual form of an arbitrary value.
    #[must_use]
    pub fn from_display(value: &impl fmt::Display) -> Locale {
        Locale::normalize(Some(&value.to_string()))
    }

    /// Short tag stored in preferences and the document locale attribute.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }

    /// Full language tag for the document `lang` attribute.
    #[must_use]
    pub fn language_identifier(self) -> LanguageIdentifier {
        match self {
            Locale::En => langid!("en"),
            Locale::Zh => langid!("zh-CN"),
        }
    }

    /// Glyph shown by language indicator elements.
    #[must_use]
    pub fn indicator(self) -> &'static str {
        match self {
            Locale::En => "EN",
            Locale::Zh => "中",
        }
    }

    /// The locale a language switch button moves to.
    #[must_use]
    pub fn toggled(self) -> Locale {
        match self {
            Locale::En => Locale::Zh,
            Locale::Zh => Locale::En,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Locale::normalize(Some(s)))
    }
}

impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Locale::normalize(Some(value))
    }
}

/// The embedding environment's locale signal.
pub trait LocaleSource {
    /// Best-effort locale tag, `None` when unknown.
    fn locale(&self) -> Option<String>;
}

/// Reads the operating system locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLocale;

impl LocaleSource for SystemLocale {
    fn locale(&self) -> Option<String> {
        sys_locale::get_locale()
    }
}

/// A fixed environment locale, for embedding hosts that already know it.
#[derive(Debug, Clone, Default)]
pub struct FixedLocale(pub Option<String>);

impl FixedLocale {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self(Some(tag.to_string()))
    }

    #[must_use]
    pub fn none() -> Self {
        Self(None)
    }
}

impl LocaleSource for FixedLocale {
    fn locale(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Resolves the initial locale: stored preference, then the environment, then
/// the default. A failing store is treated as empty.
pub fn detect(store: &dyn PreferenceStore, source: &dyn LocaleSource, key: &str) -> Locale {
    let stored = match store.get(key) {
        Ok(value) => value.filter(|value| !value.is_empty()),
        Err(error) => {
            log::debug!("ignoring unreadable locale preference: {error}");
            None
        }
    };
    if let Some(value) = stored {
        return Locale::normalize(Some(&value));
    }
    match source.locale() {
        Some(tag) => Locale::normalize(Some(&tag)),
        None => Locale::DEFAULT,
    }
}
