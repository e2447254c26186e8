// SPDX-License-Identifier: MPL-2.0
//! Declarative translation directives and the binding scanner.
//!
//! Elements opt in to translation with one attribute per target:
//!
//! | Attribute               | Writes                    |
//! |-------------------------|---------------------------|
//! | `data-i18n`             | text content (message)    |
//! | `data-i18n-title`       | `title` attribute         |
//! | `data-i18n-aria-label`  | `aria-label` attribute    |
//! | `data-i18n-placeholder` | `placeholder` attribute   |
//! | `data-i18n-template`    | text content (template)   |
//! | `data-i18n-lang`        | text content (locale glyph) |
//!
//! The attribute value is the catalog key. A template element's parameters
//! are its remaining `data-*` attributes, keyed by dataset name.

use super::catalog::Params;
use crate::dom::{Document, NodeId};

/// One kind of translation binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Text,
    Title,
    AriaLabel,
    Placeholder,
    Template,
    LanguageIndicator,
}

/// Where a directive's result is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    TextContent,
    Attribute(&'static str),
}

impl Directive {
    /// Every directive, in application order.
    pub const ALL: [Directive; 6] = [
        Directive::Text,
        Directive::Title,
        Directive::AriaLabel,
        Directive::Placeholder,
        Directive::Template,
        Directive::LanguageIndicator,
    ];

    /// The marker attribute.
    #[must_use]
    pub fn attribute(self) -> &'static str {
        match self {
            Directive::Text => "data-i18n",
            Directive::Title => "data-i18n-title",
            Directive::AriaLabel => "data-i18n-aria-label",
            Directive::Placeholder => "data-i18n-placeholder",
            Directive::Template => "data-i18n-template",
            Directive::LanguageIndicator => "data-i18n-lang",
        }
    }

    /// The marker's dataset name (`data-i18n-aria-label` is `i18nAriaLabel`).
    #[must_use]
    pub fn dataset_name(self) -> &'static str {
        match self {
            Directive::Text => "i18n",
            Directive::Title => "i18nTitle",
            Directive::AriaLabel => "i18nAriaLabel",
            Directive::Placeholder => "i18nPlaceholder",
            Directive::Template => "i18nTemplate",
            Directive::LanguageIndicator => "i18nLang",
        }
    }

    #[must_use]
    pub fn target(self) -> Target {
        match self {
            Directive::Title => Target::Attribute("title"),
            Directive::AriaLabel => Target::Attribute("aria-label"),
            Directive::Placeholder => Target::Attribute("placeholder"),
            Directive::Text | Directive::Template | Directive::LanguageIndicator => {
                Target::TextContent
            }
        }
    }

    /// Whether the dataset name `key` is one of the directive markers.
    #[must_use]
    pub fn is_marker(key: &str) -> bool {
        Directive::ALL
            .iter()
            .any(|directive| directive.dataset_name() == key)
    }

    /// The element's non-empty key for this directive.
    #[must_use]
    pub fn key(self, doc: &Document, element: NodeId) -> Option<&str> {
        doc.get_attribute(element, self.attribute())
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Elements under `root` (inclusive) carrying `directive`, in document order.
///
/// Text nodes and unknown ids yield nothing.
#[must_use]
pub fn collect(doc: &Document, root: NodeId, directive: Directive) -> Vec<NodeId> {
    if !doc.is_container(root) {
        return Vec::new();
    }
    let attribute = directive.attribute();
    std::iter::once(root)
        .chain(doc.descendants(root))
        .filter(|node| doc.has_attribute(*node, attribute))
        .collect()
}

/// Template parameters of an element: its `data-*` attributes other than the
/// directive markers, keyed by dataset name.
#[must_use]
pub fn template_params(doc: &Document, element: NodeId) -> Params {
    doc.dataset(element)
        .into_iter()
        .filter(|(key, _)| !Directive::is_marker(key))
        .collect()
}
