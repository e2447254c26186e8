// SPDX-License-Identifier: MPL-2.0
//! Reactive localization of a document.
//!
//! This module translates a page declaratively using the Fluent localization
//! system. Elements carry directive attributes naming catalog keys; the
//! engine fills in their text and attributes for the active locale and keeps
//! doing so for elements inserted later.
//!
//! # Features
//!
//! - Locale detection from the stored preference, then the environment
//! - Embedded `.ftl` message and template catalogs with English fallback
//! - Runtime language switching that retranslates the whole page
//! - Batched translation of inserted nodes, one pass per frame
//!
//! # Examples
//!
//! ```
//! use dashboard_i18n::dom::Document;
//! use dashboard_i18n::i18n::{FixedLocale, Locale, Localizer};
//! use dashboard_i18n::scheduler::FrameQueue;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let document = Rc::new(RefCell::new(Document::new()));
//! let frames = Rc::new(FrameQueue::new());
//! let localizer = Localizer::builder(Rc::clone(&document), frames.clone())
//!     .locale_source(FixedLocale::new("zh-CN"))
//!     .build()
//!     .expect("embedded catalogs parse");
//!
//! assert_eq!(localizer.start(), Locale::Zh);
//! assert_eq!(localizer.tr("save"), "保存");
//! ```

pub mod applier;
pub mod catalog;
pub mod directive;
pub mod guard;
pub mod locale;
mod localizer;
pub mod watcher;

pub use applier::Applier;
pub use catalog::{Catalog, CatalogKind, MissingKey, Params};
pub use directive::Directive;
pub use guard::ReentrancyGuard;
pub use locale::{detect, FixedLocale, Locale, LocaleSource, SystemLocale};
pub use localizer::{Localizer, LocalizerBuilder};
pub use watcher::MutationWatcher;
