// SPDX-License-Identifier: MPL-2.0
//! The locale controller: public entry point of the engine.
//!
//! A [`Localizer`] owns the catalogs, the preference store and the mutation
//! watcher for one document. It is the only place that knows the active
//! locale, which lives on the document element as the configured locale
//! attribute.

use super::applier::Applier;
use super::catalog::{Catalog, Params};
use super::guard::ReentrancyGuard;
use super::locale::{self, Locale, LocaleSource, SystemLocale};
use super::watcher::MutationWatcher;
use crate::config::EngineConfig;
use crate::dom::{Document, MutationRecord, NodeId, ObserverCallback, ObserverId};
use crate::error::Result;
use crate::scheduler::FrameScheduler;
use crate::storage::{MemoryStore, PreferenceStore};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

struct Inner {
    document: Rc<RefCell<Document>>,
    catalog: Catalog,
    store: Rc<dyn PreferenceStore>,
    locale_source: Box<dyn LocaleSource>,
    scheduler: Rc<dyn FrameScheduler>,
    config: EngineConfig,
    guard: ReentrancyGuard,
    watcher: MutationWatcher,
    observer: Cell<Option<ObserverId>>,
    applied: Cell<Option<Locale>>,
}

/// Drives translation of one document.
///
/// Cloning is cheap and every clone controls the same engine.
#[derive(Clone)]
pub struct Localizer {
    inner: Rc<Inner>,
}

/// Configures a [`Localizer`].
pub struct LocalizerBuilder {
    document: Rc<RefCell<Document>>,
    scheduler: Rc<dyn FrameScheduler>,
    catalog: Option<Catalog>,
    store: Option<Rc<dyn PreferenceStore>>,
    locale_source: Option<Box<dyn LocaleSource>>,
    config: EngineConfig,
}

impl LocalizerBuilder {
    /// Uses `catalog` instead of the embedded catalogs.
    #[must_use]
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Persists the chosen locale in `store`. Defaults to a [`MemoryStore`].
    #[must_use]
    pub fn store(mut self, store: Rc<dyn PreferenceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Reads the environment locale from `source`. Defaults to [`SystemLocale`].
    #[must_use]
    pub fn locale_source(mut self, source: impl LocaleSource + 'static) -> Self {
        self.locale_source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the engine. Nothing is written to the document until
    /// [`Localizer::start`] or [`Localizer::set_locale`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Catalog`] when the embedded catalogs
    /// are used and fail to parse.
    pub fn build(self) -> Result<Localizer> {
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => Catalog::embedded()?,
        };
        for missing in catalog.missing_keys() {
            log::warn!(
                "{:?} `{}` has no {} translation",
                missing.kind,
                missing.key,
                missing.locale
            );
        }
        Ok(Localizer {
            inner: Rc::new(Inner {
                document: self.document,
                catalog,
                store: self.store.unwrap_or_else(|| Rc::new(MemoryStore::new())),
                locale_source: self
                    .locale_source
                    .unwrap_or_else(|| Box::new(SystemLocale)),
                scheduler: self.scheduler,
                config: self.config,
                guard: ReentrancyGuard::new(),
                watcher: MutationWatcher::new(),
                observer: Cell::new(None),
                applied: Cell::new(None),
            }),
        })
    }
}

impl Localizer {
    /// Starts configuring an engine for `document`, deferring work for
    /// inserted nodes through `scheduler`.
    #[must_use]
    pub fn builder(
        document: Rc<RefCell<Document>>,
        scheduler: Rc<dyn FrameScheduler>,
    ) -> LocalizerBuilder {
        LocalizerBuilder {
            document,
            scheduler,
            catalog: None,
            store: None,
            locale_source: None,
            config: EngineConfig::default(),
        }
    }

    /// Page-ready initialization: applies the detected locale to the whole
    /// document, then starts watching for inserted nodes when enabled.
    pub fn start(&self) -> Locale {
        let locale = self.set_locale(None);
        if self.inner.config.observe_mutations {
            self.watch();
        }
        locale
    }

    /// Switches to `input`, normalized, or to the detected locale when
    /// `None`. Updates the document element, persists the choice and
    /// translates the whole document before returning.
    pub fn set_locale(&self, input: Option<&str>) -> Locale {
        let locale = match input {
            Some(input) => Locale::normalize(Some(input)),
            None => self.detect(),
        };
        self.inner.applied.set(Some(locale));

        let attribute = &self.inner.config.locale_attribute;
        let lang = locale.language_identifier().to_string();
        self.with_document(|doc| {
            let _scope = self.inner.guard.acquire();
            let html = doc.document_element();
            if doc.get_attribute(html, attribute) != Some(locale.as_str()) {
                doc.set_attribute(html, attribute, locale.as_str());
            }
            if doc.get_attribute(html, "lang") != Some(lang.as_str()) {
                doc.set_attribute(html, "lang", &lang);
            }
        });

        if let Err(error) = self
            .inner
            .store
            .set(&self.inner.config.storage_key, locale.as_str())
        {
            log::warn!("failed to persist locale preference: {error}");
        }

        self.apply_to(None, Some(locale));
        log::debug!("locale set to {locale}");
        locale
    }

    /// Switches to the other supported locale.
    pub fn toggle(&self) -> Locale {
        self.set_locale(Some(self.locale().toggled().as_str()))
    }

    /// The active locale: the document element's locale attribute when
    /// readable, else the locale last set, else the detected locale.
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.inner.locale()
    }

    /// Stored preference, then environment locale, then the default.
    #[must_use]
    pub fn detect(&self) -> Locale {
        self.inner.detect()
    }

    /// Translates `root` (the whole document when `None`) into `locale`
    /// (the active locale when `None`).
    pub fn apply_to(&self, root: Option<NodeId>, locale: Option<Locale>) {
        let locale = locale.unwrap_or_else(|| self.locale());
        self.with_document(|doc| {
            let root = root.unwrap_or_else(|| doc.root());
            Applier::new(&self.inner.catalog, &self.inner.guard).apply(doc, locale, root);
        });
    }

    /// Message `key` in the active locale, falling back to English, then
    /// `fallback`, then the empty string.
    #[must_use]
    pub fn translate(&self, key: &str, fallback: Option<&str>) -> String {
        self.inner.catalog.lookup_message(self.locale(), key, fallback)
    }

    /// Shorthand for [`Localizer::translate`] without a fallback.
    #[must_use]
    pub fn tr(&self, key: &str) -> String {
        self.translate(key, None)
    }

    /// Template `key` in the active locale rendered with `params`; empty when
    /// no locale defines it.
    #[must_use]
    pub fn render_template(&self, key: &str, params: &Params) -> String {
        self.inner
            .catalog
            .lookup_template(self.locale(), key, params)
    }

    /// Starts translating elements inserted under the body. Does nothing when
    /// already watching.
    pub fn watch(&self) {
        if self.inner.observer.get().is_some() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let callback: ObserverCallback = Rc::new(move |doc: &Document, records: &[MutationRecord]| {
            if let Some(inner) = weak.upgrade() {
                Inner::on_mutations(&inner, doc, records);
            }
        });
        let id = self.with_document(|doc| {
            let body = doc.body();
            doc.observe(body, callback)
        });
        self.inner.observer.set(id);
    }

    /// Stops translating inserted elements. A batch already scheduled still
    /// runs.
    pub fn unwatch(&self) {
        if let Some(id) = self.inner.observer.take() {
            if self.with_document(|doc| doc.disconnect(id)).is_none() {
                self.inner.observer.set(Some(id));
            }
        }
    }

    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.inner.observer.get().is_some()
    }

    /// Whether inserted elements are waiting for the next frame.
    #[must_use]
    pub fn has_pending_batch(&self) -> bool {
        self.inner.watcher.is_scheduled()
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn document(&self) -> &Rc<RefCell<Document>> {
        &self.inner.document
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> Option<R> {
        self.inner.with_document(f)
    }
}

impl Inner {
    fn locale(&self) -> Locale {
        let attribute = &self.config.locale_attribute;
        let current = self.document.try_borrow().ok().and_then(|doc| {
            doc.get_attribute(doc.document_element(), attribute)
                .map(str::to_string)
        });
        match (current, self.applied.get()) {
            (Some(tag), _) => Locale::normalize(Some(&tag)),
            (None, Some(applied)) => applied,
            (None, None) => self.detect(),
        }
    }

    fn detect(&self) -> Locale {
        locale::detect(&*self.store, &*self.locale_source, &self.config.storage_key)
    }

    fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> Option<R> {
        match self.document.try_borrow_mut() {
            Ok(mut doc) => Some(f(&mut doc)),
            Err(_) => {
                log::warn!("document is busy, skipping localization update");
                None
            }
        }
    }

    fn on_mutations(this: &Rc<Self>, doc: &Document, records: &[MutationRecord]) {
        if this.watcher.record(doc, records, &this.guard) {
            Self::request_flush(this);
        }
    }

    fn request_flush(this: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(this);
        this.scheduler.request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Inner::flush(&inner);
            }
        }));
    }

    fn flush(this: &Rc<Self>) {
        let batch = this.watcher.take_batch();
        if batch.is_empty() {
            return;
        }
        let locale = this.locale();
        let Ok(mut doc) = this.document.try_borrow_mut() else {
            log::debug!("document busy, deferring {} inserted node(s)", batch.len());
            if this.watcher.restore(batch) {
                Self::request_flush(this);
            }
            return;
        };
        let applier = Applier::new(&this.catalog, &this.guard);
        for node in &batch {
            applier.apply(&mut doc, locale, *node);
        }
        log::trace!("translated {} inserted node(s)", batch.len());
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(id) = self.observer.get() {
            if let Ok(mut doc) = self.document.try_borrow_mut() {
                doc.disconnect(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::i18n::FixedLocale;
    use crate::scheduler::FrameQueue;

    struct UnavailableStore;

    impl PreferenceStore for UnavailableStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Storage("storage disabled".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Storage("storage disabled".to_string()))
        }
    }

    fn setup(source: FixedLocale) -> (Localizer, Rc<RefCell<Document>>, Rc<FrameQueue>) {
        let document = Rc::new(RefCell::new(Document::new()));
        let frames = Rc::new(FrameQueue::new());
        let localizer = Localizer::builder(Rc::clone(&document), frames.clone())
            .locale_source(source)
            .build()
            .unwrap();
        (localizer, document, frames)
    }

    fn button(document: &Rc<RefCell<Document>>, key: &str) -> NodeId {
        let mut doc = document.borrow_mut();
        let node = doc.create_element("button");
        doc.set_attribute(node, "data-i18n", key);
        let body = doc.body();
        doc.append_child(body, node).unwrap();
        node
    }

    #[test]
    fn start_uses_environment_locale() {
        let (localizer, document, _) = setup(FixedLocale::new("zh-TW"));
        let save = button(&document, "save");

        assert_eq!(localizer.start(), Locale::Zh);

        let doc = document.borrow();
        assert_eq!(doc.text_content(save), "保存");
        assert_eq!(doc.get_attribute(doc.document_element(), "data-locale"), Some("zh"));
        assert_eq!(doc.get_attribute(doc.document_element(), "lang"), Some("zh-CN"));
    }

    #[test]
    fn locale_reads_document_attribute() {
        let (localizer, document, _) = setup(FixedLocale::none());
        localizer.set_locale(Some("ZH"));
        assert_eq!(localizer.locale(), Locale::Zh);

        let mut doc = document.borrow_mut();
        let html = doc.document_element();
        doc.set_attribute(html, "data-locale", "en");
        drop(doc);
        assert_eq!(localizer.locale(), Locale::En);
    }

    #[test]
    fn translate_and_templates_follow_active_locale() {
        let (localizer, _, _) = setup(FixedLocale::none());
        localizer.set_locale(Some("zh"));

        assert_eq!(localizer.tr("save"), "保存");
        assert_eq!(localizer.translate("nonexistent_key", Some("X")), "X");
        let params = Params::from([("count".to_string(), "4".to_string())]);
        assert_eq!(localizer.render_template("process_count", &params), "进程数：4");
    }

    #[test]
    fn toggle_flips_locale() {
        let (localizer, _, _) = setup(FixedLocale::none());
        localizer.set_locale(Some("en"));
        assert_eq!(localizer.toggle(), Locale::Zh);
        assert_eq!(localizer.toggle(), Locale::En);
    }

    #[test]
    fn watch_is_idempotent_and_unwatch_disconnects() {
        let (localizer, document, _) = setup(FixedLocale::none());
        localizer.watch();
        localizer.watch();
        assert_eq!(document.borrow().observer_count(), 1);

        localizer.unwatch();
        assert!(!localizer.is_watching());
        assert_eq!(document.borrow().observer_count(), 0);
    }

    #[test]
    fn dropping_the_engine_disconnects_observer() {
        let (localizer, document, _) = setup(FixedLocale::none());
        localizer.start();
        assert_eq!(document.borrow().observer_count(), 1);

        drop(localizer);
        assert_eq!(document.borrow().observer_count(), 0);
    }

    #[test]
    fn disabled_observation_skips_watch() {
        let document = Rc::new(RefCell::new(Document::new()));
        let frames = Rc::new(FrameQueue::new());
        let localizer = Localizer::builder(Rc::clone(&document), frames)
            .locale_source(FixedLocale::none())
            .config(EngineConfig {
                observe_mutations: false,
                ..EngineConfig::default()
            })
            .build()
            .unwrap();

        localizer.start();
        assert!(!localizer.is_watching());
    }

    #[test]
    fn busy_document_keeps_last_set_locale() {
        let document = Rc::new(RefCell::new(Document::new()));
        let frames = Rc::new(FrameQueue::new());
        let localizer = Localizer::builder(Rc::clone(&document), frames)
            .store(Rc::new(UnavailableStore))
            .locale_source(FixedLocale::new("zh-CN"))
            .build()
            .unwrap();
        localizer.set_locale(Some("en"));

        let _held = document.borrow_mut();
        assert_eq!(localizer.locale(), Locale::En);
        assert_eq!(localizer.detect(), Locale::Zh);
        assert_eq!(localizer.tr("save"), "Save");
    }

    #[test]
    fn busy_frame_restores_batch_and_retries() {
        let (localizer, document, frames) = setup(FixedLocale::new("zh-CN"));
        localizer.start();
        let cancel = button(&document, "cancel");
        assert_eq!(frames.pending(), 1);

        {
            let _held = document.borrow_mut();
            assert_eq!(frames.run_frame(), 1);
            assert!(localizer.has_pending_batch());
            assert_eq!(frames.pending(), 1);
        }
        assert_eq!(document.borrow().text_content(cancel), "");

        assert_eq!(frames.run_frame(), 1);
        assert_eq!(document.borrow().text_content(cancel), "取消");
        assert!(!localizer.has_pending_batch());
        assert_eq!(frames.pending(), 0);
    }

    #[test]
    fn busy_document_is_skipped_without_panicking() {
        let (localizer, document, _) = setup(FixedLocale::none());
        let _held = document.borrow_mut();
        assert_eq!(localizer.set_locale(Some("zh")), Locale::Zh);
    }
}
