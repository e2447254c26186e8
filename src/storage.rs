// SPDX-License-Identifier: MPL-2.0
//! Key-value preference persistence.
//!
//! The engine treats persistence as best effort: [`PreferenceStore`] calls
//! may fail, and callers in this crate log and ignore those failures.
//!
//! Two implementations are provided:
//! - [`MemoryStore`]: per-session storage held in memory
//! - [`TomlPreferenceStore`]: a flat `key = "value"` table in
//!   `preferences.toml` under the application data directory

use crate::error::{Error, Result};
use crate::paths;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Preference file name within the app data directory.
const PREFERENCES_FILE: &str = "preferences.toml";

/// A fallible string key-value store.
pub trait PreferenceStore {
    /// Reads a value. `Ok(None)` means the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Rc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-memory store; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store. Every `set` rewrites the whole file.
#[derive(Debug, Clone)]
pub struct TomlPreferenceStore {
    path: PathBuf,
}

impl TomlPreferenceStore {
    /// Store at an explicit file path.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the application data directory.
    ///
    /// # Path Resolution
    ///
    /// 1. `base_dir` parameter (if `Some`)
    /// 2. `--data-dir` CLI override
    /// 3. `DASHBOARD_I18N_DATA_DIR` environment variable
    /// 4. Platform-specific data directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] when no data directory can be determined.
    pub fn in_data_dir(base_dir: Option<PathBuf>) -> Result<Self> {
        paths::get_app_data_dir_with_override(base_dir)
            .map(|dir| Self::at_path(dir.join(PREFERENCES_FILE)))
            .ok_or_else(|| Error::Storage("no data directory available".to_string()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl PreferenceStore for TomlPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_table()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // An unreadable file is replaced rather than blocking the write.
        let mut table = self.read_table().unwrap_or_default();
        table.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&table)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
