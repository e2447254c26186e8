// SPDX-License-Identifier: MPL-2.0
//! Dashboard update notice.
//!
//! The newest released version is looked up at most once per interval; the
//! result is cached in the preference store so page loads in between reuse it.
//! Fetching the release tag is the caller's job: [`UpdateCheck::is_due`] says
//! when to fetch and [`UpdateCheck::record_release`] stores what was fetched.

use crate::config::{DEFAULT_UPDATE_CHECK_KEY, UPDATE_CHECK_INTERVAL_SECS};
use crate::error::Result;
use crate::i18n::{Localizer, Params};
use crate::storage::PreferenceStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Template rendering the notice.
pub const UPDATE_TEMPLATE_KEY: &str = "update_available";

/// Cached result of the last lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_version: Option<String>,
    /// Unix timestamp of the lookup, 0 when never checked.
    #[serde(default)]
    pub last_checked: i64,
}

/// Update bookkeeping over a preference store.
pub struct UpdateCheck<'a> {
    store: &'a dyn PreferenceStore,
    key: String,
    interval: Duration,
}

impl<'a> UpdateCheck<'a> {
    /// Uses the default key and a one-day interval.
    #[must_use]
    pub fn new(store: &'a dyn PreferenceStore) -> Self {
        Self {
            store,
            key: DEFAULT_UPDATE_CHECK_KEY.to_string(),
            interval: Duration::seconds(UPDATE_CHECK_INTERVAL_SECS),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// The cached record. Missing or unreadable records read as never checked.
    #[must_use]
    pub fn record(&self) -> UpdateRecord {
        let stored = match self.store.get(&self.key) {
            Ok(value) => value,
            Err(error) => {
                log::debug!("ignoring unreadable update record: {error}");
                None
            }
        };
        let Some(stored) = stored else {
            return UpdateRecord::default();
        };
        toml::from_str(&stored).unwrap_or_else(|error| {
            log::debug!("discarding malformed update record: {error}");
            UpdateRecord::default()
        })
    }

    /// Whether more than one interval has passed since the last lookup.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() - self.record().last_checked > self.interval.num_seconds()
    }

    /// Caches a fetched release tag (a leading `v` is dropped) as checked at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error when the record cannot be serialized or stored.
    pub fn record_release(&self, tag: &str, now: DateTime<Utc>) -> Result<UpdateRecord> {
        let version = tag.trim();
        let version = version.strip_prefix('v').unwrap_or(version);
        let record = UpdateRecord {
            newest_version: Some(version.to_string()).filter(|version| !version.is_empty()),
            last_checked: now.timestamp(),
        };
        let serialized = toml::to_string(&record)?;
        self.store.set(&self.key, &serialized)?;
        log::debug!("cached release {version}");
        Ok(record)
    }

    /// The cached newest version when it is newer than `current`.
    #[must_use]
    pub fn available_update(&self, current: &str) -> Option<String> {
        self.record()
            .newest_version
            .filter(|newest| compare_versions(newest, current) == Ordering::Greater)
    }
}

/// The localized notice for `version`, in the localizer's active locale.
#[must_use]
pub fn update_message(localizer: &Localizer, version: &str) -> String {
    let params = Params::from([("version".to_string(), version.to_string())]);
    localizer.render_template(UPDATE_TEMPLATE_KEY, &params)
}

/// Compares version strings with digit runs ordered by value, so `0.10.0`
/// is newer than `0.9.3`. Other characters compare as text.
#[must_use]
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let mut left = Chunks::new(left);
    let mut right = Chunks::new(right);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ordering = match (a, b) {
                    (Chunk::Number(a), Chunk::Number(b)) => {
                        let a = a.trim_start_matches('0');
                        let b = b.trim_start_matches('0');
                        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
                    }
                    (Chunk::Number(a), Chunk::Text(b)) | (Chunk::Text(a), Chunk::Number(b)) => {
                        a.cmp(b)
                    }
                    (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Number(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits {
            Chunk::Number(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).single().unwrap()
    }

    #[test]
    fn numeric_runs_compare_by_value() {
        assert_eq!(compare_versions("0.10.0", "0.9.3"), Ordering::Greater);
        assert_eq!(compare_versions("1.2", "1.2"), Ordering::Equal);
        assert_eq!(compare_versions("1.2", "1.2.1"), Ordering::Less);
        assert_eq!(compare_versions("v007", "v7"), Ordering::Equal);
        assert_eq!(compare_versions("1.0.0-beta", "1.0.0-alpha"), Ordering::Greater);
    }

    #[test]
    fn first_check_is_due() {
        let store = MemoryStore::new();
        assert!(UpdateCheck::new(&store).is_due(at(1_700_000_000)));
    }

    #[test]
    fn recheck_waits_one_day() {
        let store = MemoryStore::new();
        let check = UpdateCheck::new(&store);
        check.record_release("v0.4.0", at(1_000)).unwrap();

        assert!(!check.is_due(at(1_000 + 86_400)));
        assert!(check.is_due(at(1_000 + 86_401)));
    }

    #[test]
    fn cached_release_drives_notice() {
        let store = MemoryStore::new();
        let check = UpdateCheck::new(&store);
        let record = check.record_release("v0.10.0", at(5)).unwrap();

        assert_eq!(record.newest_version.as_deref(), Some("0.10.0"));
        assert_eq!(check.available_update("0.9.3").as_deref(), Some("0.10.0"));
        assert_eq!(check.available_update("0.10.0"), None);
    }

    #[test]
    fn malformed_record_reads_as_never_checked() {
        let store = MemoryStore::new();
        store.set(DEFAULT_UPDATE_CHECK_KEY, "{not toml").unwrap();
        let check = UpdateCheck::new(&store);

        assert_eq!(check.record(), UpdateRecord::default());
        assert!(check.is_due(at(0) + Duration::days(2)));
    }

    #[test]
    fn custom_key_and_interval() {
        let store = MemoryStore::new();
        let check = UpdateCheck::new(&store)
            .with_key("release")
            .with_interval(Duration::hours(1));
        check.record_release("2.0", at(0)).unwrap();

        assert!(store.get("release").unwrap().is_some());
        assert!(check.is_due(at(3_601)));
    }
}
