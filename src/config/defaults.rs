// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for configuration constants.

// ==========================================================================
// Locale Persistence Defaults
// ==========================================================================

/// Preference store key holding the chosen locale tag.
pub const DEFAULT_STORAGE_KEY: &str = "dashboard-locale";

/// Attribute on the document element mirroring the active locale.
pub const DEFAULT_LOCALE_ATTRIBUTE: &str = "data-locale";

// ==========================================================================
// Mutation Watching Defaults
// ==========================================================================

/// Whether newly inserted elements are translated automatically.
pub const DEFAULT_OBSERVE_MUTATIONS: bool = true;

// ==========================================================================
// Update Check Defaults
// ==========================================================================

/// Preference store key caching the last update check.
pub const DEFAULT_UPDATE_CHECK_KEY: &str = "update-check";

/// Minimum time between two update lookups (one day).
pub const UPDATE_CHECK_INTERVAL_SECS: i64 = 86_400;
