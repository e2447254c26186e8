// SPDX-License-Identifier: MPL-2.0
//! `dashboard_i18n` localizes the DietPi dashboard page in place.
//!
//! Markup declares what to translate through `data-i18n*` attributes; a
//! [`i18n::Localizer`] resolves the active locale, fills every bound element
//! from Fluent catalogs and keeps translating elements inserted later,
//! batched once per frame.

#![doc(html_root_url = "https://docs.rs/dashboard-i18n/0.3.0")]

pub mod config;
pub mod dom;
pub mod error;
pub mod i18n;
pub mod paths;
pub mod scheduler;
pub mod shell;
pub mod storage;
pub mod update;
