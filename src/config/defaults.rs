//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::path::PathBuf;

/// Rank of a value store declared without one (local override).
pub const STORE_RANK: i32 = 0;

/// Number of settings listed per page.
pub const PAGE_SIZE: usize = 20;

/// Directory name under the platform config directory.
pub const APP_DIR: &str = "layered-settings";

/// File name of the default value store.
pub const VALUE_FILE: &str = "values.json";

/// Path of the default value store, if the platform has a config directory.
#[must_use]
pub fn value_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(VALUE_FILE))
}
