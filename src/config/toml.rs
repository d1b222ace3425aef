//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use crate::setting::{SettingId, SettingKind};

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Number of settings listed per page
    pub page_size: Option<usize>,

    /// Setting definitions
    #[serde(default)]
    pub settings: Vec<SettingEntry>,

    /// Value stores
    #[serde(default)]
    pub stores: Vec<StoreEntry>,
}

/// One `[[settings]]` entry.
///
/// `default`, `min`, `max` and `allowed` are interpreted according to
/// `kind`; date-times are written as TOML offset date-times or RFC 3339
/// strings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingEntry {
    /// Unique setting id
    pub id: SettingId,

    /// Unique setting name
    pub name: String,

    /// Value kind
    pub kind: SettingKind,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Category used for grouping and filtering
    pub category: Option<String>,

    /// Default value (omit for `false`, `0`, `0.0` or null)
    pub default: Option<toml::Value>,

    /// Inclusive lower bound (integer, float, date-time)
    pub min: Option<toml::Value>,

    /// Inclusive upper bound (integer, float, date-time)
    pub max: Option<toml::Value>,

    /// Exhaustive list of accepted values
    #[serde(default)]
    pub allowed: Vec<toml::Value>,

    /// Accept null strings
    #[serde(default)]
    pub allow_null: bool,

    /// Accept empty and whitespace-only strings
    #[serde(default)]
    pub allow_empty: bool,

    /// Minimum string length in characters
    pub min_length: Option<i32>,

    /// Maximum string length in characters
    pub max_length: Option<i32>,

    /// Whether a value must be provided
    #[serde(default)]
    pub required: bool,

    /// Whether the value may be edited
    #[serde(default)]
    pub read_only: bool,
}

/// One `[[stores]]` entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreEntry {
    /// Path of the JSON value file; `~` expands to the home directory
    pub path: String,

    /// Precedence; lower overrides higher (default: 0)
    pub rank: Option<i32>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# layered-settings configuration file

# Number of settings listed per page (default: 20)
# page_size = 20

# Value stores. When several stores hold a value for the same setting,
# the store with the LOWEST rank wins.
# Note: --store CLI arguments REPLACE these entirely (not merged)
[[stores]]
path = "~/.config/layered-settings/values.json"
rank = 0

# [[stores]]
# path = "/etc/layered-settings/values.json"
# rank = 10

# Setting definitions.
# kind: "boolean", "integer", "float", "date_time" or "string"

[[settings]]
id = 1
name = "theme"
kind = "string"
category = "Display"
description = "Color theme"
default = "dark"
allowed = ["dark", "light"]

[[settings]]
id = 2
name = "font_size"
kind = "integer"
category = "Display"
default = 12
min = 6
max = 72

[[settings]]
id = 3
name = "telemetry"
kind = "boolean"
default = false

# [[settings]]
# id = 4
# name = "nickname"
# kind = "string"
# allow_null = true
# max_length = 32

# [[settings]]
# id = 5
# name = "trial_ends"
# kind = "date_time"
# default = 2030-01-01T00:00:00Z
"#
    .to_string()
}
