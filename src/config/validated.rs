//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::setting::{
    BooleanRules, BoundedRules, Setting, SettingCategory, SettingKind, SettingRules, StringRules,
};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::{SettingEntry, StoreEntry, TomlConfig};

/// A value store to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path of the JSON value file, with `~` expanded
    pub path: PathBuf,
    /// Precedence; lower overrides higher
    pub rank: i32,
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (rank {})", self.path.display(), self.rank)
    }
}

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Setting definitions, in file order
    pub settings: Vec<Setting>,

    /// Value stores, in declaration order
    pub stores: Vec<StoreConfig>,

    /// Number of settings listed per page
    pub page_size: usize,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stores: Vec<String> = self.stores.iter().map(ToString::to_string).collect();
        write!(
            f,
            "Config {{ settings: {}, stores: [{}], page_size: {} }}",
            self.settings.len(),
            stores.join(", "),
            self.page_size,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// Setting definitions come only from TOML. `--store` arguments replace
    /// the TOML store list entirely; with neither, a single store in the
    /// platform config directory is used.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A setting entry is malformed, duplicated or self-inconsistent
    /// - A store entry is malformed
    /// - No store is configured and the platform has no config directory
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let settings = toml.map_or_else(|| Ok(Vec::new()), |t| build_settings(&t.settings))?;
        let stores = Self::resolve_stores(cli, toml)?;
        let page_size = toml
            .and_then(|t| t.page_size)
            .filter(|&size| size > 0)
            .unwrap_or(defaults::PAGE_SIZE);

        Ok(Self {
            settings,
            stores,
            page_size,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_stores(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Vec<StoreConfig>, ConfigError> {
        // CLI replaces TOML entirely
        if !cli.stores.is_empty() {
            return cli.stores.iter().map(|s| parse_store_arg(s)).collect();
        }

        if let Some(toml) = toml {
            if !toml.stores.is_empty() {
                return toml.stores.iter().map(store_from_entry).collect();
            }
        }

        defaults::value_file()
            .map(|path| {
                vec![StoreConfig {
                    path,
                    rank: defaults::STORE_RANK,
                }]
            })
            .ok_or_else(|| {
                ConfigError::missing(
                    field::STORES,
                    "Use --store or add a [[stores]] entry to the config file",
                )
            })
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

/// Parses `PATH` or `PATH:RANK`.
///
/// A suffix that is not an integer stays part of the path (`C:\values.json`).
fn parse_store_arg(s: &str) -> Result<StoreConfig, ConfigError> {
    if s.trim().is_empty() {
        return Err(ConfigError::InvalidStore {
            value: s.to_string(),
            reason: "path must not be empty".to_string(),
        });
    }

    let (path, rank) = match s.rsplit_once(':') {
        Some((path, rank)) if !path.is_empty() => match rank.parse::<i32>() {
            Ok(rank) => (path, rank),
            Err(_) => (s, defaults::STORE_RANK),
        },
        _ => (s, defaults::STORE_RANK),
    };

    Ok(StoreConfig {
        path: expand_home(path),
        rank,
    })
}

fn store_from_entry(entry: &StoreEntry) -> Result<StoreConfig, ConfigError> {
    if entry.path.trim().is_empty() {
        return Err(ConfigError::InvalidStore {
            value: entry.path.clone(),
            reason: "path must not be empty".to_string(),
        });
    }

    Ok(StoreConfig {
        path: expand_home(&entry.path),
        rank: entry.rank.unwrap_or(defaults::STORE_RANK),
    })
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn build_settings(entries: &[SettingEntry]) -> Result<Vec<Setting>, ConfigError> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();

    entries
        .iter()
        .map(|entry| {
            if !ids.insert(entry.id) {
                return Err(ConfigError::setting(
                    &entry.name,
                    format!("duplicate id {}", entry.id),
                ));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::setting(&entry.name, "duplicate name"));
            }
            build_setting(entry)
        })
        .collect()
}

fn build_setting(entry: &SettingEntry) -> Result<Setting, ConfigError> {
    if entry.name.trim().is_empty() {
        return Err(ConfigError::setting(
            format!("#{}", entry.id),
            "name must not be blank",
        ));
    }

    let category = entry
        .category
        .as_ref()
        .map(|name| SettingCategory::new(name.clone()))
        .transpose()
        .map_err(|e| ConfigError::setting(&entry.name, e.to_string()))?;

    let setting = Setting {
        id: entry.id,
        name: entry.name.clone(),
        description: entry.description.clone(),
        category,
        is_required: entry.required,
        is_read_only: entry.read_only,
        rules: build_rules(entry)?,
    };

    let parameters = setting.validate_internal_parameters();
    if !parameters.is_valid() {
        return Err(ConfigError::setting(
            &entry.name,
            parameters.errors().join(", "),
        ));
    }

    let default = setting.validate_value(&setting.default_value());
    if !default.is_valid() {
        return Err(ConfigError::setting(
            &entry.name,
            format!("default value is invalid: {}", default.errors().join(", ")),
        ));
    }

    Ok(setting)
}

fn build_rules(entry: &SettingEntry) -> Result<SettingRules, ConfigError> {
    let rules = match entry.kind {
        SettingKind::Boolean => SettingRules::Boolean(BooleanRules::new(
            convert(entry, "default", entry.default.as_ref(), toml::Value::as_bool)?
                .unwrap_or(false),
        )),
        SettingKind::Integer => {
            SettingRules::Integer(bounded(entry, toml::Value::as_integer, Some(0))?)
        }
        SettingKind::Float => SettingRules::Float(bounded(entry, as_float, Some(0.0))?),
        SettingKind::DateTime => SettingRules::DateTime(bounded(entry, as_date_time, None)?),
        SettingKind::String => {
            let as_string = |v: &toml::Value| v.as_str().map(str::to_string);
            let allowed = entry
                .allowed
                .iter()
                .map(|v| as_string(v).ok_or_else(|| mistyped(entry, "allowed")))
                .collect::<Result<Vec<_>, _>>()?;

            SettingRules::String(StringRules {
                default_value: convert(entry, "default", entry.default.as_ref(), as_string)?,
                allow_null: entry.allow_null,
                allow_empty_strings: entry.allow_empty,
                min_characters: entry.min_length,
                max_characters: entry.max_length,
                allowed_values: allowed,
            })
        }
    };
    Ok(rules)
}

/// Builds bounded rules; `fallback` is the default when none is written.
fn bounded<T>(
    entry: &SettingEntry,
    parse: impl Fn(&toml::Value) -> Option<T> + Copy,
    fallback: Option<T>,
) -> Result<BoundedRules<T>, ConfigError> {
    let default = convert(entry, "default", entry.default.as_ref(), parse)?
        .or(fallback)
        .ok_or_else(|| {
            ConfigError::setting(&entry.name, format!("{} settings need a default", entry.kind))
        })?;

    Ok(BoundedRules {
        default_value: default,
        min_value: convert(entry, "min", entry.min.as_ref(), parse)?,
        max_value: convert(entry, "max", entry.max.as_ref(), parse)?,
        allowed_values: entry
            .allowed
            .iter()
            .map(|v| parse(v).ok_or_else(|| mistyped(entry, "allowed")))
            .collect::<Result<_, _>>()?,
    })
}

fn convert<T>(
    entry: &SettingEntry,
    key: &str,
    value: Option<&toml::Value>,
    parse: impl Fn(&toml::Value) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| parse(v).ok_or_else(|| mistyped(entry, key)))
        .transpose()
}

fn mistyped(entry: &SettingEntry, key: &str) -> ConfigError {
    ConfigError::setting(&entry.name, format!("`{key}` must be a {} value", entry.kind))
}

#[allow(clippy::cast_precision_loss)] // TOML integers written for float bounds
fn as_float(value: &toml::Value) -> Option<f64> {
    match value {
        toml::Value::Float(f) => Some(*f),
        toml::Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

fn as_date_time(value: &toml::Value) -> Option<DateTime<Utc>> {
    let text = match value {
        toml::Value::Datetime(d) => d.to_string(),
        toml::Value::String(s) => s.clone(),
        _ => return None,
    };
    DateTime::parse_from_rfc3339(&text)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
