//! Configuration layer for layered-settings.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Sources
//!
//! Setting definitions are read only from the `[[settings]]` entries of the
//! TOML file. Each entry is checked for self-consistent rules and a default
//! that satisfies them before the application starts.
//!
//! Value stores are resolved with the following priority (highest to lowest):
//!
//! 1. **`--store` CLI arguments** - replace the TOML list entirely (not merged)
//! 2. **`[[stores]]` TOML entries**
//! 3. **Built-in default** - `values.json` in the platform config directory
//!
//! # Ranks
//!
//! A store written without a rank gets rank 0. When several stores hold a
//! value for the same setting, the one with the lowest rank wins.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod toml_tests;

pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{SettingEntry, StoreEntry, TomlConfig, default_config_template};
pub use validated::{StoreConfig, ValidatedConfig, write_default_config};
