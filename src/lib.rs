//! layered-settings: typed runtime settings resolved across ranked sources
//!
//! A library for defining typed settings with validation rules, merging
//! their values from several ranked stores, and editing them through a
//! staged, batch-applied workflow.

pub mod catalog;
pub mod config;
pub mod error;
pub mod manager;
pub mod provider;
pub mod repository;
pub mod resolver;
pub mod service;
pub mod setting;

pub use catalog::SettingsCatalog;
pub use error::SettingsError;
pub use manager::{ManagedSetting, SettingsManager, StagingState};
pub use resolver::SettingValueResolver;
pub use service::{EffectiveSetting, SettingsService};
