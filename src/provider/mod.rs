//! Sources of setting definitions and setting values.
//!
//! This module provides:
//! - The value source contract ([`SettingValueProvider`])
//! - The definition source contract ([`SettingsProvider`])
//! - A fixed in-memory definition source ([`StaticSettingsProvider`])
//! - A JSON file value store ([`FileValueStore`])
//!
//! Providers are held as trait objects so that sources of different types
//! (local file, remote service) can be ranked against each other.

mod file;


pub use file::FileValueStore;

use async_trait::async_trait;

use crate::error::SettingsError;
use crate::setting::{Setting, SettingId, SettingValue};

/// A ranked source and sink of setting values.
///
/// When several providers hold a value for the same setting, the one with
/// the lower [`rank`](Self::rank) wins.
///
/// Implementations must tolerate repeated full-snapshot reads. Dropping a
/// returned future cancels the call.
#[async_trait]
pub trait SettingValueProvider: Send + Sync {
    /// Precedence of this provider; lower overrides higher.
    fn rank(&self) -> i32;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns every value this provider currently holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing source cannot be read.
    async fn get_setting_values(&self) -> Result<Vec<SettingValue>, SettingsError>;

    /// Inserts or replaces the given values, returning what was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; nothing is written in that case.
    async fn upsert_values(
        &self,
        values: Vec<SettingValue>,
    ) -> Result<Vec<SettingValue>, SettingsError>;

    /// Removes the value for `setting_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing source cannot be updated.
    async fn delete(&self, setting_id: SettingId) -> Result<(), SettingsError>;
}

/// A read-only source of setting definitions.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    /// Returns every definition this source holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    async fn get_settings(&self) -> Result<Vec<Setting>, SettingsError>;
}

/// Definition source backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticSettingsProvider {
    settings: Vec<Setting>,
}

impl StaticSettingsProvider {
    /// Creates a provider serving `settings` in the given order.
    #[must_use]
    pub fn new(settings: impl IntoIterator<Item = Setting>) -> Self {
        Self {
            settings: settings.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SettingsProvider for StaticSettingsProvider {
    async fn get_settings(&self) -> Result<Vec<Setting>, SettingsError> {
        Ok(self.settings.clone())
    }
}
