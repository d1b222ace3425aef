//! Repository contracts consumed by the settings service.
//!
//! [`SettingsRepository`] serves definitions, [`SettingValueRepository`]
//! serves values. Both own lazily built lookup state, so every method takes
//! `&mut self`.

use async_trait::async_trait;

use crate::error::SettingsError;
use crate::setting::{Setting, SettingCategory, SettingId, SettingValue};

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page, in listing order
    pub items: Vec<T>,
    /// Number of items skipped
    pub skip: usize,
    /// Maximum number of items requested
    pub take: usize,
    /// Size of the full matching set, independent of `skip`/`take`
    pub total: usize,
}

impl<T> Page<T> {
    /// Converts the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            skip: self.skip,
            take: self.take,
            total: self.total,
        }
    }
}

/// Store of setting definitions.
#[async_trait]
pub trait SettingsRepository: Send {
    /// Persists a new definition.
    async fn create(&mut self, setting: Setting) -> Result<Setting, SettingsError>;

    /// Replaces an existing definition.
    async fn update(&mut self, setting: Setting) -> Result<Setting, SettingsError>;

    /// Looks up a definition by id.
    async fn get(&mut self, id: SettingId) -> Result<Setting, SettingsError>;

    /// Removes a definition.
    async fn delete(&mut self, id: SettingId) -> Result<(), SettingsError>;

    /// Returns the definitions named exactly `name` (at most one).
    async fn get_by_name(&mut self, name: &str) -> Result<Vec<Setting>, SettingsError>;

    /// Lists definitions, optionally restricted to one category.
    async fn get_page(
        &mut self,
        category: Option<&SettingCategory>,
        skip: usize,
        take: usize,
    ) -> Result<Page<Setting>, SettingsError>;
}

/// Store of setting values.
#[async_trait]
pub trait SettingValueRepository: Send {
    /// Writes a value for a setting that has none yet.
    async fn create(&mut self, value: SettingValue) -> Result<SettingValue, SettingsError>;

    /// Overwrites the value of a setting that already has one.
    async fn update(&mut self, value: SettingValue) -> Result<SettingValue, SettingsError>;

    /// Returns the effective stored value of a setting.
    async fn get(&mut self, setting_id: SettingId) -> Result<SettingValue, SettingsError>;

    /// Removes the stored value of a setting. Unknown ids succeed.
    async fn delete(&mut self, setting_id: SettingId) -> Result<(), SettingsError>;

    /// Returns the stored values for `ids`, skipping ids without one.
    async fn get_setting_values_by_ids(
        &mut self,
        ids: &[SettingId],
    ) -> Result<Vec<SettingValue>, SettingsError>;

    /// Writes a batch of values, creating or overwriting as needed.
    async fn update_setting_values(
        &mut self,
        values: Vec<SettingValue>,
    ) -> Result<Vec<SettingValue>, SettingsError>;
}
