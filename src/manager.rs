//! Staged editing of setting values.
//!
//! A [`SettingsManager`] hands out [`ManagedSetting`] handles for a page of
//! settings. Edits are validated and staged one by one, then written as a
//! single batch by [`SettingsManager::apply_settings`]. A failed apply keeps
//! every staged edit so the caller can retry.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::catalog::SettingsCatalog;
use crate::error::SettingsError;
use crate::repository::{Page, SettingValueRepository, SettingsRepository};
use crate::resolver::SettingValueResolver;
use crate::service::{EffectiveSetting, SettingsService};
use crate::setting::{
    Setting, SettingCategory, SettingId, SettingType, SettingValue, SettingValuePair, Value,
};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

#[derive(Debug)]
struct ManagedState {
    pair: SettingValuePair,
    has_edit: bool,
    // Pair as it was before the first staged edit
    original: Option<SettingValuePair>,
}

/// Editable view of one setting and its value.
///
/// Cloning yields another handle to the same state, so the copy kept in the
/// staging map and the one held by the caller always agree.
#[derive(Debug, Clone)]
pub struct ManagedSetting {
    state: Arc<Mutex<ManagedState>>,
}

impl ManagedSetting {
    /// Wraps `pair` with no pending edit.
    #[must_use]
    pub fn new(pair: SettingValuePair) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManagedState {
                pair,
                has_edit: false,
                original: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ManagedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Id of the managed setting.
    #[must_use]
    pub fn setting_id(&self) -> SettingId {
        self.lock().pair.setting().id
    }

    /// Definition of the managed setting.
    #[must_use]
    pub fn setting(&self) -> Setting {
        self.lock().pair.setting().clone()
    }

    /// Current value, including a staged edit.
    #[must_use]
    pub fn value(&self) -> Value {
        self.lock().pair.value().clone()
    }

    /// Current value as `T`, or `None` if the kinds differ.
    #[must_use]
    pub fn value_as<T: SettingType>(&self) -> Option<T> {
        self.lock().pair.value_as()
    }

    /// Snapshot of the setting and its current value.
    #[must_use]
    pub fn pair(&self) -> SettingValuePair {
        self.lock().pair.clone()
    }

    /// Returns `true` while an edit is staged.
    #[must_use]
    pub fn has_edit(&self) -> bool {
        self.lock().has_edit
    }

    /// Returns `true` if both handles share state.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn setting_value(&self) -> SettingValue {
        self.lock().pair.setting_value()
    }

    fn stage(&self, value: Value) -> Result<(), SettingsError> {
        let mut state = self.lock();
        let before = state.pair.clone();
        state.pair.set_value(value)?;
        state.original.get_or_insert(before);
        state.has_edit = true;
        Ok(())
    }

    /// Keeps the staged value as the current one.
    fn commit(&self) {
        let mut state = self.lock();
        state.original = None;
        state.has_edit = false;
    }

    /// Restores the value from before the first staged edit.
    fn revert(&self) {
        let mut state = self.lock();
        if let Some(original) = state.original.take() {
            state.pair = original;
        }
        state.has_edit = false;
    }
}

/// Whether any edit is waiting to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingState {
    /// Nothing staged
    Idle,
    /// At least one edit staged
    Staged,
}

/// Session-scoped staging workflow over a [`SettingsService`].
#[derive(Debug)]
pub struct SettingsManager<R = SettingsCatalog, V = SettingValueResolver> {
    service: SettingsService<R, V>,
    staged: BTreeMap<SettingId, ManagedSetting>,
}

impl<R, V> SettingsManager<R, V>
where
    R: SettingsRepository,
    V: SettingValueRepository,
{
    /// Creates a manager with nothing staged.
    pub const fn new(service: SettingsService<R, V>) -> Self {
        Self {
            service,
            staged: BTreeMap::new(),
        }
    }

    /// Returns the underlying service.
    pub const fn service(&self) -> &SettingsService<R, V> {
        &self.service
    }

    /// Returns the underlying service for direct operations.
    pub const fn service_mut(&mut self) -> &mut SettingsService<R, V> {
        &mut self.service
    }

    /// Returns whether edits are waiting to be applied.
    pub fn state(&self) -> StagingState {
        if self.staged.is_empty() {
            StagingState::Idle
        } else {
            StagingState::Staged
        }
    }

    /// Number of staged edits.
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Resolves the value in effect for setting `id`.
    ///
    /// Staged edits are not visible here until applied.
    ///
    /// # Errors
    ///
    /// See [`SettingsService::get_effective_setting`].
    pub async fn get_effective_setting<T: SettingType>(
        &mut self,
        id: SettingId,
    ) -> Result<EffectiveSetting<T>, SettingsError> {
        self.service.get_effective_setting(id).await
    }

    /// Fetches a page of settings for editing.
    ///
    /// Settings with a staged edit are returned as the staged handle.
    ///
    /// # Errors
    ///
    /// See [`SettingsService::get_setting_value_pairs`].
    pub async fn get_settings_by_page(
        &mut self,
        category: Option<&SettingCategory>,
        skip: usize,
        take: usize,
    ) -> Result<Page<ManagedSetting>, SettingsError> {
        let page = self
            .service
            .get_setting_value_pairs(category, skip, take)
            .await?;

        Ok(page.map(|pair| match self.staged.get(&pair.setting().id) {
            Some(staged) => staged.clone(),
            None => ManagedSetting::new(pair),
        }))
    }

    /// Validates `value` and stages it on `managed`.
    ///
    /// Staging the same setting again replaces the earlier edit.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Validation`] with the rule violations; the
    /// managed setting and the staging map are then unchanged.
    pub fn stage_setting_update(
        &mut self,
        managed: &ManagedSetting,
        value: impl Into<Value>,
    ) -> Result<(), SettingsError> {
        let value = value.into();
        let setting = managed.setting();

        let result = setting.validate_value(&value);
        if !result.is_valid() {
            return Err(SettingsError::Validation {
                message: format!("Invalid value for setting '{}'", setting.name),
                reasons: result.errors().to_vec(),
            });
        }

        managed.stage(value)?;
        if let Some(previous) = self.staged.insert(setting.id, managed.clone()) {
            if !previous.same_as(managed) {
                previous.revert();
            }
        }
        tracing::debug!(
            "Staged update for setting {} ({} pending)",
            setting.id,
            self.staged.len()
        );
        Ok(())
    }

    /// Writes every staged edit as one batch.
    ///
    /// Does nothing when nothing is staged. On success the staging map is
    /// emptied and every edit flag cleared; on failure both stay as they
    /// were.
    ///
    /// # Errors
    ///
    /// Returns the batch write error.
    pub async fn apply_settings(&mut self) -> Result<(), SettingsError> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let values: Vec<SettingValue> = self
            .staged
            .values()
            .map(ManagedSetting::setting_value)
            .collect();
        self.service
            .update_setting_values(values)
            .await
            .inspect_err(|e| {
                tracing::warn!("Applying {} staged update(s) failed: {e}", self.staged.len());
            })?;

        for managed in self.staged.values() {
            managed.commit();
        }
        self.staged.clear();
        Ok(())
    }

    /// Drops every staged edit and clears the edit flags.
    ///
    /// Each managed setting goes back to the value it had before staging.
    pub fn reset_staged_updates(&mut self) {
        for managed in self.staged.values() {
            managed.revert();
        }
        self.staged.clear();
    }
}
