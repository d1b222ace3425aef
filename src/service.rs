//! Settings domain service.
//!
//! Composes a definition repository and a value repository into the
//! operations callers actually need: validated definition writes, the
//! effective value of one setting, and paged setting/value pairs.

use std::collections::HashMap;

use crate::catalog::SettingsCatalog;
use crate::error::SettingsError;
use crate::repository::{Page, SettingValueRepository, SettingsRepository};
use crate::resolver::SettingValueResolver;
use crate::setting::{
    Setting, SettingCategory, SettingId, SettingType, SettingValue, SettingValuePair, Value,
};

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

/// A setting together with the typed value currently in effect for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSetting<T> {
    /// The setting definition
    pub setting: Setting,
    /// Stored override, or the setting's default when none is stored
    pub value: T,
}

/// Domain service over a definition repository `R` and a value repository `V`.
#[derive(Debug)]
pub struct SettingsService<R = SettingsCatalog, V = SettingValueResolver> {
    settings: R,
    values: V,
}

impl<R, V> SettingsService<R, V>
where
    R: SettingsRepository,
    V: SettingValueRepository,
{
    /// Creates a service over the given repositories.
    pub const fn new(settings: R, values: V) -> Self {
        Self { settings, values }
    }

    /// Returns the definition repository.
    pub const fn settings(&self) -> &R {
        &self.settings
    }

    /// Returns the value repository.
    pub const fn values(&self) -> &V {
        &self.values
    }

    /// Validates and stores a new setting definition.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::InvalidParameters`] if the rules are inconsistent
    /// - [`SettingsError::BadRequest`] if the name is blank
    /// - [`SettingsError::Conflict`] if another setting has the same name
    /// - any error of the definition repository
    pub async fn create(&mut self, setting: Setting) -> Result<Setting, SettingsError> {
        self.validate(&setting, None).await?;
        self.settings.create(setting).await
    }

    /// Validates and replaces an existing setting definition.
    ///
    /// The setting must exist and keep its declared kind. Its name may only
    /// collide with itself.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create), plus [`SettingsError::NotFound`] for an
    /// unknown id and [`SettingsError::BadRequest`] for a kind change.
    pub async fn update(&mut self, setting: Setting) -> Result<Setting, SettingsError> {
        let existing = self.settings.get(setting.id).await?;
        if existing.kind() != setting.kind() {
            return Err(SettingsError::BadRequest(format!(
                "Setting {} is of kind {} and cannot be changed to {}.",
                setting.id,
                existing.kind(),
                setting.kind()
            )));
        }

        self.validate(&setting, Some(setting.id)).await?;
        self.settings.update(setting).await
    }

    /// Returns the setting definition for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NotFound`] for an unknown id, or any error
    /// of the definition repository.
    pub async fn get_setting(&mut self, id: SettingId) -> Result<Setting, SettingsError> {
        self.settings.get(id).await
    }

    /// Resolves the value in effect for setting `id` as a `T`.
    ///
    /// A stored value wins; without one the setting's default applies.
    /// Settings that allow null are read as `Option<String>`; reading a null
    /// as `String` fails.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::NotFound`] if the setting does not exist
    /// - [`SettingsError::TypeMismatch`] if the setting is not of kind `T`
    /// - [`SettingsError::BadRequest`] if the stored or default value cannot
    ///   be read as `T`
    /// - any provider error other than a missing value
    pub async fn get_effective_setting<T: SettingType>(
        &mut self,
        id: SettingId,
    ) -> Result<EffectiveSetting<T>, SettingsError> {
        let setting = self.settings.get(id).await?;
        if setting.kind() != T::KIND {
            return Err(SettingsError::TypeMismatch {
                setting_id: id,
                expected: T::KIND,
                actual: setting.kind(),
            });
        }

        let value = match self.values.get(id).await {
            Ok(stored) => stored.value,
            Err(e) if e.is_not_found() => {
                tracing::debug!("No stored value for setting {id}, using default");
                setting.default_value()
            }
            Err(e) => return Err(e),
        };

        let Some(value) = T::from_value(&value) else {
            if value == Value::String(None) {
                return Err(SettingsError::BadRequest(format!(
                    "Setting {id} is null; read it as Option<String>."
                )));
            }
            return Err(SettingsError::BadRequest(format!(
                "The value of setting {id} ({value}) cannot be read as {}.",
                T::KIND
            )));
        };

        Ok(EffectiveSetting { setting, value })
    }

    /// Resolves the value in effect for setting `id` without a static type.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::NotFound`] if the setting does not exist
    /// - [`SettingsError::Internal`] if the stored value disagrees with the
    ///   setting's kind
    /// - any provider error other than a missing value
    pub async fn get_effective_value_pair(
        &mut self,
        id: SettingId,
    ) -> Result<SettingValuePair, SettingsError> {
        let setting = self.settings.get(id).await?;
        match self.values.get(id).await {
            Ok(stored) => stored.to_setting_value_pair(&setting),
            Err(e) if e.is_not_found() => Ok(setting.default_setting_value_pair()),
            Err(e) => Err(e),
        }
    }

    /// Lists settings paired with their effective values.
    ///
    /// Settings without a stored value are paired with their default.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Internal`] if a stored value's kind
    /// disagrees with its setting, or any repository error.
    pub async fn get_setting_value_pairs(
        &mut self,
        category: Option<&SettingCategory>,
        skip: usize,
        take: usize,
    ) -> Result<Page<SettingValuePair>, SettingsError> {
        let page = self.settings.get_page(category, skip, take).await?;
        let ids: Vec<SettingId> = page.items.iter().map(|s| s.id).collect();
        let stored: HashMap<SettingId, SettingValue> = self
            .values
            .get_setting_values_by_ids(&ids)
            .await?
            .into_iter()
            .map(|v| (v.setting_id, v))
            .collect();

        let mut pairs = Vec::with_capacity(page.items.len());
        for setting in &page.items {
            let pair = match stored.get(&setting.id) {
                Some(value) => value.to_setting_value_pair(setting)?,
                None => setting.default_setting_value_pair(),
            };
            pairs.push(pair);
        }

        Ok(Page {
            items: pairs,
            skip: page.skip,
            take: page.take,
            total: page.total,
        })
    }

    /// Validates `value` against its setting and stores it in the value
    /// repository's create target.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::NotFound`] if the setting does not exist
    /// - [`SettingsError::Validation`] if the value breaks the setting's rules
    /// - any error of the value repository
    pub async fn create_setting_value(
        &mut self,
        value: SettingValue,
    ) -> Result<SettingValue, SettingsError> {
        let setting = self.settings.get(value.setting_id).await?;
        let result = setting.validate_value(&value.value);
        if !result.is_valid() {
            return Err(SettingsError::Validation {
                message: format!("Invalid value for setting '{}'", setting.name),
                reasons: result.errors().to_vec(),
            });
        }

        self.values.create(value).await
    }

    /// Writes a batch of values through the value repository.
    ///
    /// # Errors
    ///
    /// Returns the first failing provider group's error.
    pub async fn update_setting_values(
        &mut self,
        values: Vec<SettingValue>,
    ) -> Result<Vec<SettingValue>, SettingsError> {
        self.values.update_setting_values(values).await
    }

    /// Removes the stored value of setting `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns the owning provider's error.
    pub async fn delete_setting_value(&mut self, id: SettingId) -> Result<(), SettingsError> {
        self.values.delete(id).await
    }

    async fn validate(
        &mut self,
        setting: &Setting,
        own_id: Option<SettingId>,
    ) -> Result<(), SettingsError> {
        let parameters = setting.validate_internal_parameters();
        if !parameters.is_valid() {
            return Err(SettingsError::InvalidParameters {
                reasons: parameters.errors().to_vec(),
            });
        }

        if setting.name.trim().is_empty() {
            return Err(SettingsError::BadRequest(
                "The setting name must not be blank.".to_string(),
            ));
        }

        let duplicates = self.settings.get_by_name(&setting.name).await?;
        if duplicates.iter().any(|other| Some(other.id) != own_id) {
            return Err(SettingsError::Conflict(format!(
                "A setting named '{}' already exists.",
                setting.name
            )));
        }

        Ok(())
    }
}
