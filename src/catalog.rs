//! Catalog of setting definitions.
//!
//! Definitions come from read-only [`SettingsProvider`]s and are indexed by
//! id, name and category on first access. Every (re)initialization rebuilds
//! all indexes from scratch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SettingsError;
use crate::provider::SettingsProvider;
use crate::repository::{Page, SettingsRepository};
use crate::setting::{Setting, SettingCategory, SettingId};

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;

/// Bucket for settings without a category.
pub const DEFAULT_CATEGORY_KEY: &str = "_default";

/// Read-only [`SettingsRepository`] over a set of definition providers.
///
/// Mutations are not supported and fail with
/// [`SettingsError::NotImplemented`].
pub struct SettingsCatalog {
    providers: Vec<Arc<dyn SettingsProvider>>,
    initialized: bool,
    /// Definitions in insertion order
    settings: Vec<Setting>,
    by_id: HashMap<SettingId, usize>,
    by_name: HashMap<String, usize>,
    by_category: HashMap<String, Vec<usize>>,
}

impl std::fmt::Debug for SettingsCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsCatalog")
            .field("providers", &self.providers.len())
            .field("initialized", &self.initialized)
            .field("settings", &self.settings.len())
            .finish_non_exhaustive()
    }
}

impl SettingsCatalog {
    /// Creates a catalog over `providers`. Nothing is read until first use.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn SettingsProvider>>) -> Self {
        Self {
            providers,
            initialized: false,
            settings: Vec::new(),
            by_id: HashMap::new(),
            by_name: HashMap::new(),
            by_category: HashMap::new(),
        }
    }

    /// Returns `true` once the indexes have been built successfully.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Discards all indexes and rebuilds them from every provider.
    ///
    /// A later provider's definition replaces an earlier one with the same
    /// id, keeping the original position.
    ///
    /// # Errors
    ///
    /// Returns the first provider error; the catalog is then left
    /// uninitialized and the next access retries.
    pub async fn initialize(&mut self) -> Result<(), SettingsError> {
        self.initialized = false;
        self.settings.clear();
        self.by_id.clear();
        self.by_name.clear();
        self.by_category.clear();

        for provider in &self.providers {
            let settings = provider.get_settings().await.inspect_err(|e| {
                tracing::warn!("Failed to load setting definitions: {e}");
            })?;

            for setting in settings {
                match self.by_id.get(&setting.id) {
                    Some(&index) => self.settings[index] = setting,
                    None => {
                        self.by_id.insert(setting.id, self.settings.len());
                        self.settings.push(setting);
                    }
                }
            }
        }

        for (index, setting) in self.settings.iter().enumerate() {
            self.by_name.entry(setting.name.clone()).or_insert(index);
            let key = setting
                .category
                .as_ref()
                .map_or(DEFAULT_CATEGORY_KEY, SettingCategory::name);
            self.by_category
                .entry(key.to_string())
                .or_default()
                .push(index);
        }

        self.initialized = true;
        tracing::debug!(
            "Setting catalog built: {} definition(s) in {} categories",
            self.settings.len(),
            self.by_category.len()
        );
        Ok(())
    }

    async fn ensure_initialized(&mut self) -> Result<(), SettingsError> {
        if self.initialized {
            return Ok(());
        }
        self.initialize().await
    }

    fn not_implemented(operation: &'static str) -> SettingsError {
        SettingsError::NotImplemented {
            operation,
            component: "SettingsCatalog",
        }
    }
}

#[async_trait]
impl SettingsRepository for SettingsCatalog {
    async fn create(&mut self, _setting: Setting) -> Result<Setting, SettingsError> {
        Err(Self::not_implemented("create"))
    }

    async fn update(&mut self, _setting: Setting) -> Result<Setting, SettingsError> {
        Err(Self::not_implemented("update"))
    }

    async fn get(&mut self, id: SettingId) -> Result<Setting, SettingsError> {
        self.ensure_initialized().await?;

        self.by_id
            .get(&id)
            .map(|&index| self.settings[index].clone())
            .ok_or_else(|| SettingsError::setting_not_found(id))
    }

    async fn delete(&mut self, _id: SettingId) -> Result<(), SettingsError> {
        Err(Self::not_implemented("delete"))
    }

    async fn get_by_name(&mut self, name: &str) -> Result<Vec<Setting>, SettingsError> {
        self.ensure_initialized().await?;

        Ok(self
            .by_name
            .get(name)
            .map(|&index| self.settings[index].clone())
            .into_iter()
            .collect())
    }

    async fn get_page(
        &mut self,
        category: Option<&SettingCategory>,
        skip: usize,
        take: usize,
    ) -> Result<Page<Setting>, SettingsError> {
        self.ensure_initialized().await?;

        let matching: Vec<usize> = match category {
            None => (0..self.settings.len()).collect(),
            Some(category) => self
                .by_category
                .get(category.name())
                .cloned()
                .unwrap_or_default(),
        };

        Ok(Page {
            items: matching
                .iter()
                .skip(skip)
                .take(take)
                .map(|&index| self.settings[index].clone())
                .collect(),
            skip,
            take,
            total: matching.len(),
        })
    }
}
