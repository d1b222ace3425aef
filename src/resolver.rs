//! Rank-based resolution of setting values across providers.
//!
//! The resolver keeps one lookup from setting id to the provider that owns
//! it and the last value seen there. The lookup is derived state: it is
//! rebuilt in full on every (re)initialization and never diffed.
//!
//! # Precedence
//!
//! Providers are read from the highest rank number to the lowest, and each
//! snapshot overwrites the lookup entries it touches. The last writer is the
//! lowest-ranked provider holding the id, so a local override (rank 0)
//! shadows a global source (rank 10) without explicit tie-breaking.
//!
//! # Writes
//!
//! Point writes and deletes go to the recorded owner only. Batch writes are
//! grouped by owner and issued as one upsert per provider; ids nobody owns
//! yet are assigned to the default owner (see
//! [`SettingValueResolver::update_setting_values`]).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SettingsError;
use crate::provider::SettingValueProvider;
use crate::repository::SettingValueRepository;
use crate::setting::{SettingId, SettingValue};

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

/// Index of a provider in the configured sequence.
type ProviderIndex = usize;

/// Lookup entry: owning provider and its last-known value.
#[derive(Debug, Clone)]
struct Owned {
    provider: ProviderIndex,
    value: SettingValue,
}

/// [`SettingValueRepository`] merging values from ranked providers.
///
/// Session-scoped: the lazy lookup is plain state behind `&mut self`.
pub struct SettingValueResolver {
    providers: Vec<Arc<dyn SettingValueProvider>>,
    initialized: bool,
    lookup: HashMap<SettingId, Owned>,
}

impl std::fmt::Debug for SettingValueResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers: Vec<(&str, i32)> = self
            .providers
            .iter()
            .map(|p| (p.name(), p.rank()))
            .collect();
        f.debug_struct("SettingValueResolver")
            .field("providers", &providers)
            .field("initialized", &self.initialized)
            .field("values", &self.lookup.len())
            .finish()
    }
}

impl SettingValueResolver {
    /// Creates a resolver over `providers`.
    ///
    /// The first provider is the write target for brand-new values created
    /// through [`create`](SettingValueRepository::create). Nothing is read
    /// until first use.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn SettingValueProvider>>) -> Self {
        Self {
            providers,
            initialized: false,
            lookup: HashMap::new(),
        }
    }

    /// Returns `true` once a full initialization has succeeded.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Discards the lookup and rebuilds it from every provider's snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first provider error. The resolver is then left
    /// uninitialized and retries on next use.
    pub async fn initialize(&mut self) -> Result<(), SettingsError> {
        self.initialized = false;
        self.lookup.clear();

        let mut order: Vec<ProviderIndex> = (0..self.providers.len()).collect();
        // Highest rank first so lower ranks overwrite
        order.sort_by_key(|&index| std::cmp::Reverse(self.providers[index].rank()));

        for index in order {
            let provider = &self.providers[index];
            let values = match provider.get_setting_values().await {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!("Failed to read values from '{}': {e}", provider.name());
                    self.lookup.clear();
                    return Err(e);
                }
            };

            tracing::debug!(
                "Loaded {} value(s) from '{}' (rank {})",
                values.len(),
                provider.name(),
                provider.rank()
            );
            for value in values {
                self.lookup.insert(
                    value.setting_id,
                    Owned {
                        provider: index,
                        value,
                    },
                );
            }
        }

        self.initialized = true;
        Ok(())
    }

    /// Returns the name of the provider currently owning `setting_id`.
    ///
    /// Does not trigger initialization.
    #[must_use]
    pub fn owner_of(&self, setting_id: SettingId) -> Option<&str> {
        self.lookup
            .get(&setting_id)
            .map(|owned| self.providers[owned.provider].name())
    }

    /// Returns `true` if any provider holds a value.
    ///
    /// Does not trigger initialization.
    #[must_use]
    pub fn has_values(&self) -> bool {
        !self.lookup.is_empty()
    }

    async fn ensure_initialized(&mut self) -> Result<(), SettingsError> {
        if self.initialized {
            return Ok(());
        }
        self.initialize().await
    }

    /// Target for ids nobody owns yet: the first configured provider that
    /// owns at least one value.
    fn default_owner(&self) -> Option<ProviderIndex> {
        (0..self.providers.len())
            .find(|&index| self.lookup.values().any(|owned| owned.provider == index))
    }

    fn record(&mut self, provider: ProviderIndex, value: SettingValue) {
        self.lookup
            .insert(value.setting_id, Owned { provider, value });
    }
}

#[async_trait]
impl SettingValueRepository for SettingValueResolver {
    async fn create(&mut self, value: SettingValue) -> Result<SettingValue, SettingsError> {
        let Some(provider) = self.providers.first() else {
            return Err(SettingsError::Internal(
                "No setting value providers were available to create the setting".to_string(),
            ));
        };

        provider.upsert_values(vec![value.clone()]).await?;
        self.record(0, value.clone());
        Ok(value)
    }

    async fn update(&mut self, value: SettingValue) -> Result<SettingValue, SettingsError> {
        self.ensure_initialized().await?;

        let Some(owner) = self.lookup.get(&value.setting_id).map(|owned| owned.provider) else {
            return Err(SettingsError::value_not_found(value.setting_id));
        };

        self.providers[owner]
            .upsert_values(vec![value.clone()])
            .await?;
        self.record(owner, value.clone());
        Ok(value)
    }

    async fn get(&mut self, setting_id: SettingId) -> Result<SettingValue, SettingsError> {
        self.ensure_initialized().await?;

        self.lookup
            .get(&setting_id)
            .map(|owned| owned.value.clone())
            .ok_or_else(|| SettingsError::value_not_found(setting_id))
    }

    async fn delete(&mut self, setting_id: SettingId) -> Result<(), SettingsError> {
        self.ensure_initialized().await?;

        let Some(owner) = self.lookup.get(&setting_id).map(|owned| owned.provider) else {
            return Ok(());
        };

        self.providers[owner].delete(setting_id).await?;
        self.lookup.remove(&setting_id);
        Ok(())
    }

    async fn get_setting_values_by_ids(
        &mut self,
        ids: &[SettingId],
    ) -> Result<Vec<SettingValue>, SettingsError> {
        self.ensure_initialized().await?;

        Ok(ids
            .iter()
            .filter_map(|id| self.lookup.get(id))
            .map(|owned| owned.value.clone())
            .collect())
    }

    /// Routes each value to its owner, or to the default owner for new ids,
    /// then issues one upsert per distinct provider.
    ///
    /// Groups are written independently: the first failing group aborts the
    /// call, and groups written before it stay written.
    async fn update_setting_values(
        &mut self,
        values: Vec<SettingValue>,
    ) -> Result<Vec<SettingValue>, SettingsError> {
        self.ensure_initialized().await?;

        let default_owner = self.default_owner();
        let mut groups: BTreeMap<ProviderIndex, Vec<SettingValue>> = BTreeMap::new();
        for value in &values {
            let target = match self.lookup.get(&value.setting_id) {
                Some(owned) => owned.provider,
                None => default_owner.ok_or_else(|| {
                    SettingsError::Internal(
                        "No setting value providers were available to create the setting"
                            .to_string(),
                    )
                })?,
            };
            groups.entry(target).or_default().push(value.clone());
        }

        for (index, group) in groups {
            let provider = &self.providers[index];
            tracing::debug!(
                "Writing {} value(s) to '{}'",
                group.len(),
                provider.name()
            );
            provider
                .upsert_values(group.clone())
                .await
                .inspect_err(|e| {
                    tracing::warn!("Batch write to '{}' failed: {e}", provider.name());
                })?;

            for value in group {
                self.record(index, value);
            }
        }

        tracing::info!("Updated {} setting value(s)", values.len());
        Ok(values)
    }
}
