//! Tests for the settings domain service.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;

use crate::catalog::SettingsCatalog;
use crate::error::SettingsError;
use crate::provider::mock::MockValueProvider;
use crate::provider::{SettingValueProvider, StaticSettingsProvider};
use crate::repository::{Page, SettingsRepository};
use crate::resolver::SettingValueResolver;
use crate::setting::{
    BooleanRules, BoundedRules, Setting, SettingCategory, SettingId, SettingValue, StringRules,
    Value,
};

use super::SettingsService;

/// Writable in-memory definition repository.
#[derive(Debug, Default)]
struct MemorySettings {
    settings: Vec<Setting>,
    writes: usize,
}

impl MemorySettings {
    fn with(settings: Vec<Setting>) -> Self {
        Self {
            settings,
            writes: 0,
        }
    }
}

#[async_trait]
impl SettingsRepository for MemorySettings {
    async fn create(&mut self, setting: Setting) -> Result<Setting, SettingsError> {
        self.writes += 1;
        self.settings.push(setting.clone());
        Ok(setting)
    }

    async fn update(&mut self, setting: Setting) -> Result<Setting, SettingsError> {
        self.writes += 1;
        for existing in &mut self.settings {
            if existing.id == setting.id {
                *existing = setting.clone();
            }
        }
        Ok(setting)
    }

    async fn get(&mut self, id: SettingId) -> Result<Setting, SettingsError> {
        self.settings
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| SettingsError::setting_not_found(id))
    }

    async fn delete(&mut self, id: SettingId) -> Result<(), SettingsError> {
        self.settings.retain(|s| s.id != id);
        Ok(())
    }

    async fn get_by_name(&mut self, name: &str) -> Result<Vec<Setting>, SettingsError> {
        Ok(self
            .settings
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect())
    }

    async fn get_page(
        &mut self,
        _category: Option<&SettingCategory>,
        skip: usize,
        take: usize,
    ) -> Result<Page<Setting>, SettingsError> {
        Ok(Page {
            items: self.settings.iter().skip(skip).take(take).cloned().collect(),
            skip,
            take,
            total: self.settings.len(),
        })
    }
}

fn greeting() -> Setting {
    Setting::new("greeting", StringRules::new("Hello")).with_id(117)
}

fn resolver(provider: &Arc<MockValueProvider>) -> SettingValueResolver {
    SettingValueResolver::new(vec![Arc::clone(provider) as Arc<dyn SettingValueProvider>])
}

fn catalog_service(
    settings: Vec<Setting>,
    provider: &Arc<MockValueProvider>,
) -> SettingsService {
    let catalog = SettingsCatalog::new(vec![Arc::new(StaticSettingsProvider::new(settings))]);
    SettingsService::new(catalog, resolver(provider))
}

fn memory_service(
    settings: Vec<Setting>,
) -> SettingsService<MemorySettings, SettingValueResolver> {
    let provider = Arc::new(MockValueProvider::empty("local", 0));
    SettingsService::new(MemorySettings::with(settings), resolver(&provider))
}

mod effective_setting {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_default_without_stored_value() {
        let provider = Arc::new(MockValueProvider::empty("local", 0));
        let mut service = catalog_service(vec![greeting()], &provider);

        let effective = service.get_effective_setting::<String>(117).await.unwrap();

        assert_eq!(effective.value, "Hello");
        assert_eq!(effective.setting.id, 117);
    }

    #[tokio::test]
    async fn stored_value_overrides_default() {
        let provider = Arc::new(MockValueProvider::new(
            "local",
            0,
            vec![SettingValue::new(117, "World")],
        ));
        let mut service = catalog_service(vec![greeting()], &provider);

        let effective = service.get_effective_setting::<String>(117).await.unwrap();

        assert_eq!(effective.value, "World");
    }

    #[tokio::test]
    async fn wrong_type_is_rejected_before_reading_values() {
        let provider = Arc::new(MockValueProvider::empty("local", 0));
        let mut service = catalog_service(vec![greeting()], &provider);

        let error = service.get_effective_setting::<i64>(117).await.unwrap_err();

        assert!(matches!(error, SettingsError::TypeMismatch { .. }));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(provider.snapshot_calls(), 0);
    }

    #[tokio::test]
    async fn stored_value_of_other_kind_is_bad_request() {
        let provider = Arc::new(MockValueProvider::new(
            "local",
            0,
            vec![SettingValue::new(117, 5_i64)],
        ));
        let mut service = catalog_service(vec![greeting()], &provider);

        let error = service.get_effective_setting::<String>(117).await.unwrap_err();

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn null_string_reads_as_option_only() {
        let nullable = Setting::new("motto", StringRules::new("x").allowing_null()).with_id(8);
        let provider = Arc::new(MockValueProvider::new(
            "local",
            0,
            vec![SettingValue::new(8, Value::String(None))],
        ));
        let mut service = catalog_service(vec![nullable], &provider);

        let optional = service
            .get_effective_setting::<Option<String>>(8)
            .await
            .unwrap();
        let error = service.get_effective_setting::<String>(8).await.unwrap_err();

        assert_eq!(optional.value, None);
        assert!(matches!(error, SettingsError::BadRequest(_)));
        assert!(error.to_string().contains("Option<String>"));
    }

    #[tokio::test]
    async fn unknown_setting_is_not_found() {
        let provider = Arc::new(MockValueProvider::empty("local", 0));
        let mut service = catalog_service(vec![greeting()], &provider);

        let error = service.get_effective_setting::<bool>(1).await.unwrap_err();

        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn provider_failure_propagates_unchanged() {
        let provider = Arc::new(MockValueProvider::empty("local", 0));
        provider.fail_next_snapshots(1);
        let mut service = catalog_service(vec![greeting()], &provider);

        let error = service.get_effective_setting::<String>(117).await.unwrap_err();

        assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn untyped_pair_uses_default_or_stored_value() {
        let provider = Arc::new(MockValueProvider::new(
            "local",
            0,
            vec![SettingValue::new(2, true)],
        ));
        let settings = vec![
            greeting(),
            Setting::new("enabled", BooleanRules::new(false)).with_id(2),
        ];
        let mut service = catalog_service(settings, &provider);

        let default = service.get_effective_value_pair(117).await.unwrap();
        let stored = service.get_effective_value_pair(2).await.unwrap();

        assert_eq!(default.value_as::<String>().as_deref(), Some("Hello"));
        assert_eq!(stored.value_as::<bool>(), Some(true));
    }
}

mod value_pairs {
    use super::*;

    fn settings() -> Vec<Setting> {
        vec![
            Setting::new("volume", BoundedRules::new(5)).with_id(1),
            Setting::new("muted", BooleanRules::new(false)).with_id(2),
            greeting(),
        ]
    }

    #[tokio::test]
    async fn pairs_stored_values_and_defaults() {
        let provider = Arc::new(MockValueProvider::new(
            "local",
            0,
            vec![SettingValue::new(1, 9_i64)],
        ));
        let mut service = catalog_service(settings(), &provider);

        let page = service.get_setting_value_pairs(None, 0, 10).await.unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.items[0].value_as::<i64>(), Some(9));
        assert_eq!(page.items[1].value_as::<bool>(), Some(false));
        assert_eq!(page.items[2].value_as::<String>().as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn keeps_paging_metadata() {
        let provider = Arc::new(MockValueProvider::empty("local", 0));
        let mut service = catalog_service(settings(), &provider);

        let page = service.get_setting_value_pairs(None, 1, 1).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].setting().id, 2);
        assert_eq!((page.skip, page.take, page.total), (1, 1, 3));
    }

    #[tokio::test]
    async fn stored_kind_mismatch_is_internal_error() {
        let provider = Arc::new(MockValueProvider::new(
            "local",
            0,
            vec![SettingValue::new(2, "not a bool")],
        ));
        let mut service = catalog_service(settings(), &provider);

        let error = service
            .get_setting_value_pairs(None, 0, 10)
            .await
            .unwrap_err();

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

mod definitions {
    use super::*;

    #[tokio::test]
    async fn create_stores_valid_setting() {
        let mut service = memory_service(Vec::new());

        let created = service.create(greeting()).await.unwrap();

        assert_eq!(created.name, "greeting");
        assert_eq!(service.settings().writes, 1);
    }

    #[tokio::test]
    async fn create_rejects_inconsistent_parameters() {
        let mut service = memory_service(Vec::new());
        let setting = Setting::new("volume", BoundedRules::new(5).with_min(10).with_max(1));

        let error = service.create(setting).await.unwrap_err();

        assert!(matches!(error, SettingsError::InvalidParameters { .. }));
        assert_eq!(service.settings().writes, 0);
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let mut service = memory_service(Vec::new());

        let error = service
            .create(Setting::new("   ", BooleanRules::new(true)))
            .await
            .unwrap_err();

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(service.settings().writes, 0);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let mut service = memory_service(vec![greeting()]);

        let error = service
            .create(Setting::new("greeting", StringRules::new("Hi")).with_id(5))
            .await
            .unwrap_err();

        assert_eq!(error.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn update_allows_keeping_own_name() {
        let mut service = memory_service(vec![greeting()]);

        let updated = service
            .update(greeting().with_description("Shown on start"))
            .await
            .unwrap();

        assert_eq!(updated.description, "Shown on start");
    }

    #[tokio::test]
    async fn update_rejects_name_of_other_setting() {
        let other = Setting::new("farewell", StringRules::new("Bye")).with_id(5);
        let mut service = memory_service(vec![greeting(), other]);

        let error = service
            .update(Setting::new("greeting", StringRules::new("Bye")).with_id(5))
            .await
            .unwrap_err();

        assert_eq!(error.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn update_of_unknown_setting_is_not_found() {
        let mut service = memory_service(Vec::new());

        let error = service.update(greeting()).await.unwrap_err();

        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn update_cannot_change_kind() {
        let mut service = memory_service(vec![greeting()]);

        let error = service
            .update(Setting::new("greeting", BooleanRules::new(true)).with_id(117))
            .await
            .unwrap_err();

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(service.settings().writes, 0);
    }

    #[tokio::test]
    async fn catalog_backed_create_is_not_implemented() {
        let provider = Arc::new(MockValueProvider::empty("local", 0));
        let mut service = catalog_service(Vec::new(), &provider);

        let error = service.create(greeting()).await.unwrap_err();

        assert_eq!(error.status(), StatusCode::NOT_IMPLEMENTED);
    }
}

mod values {
    use super::*;

    #[tokio::test]
    async fn batch_update_reaches_provider() {
        let provider = Arc::new(MockValueProvider::new(
            "local",
            0,
            vec![SettingValue::new(117, "World")],
        ));
        let mut service = catalog_service(vec![greeting()], &provider);

        service
            .update_setting_values(vec![SettingValue::new(117, "Again")])
            .await
            .unwrap();

        assert_eq!(provider.upserted_ids(), vec![vec![117]]);
        let effective = service.get_effective_setting::<String>(117).await.unwrap();
        assert_eq!(effective.value, "Again");
    }

    #[tokio::test]
    async fn delete_restores_default() {
        let provider = Arc::new(MockValueProvider::new(
            "local",
            0,
            vec![SettingValue::new(117, "World")],
        ));
        let mut service = catalog_service(vec![greeting()], &provider);

        service.delete_setting_value(117).await.unwrap();

        let effective = service.get_effective_setting::<String>(117).await.unwrap();
        assert_eq!(effective.value, "Hello");
        assert_eq!(provider.deletes(), vec![117]);
    }

    #[tokio::test]
    async fn create_value_validates_then_writes_first_provider() {
        let provider = Arc::new(MockValueProvider::empty("local", 0));
        let setting = Setting::new("volume", BoundedRules::new(5).with_max(10)).with_id(1);
        let mut service = catalog_service(vec![setting], &provider);

        let rejected = service
            .create_setting_value(SettingValue::new(1, 11_i64))
            .await
            .unwrap_err();
        service
            .create_setting_value(SettingValue::new(1, 7_i64))
            .await
            .unwrap();

        assert!(matches!(rejected, SettingsError::Validation { .. }));
        assert_eq!(provider.upserted_ids(), vec![vec![1]]);
        let effective = service.get_effective_setting::<i64>(1).await.unwrap();
        assert_eq!(effective.value, 7);
    }
}
