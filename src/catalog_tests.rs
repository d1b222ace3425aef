//! Tests for the setting catalog.

use std::sync::Arc;

use http::StatusCode;

use crate::provider::{SettingsProvider, StaticSettingsProvider};
use crate::provider::mock::FailingSettingsProvider;
use crate::repository::SettingsRepository;
use crate::setting::{BooleanRules, BoundedRules, Setting, SettingCategory, StringRules};

use super::{DEFAULT_CATEGORY_KEY, SettingsCatalog};

fn category(name: &str) -> SettingCategory {
    SettingCategory::new(name).unwrap()
}

/// Five settings: three in "Display", two in "Audio".
fn five_settings() -> Vec<Setting> {
    vec![
        Setting::new("theme", StringRules::new("dark"))
            .with_id(1)
            .with_category(category("Display")),
        Setting::new("volume", BoundedRules::new(5))
            .with_id(2)
            .with_category(category("Audio")),
        Setting::new("scale", BoundedRules::new(1.0))
            .with_id(3)
            .with_category(category("Display")),
        Setting::new("muted", BooleanRules::new(false))
            .with_id(4)
            .with_category(category("Audio")),
        Setting::new("font", StringRules::new("mono"))
            .with_id(5)
            .with_category(category("Display")),
    ]
}

fn catalog(settings: Vec<Setting>) -> SettingsCatalog {
    SettingsCatalog::new(vec![Arc::new(StaticSettingsProvider::new(settings))])
}

fn ids(settings: &[Setting]) -> Vec<i64> {
    settings.iter().map(|s| s.id).collect()
}

mod lookup {
    use super::*;

    #[tokio::test]
    async fn get_returns_setting_by_id() {
        let mut catalog = catalog(five_settings());

        let setting = catalog.get(3).await.unwrap();

        assert_eq!(setting.name, "scale");
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let mut catalog = catalog(five_settings());

        let error = catalog.get(99).await.unwrap_err();

        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_by_name_matches_exactly() {
        let mut catalog = catalog(five_settings());

        let found = catalog.get_by_name("volume").await.unwrap();
        let case_mismatch = catalog.get_by_name("Volume").await.unwrap();

        assert_eq!(ids(&found), vec![2]);
        assert!(case_mismatch.is_empty());
    }

    #[tokio::test]
    async fn later_provider_replaces_same_id_in_place() {
        let first = StaticSettingsProvider::new(five_settings());
        let second = StaticSettingsProvider::new(vec![
            Setting::new("volume-v2", BoundedRules::new(7)).with_id(2),
        ]);
        let mut catalog = SettingsCatalog::new(vec![Arc::new(first), Arc::new(second)]);

        let page = catalog.get_page(None, 0, 10).await.unwrap();

        assert_eq!(ids(&page.items), vec![1, 2, 3, 4, 5]);
        assert_eq!(page.items[1].name, "volume-v2");
        assert!(catalog.get_by_name("volume").await.unwrap().is_empty());
    }
}

mod paging {
    use super::*;

    #[tokio::test]
    async fn page_slices_in_insertion_order_with_full_total() {
        let mut catalog = catalog(five_settings());

        let page = catalog.get_page(None, 1, 3).await.unwrap();

        assert_eq!(ids(&page.items), vec![2, 3, 4]);
        assert_eq!(page.total, 5);
        assert_eq!(page.skip, 1);
        assert_eq!(page.take, 3);
    }

    #[tokio::test]
    async fn category_filter_reports_matching_total() {
        let mut catalog = catalog(five_settings());

        let page = catalog
            .get_page(Some(&category("Display")), 1, 1)
            .await
            .unwrap();

        assert_eq!(ids(&page.items), vec![3]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn unknown_category_is_empty_page() {
        let mut catalog = catalog(five_settings());

        let page = catalog
            .get_page(Some(&category("Network")), 0, 10)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn uncategorized_settings_use_default_bucket() {
        let mut catalog = catalog(vec![
            Setting::new("a", BooleanRules::new(true)).with_id(1),
            Setting::new("b", BooleanRules::new(true))
                .with_id(2)
                .with_category(category("Other")),
        ]);

        let page = catalog
            .get_page(Some(&category(DEFAULT_CATEGORY_KEY)), 0, 10)
            .await
            .unwrap();

        assert_eq!(ids(&page.items), vec![1]);
    }

    #[tokio::test]
    async fn skip_past_end_is_empty_with_total() {
        let mut catalog = catalog(five_settings());

        let page = catalog.get_page(None, 10, 3).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
    }
}

mod initialization {
    use super::*;

    #[tokio::test]
    async fn is_lazy() {
        let mut catalog = catalog(five_settings());
        assert!(!catalog.is_initialized());

        catalog.get(1).await.unwrap();

        assert!(catalog.is_initialized());
    }

    #[tokio::test]
    async fn failure_surfaces_and_retries_on_next_access() {
        let failing = Arc::new(FailingSettingsProvider::default());
        let provider: Arc<dyn SettingsProvider> = failing.clone();
        let mut catalog = SettingsCatalog::new(vec![provider]);

        let first = catalog.get(1).await.unwrap_err();
        let second = catalog.get_by_name("x").await.unwrap_err();

        assert_eq!(first.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(second.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(failing.calls(), 2);
        assert!(!catalog.is_initialized());
    }

    #[tokio::test]
    async fn reinitialize_rebuilds_indexes() {
        let mut catalog = catalog(five_settings());
        catalog.get(1).await.unwrap();

        catalog.initialize().await.unwrap();

        let page = catalog.get_page(None, 0, 10).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(ids(&catalog.get_by_name("font").await.unwrap()), vec![5]);
    }
}

mod mutations {
    use super::*;

    #[tokio::test]
    async fn create_update_delete_are_not_implemented() {
        let mut catalog = catalog(five_settings());
        let setting = Setting::new("new", BooleanRules::new(true));

        let create = catalog.create(setting.clone()).await.unwrap_err();
        let update = catalog.update(setting.with_id(1)).await.unwrap_err();
        let delete = catalog.delete(1).await.unwrap_err();

        for error in [create, update, delete] {
            assert_eq!(error.status(), StatusCode::NOT_IMPLEMENTED);
        }
        assert!(catalog.get(1).await.is_ok());
    }
}
