//! Tests for TOML configuration parsing.

use crate::setting::SettingKind;

use super::ConfigError;
use super::toml::{TomlConfig, default_config_template};

mod parsing {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = TomlConfig::parse("").unwrap();

        assert!(config.settings.is_empty());
        assert!(config.stores.is_empty());
        assert!(config.page_size.is_none());
    }

    #[test]
    fn parse_setting_entry() {
        let toml = r#"
            [[settings]]
            id = 2
            name = "font_size"
            kind = "integer"
            category = "Display"
            default = 12
            min = 6
            max = 72
            allowed = [12, 14]
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let entry = &config.settings[0];

        assert_eq!(entry.id, 2);
        assert_eq!(entry.kind, SettingKind::Integer);
        assert_eq!(entry.category.as_deref(), Some("Display"));
        assert_eq!(entry.default.as_ref().and_then(toml::Value::as_integer), Some(12));
        assert_eq!(entry.allowed.len(), 2);
        assert!(!entry.required);
    }

    #[test]
    fn parse_date_time_kind() {
        let toml = r#"
            [[settings]]
            id = 5
            name = "trial_ends"
            kind = "date_time"
            default = 2030-01-01T00:00:00Z
        "#;

        let config = TomlConfig::parse(toml).unwrap();

        assert_eq!(config.settings[0].kind, SettingKind::DateTime);
        assert!(config.settings[0].default.as_ref().is_some_and(toml::Value::is_datetime));
    }

    #[test]
    fn parse_stores() {
        let toml = r#"
            page_size = 5

            [[stores]]
            path = "local.json"

            [[stores]]
            path = "global.json"
            rank = 10
        "#;

        let config = TomlConfig::parse(toml).unwrap();

        assert_eq!(config.page_size, Some(5));
        assert_eq!(config.stores.len(), 2);
        assert_eq!(config.stores[0].rank, None);
        assert_eq!(config.stores[1].rank, Some(10));
    }
}

mod errors {
    use super::*;

    #[test]
    fn unknown_field_is_rejected() {
        let toml = r#"
            [[stores]]
            path = "local.json"
            priority = 1
        "#;

        let result = TomlConfig::parse(toml);

        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let toml = r#"
            [[settings]]
            id = 1
            name = "x"
            kind = "decimal"
        "#;

        assert!(TomlConfig::parse(toml).is_err());
    }

    #[test]
    fn missing_file_is_read_error() {
        let result = TomlConfig::load(std::path::Path::new("/nonexistent/layered.toml"));

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }
}

mod template {
    use super::*;

    #[test]
    fn default_template_parses() {
        let config = TomlConfig::parse(&default_config_template()).unwrap();

        assert_eq!(config.settings.len(), 3);
        assert_eq!(config.stores.len(), 1);
    }
}
