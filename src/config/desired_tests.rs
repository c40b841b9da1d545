//! Tests for desired-state file parsing.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::setting::{ApplyTiming, DEFAULT_DESCRIPTION, Setting, SettingSource};

use super::ConfigError;
use super::desired::Desired;

fn parse(content: &str) -> Result<Desired, ConfigError> {
    Desired::parse(content, Path::new("desired.toml"))
}

mod parsing {
    use super::*;

    #[test]
    fn parse_full_file() {
        let desired = parse(
            r#"
            name = "app-mysql"
            family = "mysql8.0"
            description = "Application database"
            retain_on_destroy = true

            [[parameter]]
            name = "character_set_server"
            value = "utf8mb4"

            [[parameter]]
            name = "innodb_buffer_pool_size"
            value = "1073741824"
            apply_method = "pending-reboot"
        "#,
        )
        .unwrap();

        let set = &desired.parameter_set;
        assert_eq!(set.name, "app-mysql");
        assert_eq!(set.family, "mysql8.0");
        assert_eq!(set.description, "Application database");
        assert!(desired.retain_on_destroy);
        assert_eq!(
            set.settings,
            vec![
                Setting::immediate("character_set_server", "utf8mb4"),
                Setting::pending_reboot("innodb_buffer_pool_size", "1073741824"),
            ]
        );
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let desired = parse("name = \"app\"\nfamily = \"postgres16\"").unwrap();

        assert_eq!(desired.parameter_set.description, DEFAULT_DESCRIPTION);
        assert!(desired.parameter_set.is_empty());
        assert!(!desired.retain_on_destroy);
    }

    #[test]
    fn scalar_values_are_stringified() {
        let desired = parse(
            r#"
            name = "app"
            family = "mysql8.0"

            [[parameter]]
            name = "max_connections"
            value = 500

            [[parameter]]
            name = "performance_schema"
            value = true
        "#,
        )
        .unwrap();

        let set = &desired.parameter_set;
        assert_eq!(set.get("max_connections").unwrap().value, "500");
        assert_eq!(set.get("performance_schema").unwrap().value, "true");
    }

    #[test]
    fn settings_are_user_sourced() {
        let desired = parse(
            r#"
            name = "app"
            family = "mysql8.0"

            [[parameter]]
            name = "time_zone"
            value = "UTC"
        "#,
        )
        .unwrap();

        assert_eq!(
            desired.parameter_set.settings[0].source,
            SettingSource::User
        );
    }

    #[test]
    fn duplicates_are_kept_for_reconciliation_to_reject() {
        let desired = parse(
            r#"
            name = "app"
            family = "mysql8.0"

            [[parameter]]
            name = "max_connections"
            value = "100"

            [[parameter]]
            name = "MAX_CONNECTIONS"
            value = "200"
        "#,
        )
        .unwrap();

        assert_eq!(desired.parameter_set.len(), 2);
    }

    #[test]
    fn apply_method_spelling() {
        let desired = parse(
            r#"
            name = "app"
            family = "mysql8.0"

            [[parameter]]
            name = "a"
            value = "1"
            apply_method = "immediate"
        "#,
        )
        .unwrap();

        assert_eq!(
            desired.parameter_set.settings[0].apply_timing,
            ApplyTiming::Immediate
        );
    }
}

mod errors {
    use super::*;

    #[test]
    fn blank_name_rejected() {
        let result = parse("name = \"  \"\nfamily = \"mysql8.0\"");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDesired { reason, .. }) if reason.contains("name")
        ));
    }

    #[test]
    fn blank_family_rejected() {
        let result = parse("name = \"app\"\nfamily = \"\"");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDesired { reason, .. }) if reason.contains("family")
        ));
    }

    #[test]
    fn missing_family_rejected() {
        assert!(matches!(
            parse("name = \"app\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(matches!(
            parse("name = \"app\"\nfamily = \"f\"\nengine = \"x\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn declared_source_rejected() {
        let result = parse(
            r#"
            name = "app"
            family = "mysql8.0"

            [[parameter]]
            name = "time_zone"
            value = "UTC"
            source = "system"
        "#,
        );

        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn misspelled_parameter_key_rejected() {
        let result = parse(
            r#"
            name = "app"
            family = "mysql8.0"

            [[parameter]]
            name = "innodb_buffer_pool_size"
            value = "1073741824"
            apply-method = "pending-reboot"
        "#,
        );

        let e = match result {
            Err(ConfigError::TomlParse(e)) => e,
            other => panic!("expected parse error, got {other:?}"),
        };
        assert!(e.to_string().contains("apply-method"));
    }

    #[test]
    fn unquoted_float_value_rejected() {
        let result = parse(
            r#"
            name = "app"
            family = "mysql8.0"

            [[parameter]]
            name = "innodb_max_dirty_pages_pct"
            value = 90.0
        "#,
        );

        let e = match result {
            Err(ConfigError::TomlParse(e)) => e,
            other => panic!("expected parse error, got {other:?}"),
        };
        assert!(e.to_string().contains("quote non-integer numbers"));
    }

    #[test]
    fn quoted_float_value_keeps_spelling() {
        let desired = parse(
            r#"
            name = "app"
            family = "mysql8.0"

            [[parameter]]
            name = "innodb_max_dirty_pages_pct"
            value = "90.0"
        "#,
        )
        .unwrap();

        assert_eq!(desired.parameter_set.settings[0].value, "90.0");
    }

    #[test]
    fn unknown_apply_method_rejected() {
        let result = parse(
            r#"
            name = "app"
            family = "mysql8.0"

            [[parameter]]
            name = "a"
            value = "1"
            apply_method = "later"
        "#,
        );

        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }
}

mod loading {
    use super::*;

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "name = \"app\"\nfamily = \"mysql8.0\"\n\n[[parameter]]\nname = \"a\"\nvalue = \"1\""
        )
        .unwrap();

        let desired = Desired::load(file.path()).unwrap();

        assert_eq!(desired.parameter_set.name, "app");
        assert_eq!(desired.parameter_set.len(), 1);
    }

    #[test]
    fn missing_file_returns_file_read() {
        let result = Desired::load(Path::new("no_such_desired_12345.toml"));

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }
}
