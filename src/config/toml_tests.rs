//! Tests for TOML configuration parsing.

use super::ConfigError;
use super::toml::{TomlConfig, default_config_template};

mod parsing {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = TomlConfig::parse("").unwrap();

        assert!(config.remote.endpoint.is_none());
        assert!(config.planner.max_chunk_size.is_none());
        assert!(config.retry.max_attempts.is_none());
        assert!(config.coupling.groups.is_none());
        assert!(config.coupling.families.is_empty());
    }

    #[test]
    fn parse_remote_section() {
        let toml = r#"
            [remote]
            endpoint = "https://cp.example.com/v1"
            bearer = "secret-token"
            timeout = 15

            [remote.headers]
            X-Team = "platform"
            X-Env = "staging"
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let remote = &config.remote;

        assert_eq!(remote.endpoint.as_deref(), Some("https://cp.example.com/v1"));
        assert_eq!(remote.bearer.as_deref(), Some("secret-token"));
        assert_eq!(remote.timeout, Some(15));
        assert_eq!(remote.headers.len(), 2);
        assert_eq!(remote.headers.get("X-Team").map(String::as_str), Some("platform"));
    }

    #[test]
    fn parse_planner_and_retry_sections() {
        let toml = r#"
            [planner]
            max_chunk_size = 10
            coupled_packing = "fill"
            free_order = "immediate-first"

            [retry]
            max_attempts = 4
            initial_delay_ms = 200
            max_delay_ms = 5000
            multiplier = 1.5
            jitter = 0.1
        "#;

        let config = TomlConfig::parse(toml).unwrap();

        assert_eq!(config.planner.max_chunk_size, Some(10));
        assert_eq!(config.planner.coupled_packing.as_deref(), Some("fill"));
        assert_eq!(config.planner.free_order.as_deref(), Some("immediate-first"));
        assert_eq!(config.retry.max_attempts, Some(4));
        assert_eq!(config.retry.initial_delay_ms, Some(200));
        assert_eq!(config.retry.max_delay_ms, Some(5000));
        assert_eq!(config.retry.multiplier, Some(1.5));
        assert_eq!(config.retry.jitter, Some(0.1));
    }

    #[test]
    fn parse_coupling_section() {
        let toml = r#"
            [coupling]
            groups = [["a", "b"], ["c", "d", "e"]]

            [coupling.families]
            postgres16 = [["max_wal_size", "min_wal_size"]]
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let groups = config.coupling.groups.unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1], vec!["c", "d", "e"]);
        assert_eq!(config.coupling.families["postgres16"].len(), 1);
    }
}

mod errors {
    use super::*;

    #[test]
    fn unknown_top_level_key_rejected() {
        let result = TomlConfig::parse("verbose = true");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn unknown_field_in_section_rejected() {
        let result = TomlConfig::parse("[planner]\nchunk_size = 5");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn wrong_type_rejected() {
        let result = TomlConfig::parse("[planner]\nmax_chunk_size = \"big\"");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn negative_chunk_size_rejected() {
        let result = TomlConfig::parse("[planner]\nmax_chunk_size = -1");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }
}

mod template {
    use super::*;

    #[test]
    fn template_parses() {
        let config = TomlConfig::parse(&default_config_template()).unwrap();

        assert_eq!(config.planner.max_chunk_size, Some(20));
        assert!(config.remote.endpoint.is_none());
    }

    #[test]
    fn template_mentions_every_section() {
        let template = default_config_template();

        for section in ["[remote]", "[planner]", "[retry]", "[coupling]"] {
            assert!(template.contains(section), "missing {section}");
        }
    }
}
