//! Tests for coupling groups and tables.

use super::{CoupledGroup, CouplingError, CouplingRules, CouplingTable};
use crate::setting::SettingName;

fn name(s: &str) -> SettingName {
    SettingName::new(s)
}

mod coupled_group {
    use super::*;

    #[test]
    fn members_are_sorted_case_insensitively() {
        let group = CoupledGroup::new(["collation_server", "Character_set_server"]).unwrap();
        let members: Vec<&str> = group.members().map(SettingName::as_str).collect();

        assert_eq!(members, vec!["Character_set_server", "collation_server"]);
    }

    #[test]
    fn single_member_is_rejected() {
        let err = CoupledGroup::new(["character_set_server"]).unwrap_err();
        assert!(matches!(err, CouplingError::TooFewMembers { .. }));
    }

    #[test]
    fn case_duplicates_count_once() {
        let result = CoupledGroup::new(["sync_binlog", "SYNC_BINLOG"]);
        assert!(result.is_err());
    }

    #[test]
    fn contains_ignores_case() {
        let group = CoupledGroup::new(["a", "b"]).unwrap();
        assert!(group.contains(&name("A")));
        assert!(!group.contains(&name("c")));
    }
}

mod rules {
    use super::*;

    #[test]
    fn group_of_returns_index() {
        let rules = CouplingRules::new([
            CoupledGroup::new(["a", "b"]).unwrap(),
            CoupledGroup::new(["c", "d"]).unwrap(),
        ]);

        assert_eq!(rules.group_of(&name("b")), Some(0));
        assert_eq!(rules.group_of(&name("C")), Some(1));
        assert_eq!(rules.group_of(&name("e")), None);
    }

    #[test]
    fn overlapping_groups_are_merged() {
        let rules = CouplingRules::new([
            CoupledGroup::new(["a", "b"]).unwrap(),
            CoupledGroup::new(["x", "y"]).unwrap(),
            CoupledGroup::new(["b", "c"]).unwrap(),
        ]);

        assert_eq!(rules.groups().len(), 2);
        assert_eq!(rules.group_of(&name("a")), rules.group_of(&name("c")));
        assert_ne!(rules.group_of(&name("a")), rules.group_of(&name("x")));
    }

    #[test]
    fn chain_of_overlaps_collapses_to_one_group() {
        let rules = CouplingRules::new([
            CoupledGroup::new(["a", "b"]).unwrap(),
            CoupledGroup::new(["c", "d"]).unwrap(),
            CoupledGroup::new(["b", "c"]).unwrap(),
        ]);

        assert_eq!(rules.groups().len(), 1);
        assert_eq!(rules.groups()[0].len(), 4);
    }

    #[test]
    fn none_has_no_groups() {
        assert!(CouplingRules::none().is_empty());
    }
}

mod table {
    use super::*;

    #[test]
    fn builtin_couples_charset_and_collation() {
        let rules = CouplingTable::builtin().rules_for("mysql8.0");

        assert_eq!(
            rules.group_of(&name("character_set_server")),
            rules.group_of(&name("collation_server"))
        );
        assert!(rules.group_of(&name("character_set_server")).is_some());
    }

    #[test]
    fn builtin_couples_ssl_protocol_bounds() {
        let rules = CouplingTable::builtin().rules_for("postgres16");

        assert!(rules.group_of(&name("ssl_min_protocol_version")).is_some());
        assert_eq!(
            rules.group_of(&name("ssl_min_protocol_version")),
            rules.group_of(&name("ssl_max_protocol_version"))
        );
    }

    #[test]
    fn default_is_builtin() {
        assert_eq!(CouplingTable::default(), CouplingTable::builtin());
    }

    #[test]
    fn family_groups_apply_only_to_that_family() {
        let table = CouplingTable::empty().with_family_group(
            "MySQL5.7",
            CoupledGroup::new(["innodb_log_file_size", "innodb_log_files_in_group"]).unwrap(),
        );

        let mysql = table.rules_for("mysql5.7");
        let postgres = table.rules_for("postgres16");

        assert!(mysql.group_of(&name("innodb_log_file_size")).is_some());
        assert!(postgres.is_empty());
        assert_eq!(table.family_count(), 1);
    }

    #[test]
    fn family_groups_extend_common_groups() {
        let table = CouplingTable::builtin().with_family_group(
            "mysql8.0",
            CoupledGroup::new(["a", "b"]).unwrap(),
        );

        assert_eq!(table.rules_for("mysql8.0").groups().len(), 3);
        assert_eq!(table.rules_for("mysql5.7").groups().len(), 2);
    }

    #[test]
    fn empty_table_yields_no_rules() {
        assert!(CouplingTable::empty().rules_for("anything").is_empty());
    }
}
