//! Loading rules files from disk.

use std::fs;
use std::path::PathBuf;

use stix_standards::{NormalizationRules, RulesError, resolve_rules};

fn shipped_rules_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../standards/stix-rules.toml")
}

#[test]
fn shipped_rules_match_defaults() {
    let rules = NormalizationRules::load(&shipped_rules_path()).expect("load shipped rules");
    assert_eq!(rules, NormalizationRules::default());
}

#[test]
fn explicit_path_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.toml");
    fs::write(&path, "street_number_max_len = 8\n").unwrap();

    let rules = resolve_rules(Some(&path)).expect("resolve rules");
    assert_eq!(rules.street_number_max_len, 8);
    assert_eq!(rules.unit_max_len, 5);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = NormalizationRules::load(&path).expect_err("missing file");
    assert!(matches!(err, RulesError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn zero_threshold_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.toml");
    fs::write(&path, "unit_max_len = 0\n").unwrap();
    let err = NormalizationRules::load(&path).expect_err("zero threshold");
    assert!(matches!(err, RulesError::Invalid { .. }));
}
