//! Tests for config functionality.

use crate::config::{Config, ConfigFileWhitelist, SnapshotSettings};
use crate::orchestrator::WhitelistSource;
use crate::validate::{SafetyPolicy, WhitelistEntry};
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.whitelist.is_empty());
    assert_eq!(config.safety_policy, SafetyPolicy::DefaultDeny);
    assert_eq!(config.shell, "/bin/sh");
    assert_eq!(config.command_timeout_seconds, 300);
    assert_eq!(config.settle_delay_ms, 1000);
    assert_eq!(config.disk_usage_command, "df -h /");
    assert!(config.record_events);
    assert_eq!(config.snapshots, SnapshotSettings::default());
    assert_eq!(config.snapshots.estimate_gb, 2.0);
    assert_eq!(config.snapshots.probe_concurrency, 4);
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
settle_delay_ms: 0
safety_policy: default_allow
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.settle_delay_ms, 0);
    assert_eq!(config.safety_policy, SafetyPolicy::DefaultAllow);

    // Unspecified values should use defaults
    assert_eq!(config.command_timeout_seconds, 300);
    assert_eq!(config.disk_usage_command, "df -h /");
}

#[test]
fn test_parse_whitelist_with_optional_description() {
    let yaml = r#"
whitelist:
  - id: docs
    path: /Users/*/Documents
    description: Personal documents
  - id: proj
    path: ~/Projects
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.whitelist.len(), 2);
    assert_eq!(config.whitelist[0].path, "/Users/*/Documents");
    assert_eq!(
        config.whitelist[0].description.as_deref(),
        Some("Personal documents")
    );
    assert_eq!(config.whitelist[1].id, "proj");
    assert!(config.whitelist[1].description.is_none());
}

#[test]
fn test_parse_partial_snapshot_settings() {
    let yaml = r#"
snapshots:
  estimate_gb: 3.5
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.snapshots.estimate_gb, 3.5);
    assert_eq!(
        config.snapshots.list_command,
        SnapshotSettings::default().list_command
    );
}

#[test]
fn test_unknown_fields_ignored() {
    let yaml = r#"
record_events: false
future_option: true
snapshots:
  something_new: 42
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert!(!config.record_events);
}

#[test]
fn test_invalid_yaml_is_config_error() {
    let err = Config::from_yaml("whitelist: [unterminated").unwrap_err();
    assert!(err.to_string().contains("failed to parse config YAML"));
}

#[test]
fn test_validation_rejects_zero_timeout() {
    let err = Config::from_yaml("command_timeout_seconds: 0").unwrap_err();
    assert!(err.to_string().contains("command_timeout_seconds"));
}

#[test]
fn test_validation_rejects_empty_whitelist_path() {
    let yaml = r#"
whitelist:
  - id: blank
    path: "  "
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("empty path"));
}

#[test]
fn test_validation_rejects_duplicate_whitelist_ids() {
    let yaml = r#"
whitelist:
  - id: a
    path: /one
  - id: a
    path: /two
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate whitelist id 'a'"));
}

#[test]
fn test_validation_rejects_negative_estimate() {
    let err = Config::from_yaml("snapshots:\n  estimate_gb: -1.0\n").unwrap_err();
    assert!(err.to_string().contains("estimate_gb"));
}

#[test]
fn test_validation_rejects_zero_concurrency() {
    let err = Config::from_yaml("snapshots:\n  probe_concurrency: 0\n").unwrap_err();
    assert!(err.to_string().contains("probe_concurrency"));
}

#[test]
fn test_yaml_roundtrip() {
    let mut config = Config::default();
    config
        .add_whitelist_path("~/Projects", Some("code".to_string()))
        .unwrap();
    config.safety_policy = SafetyPolicy::DefaultAllow;

    let yaml = config.to_yaml().unwrap();
    let parsed = Config::from_yaml(&yaml).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("reclaim").join("config.yaml");

    let mut config = Config::default();
    config.add_whitelist_path("/Volumes/Backup", None).unwrap();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.whitelist.len(), 1);
    assert_eq!(loaded.whitelist[0].path, "/Volumes/Backup");
}

#[test]
fn test_load_or_default_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::load_or_default(temp_dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_or_default_propagates_parse_errors() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(&path, "command_timeout_seconds: [nope").unwrap();

    assert!(Config::load_or_default(&path).is_err());
}

#[test]
fn test_add_whitelist_path_assigns_unique_ids() {
    let mut config = Config::default();
    let first = config.add_whitelist_path("/one", None).unwrap();
    let second = config.add_whitelist_path("/two", None).unwrap();

    assert_eq!(first, "wl_1");
    assert_eq!(second, "wl_2");

    config.remove_whitelist_entry("wl_1").unwrap();
    let third = config.add_whitelist_path("/three", None).unwrap();
    // wl_2 is still taken after the removal shifted the count.
    assert_eq!(third, "wl_2_2");
}

#[test]
fn test_add_whitelist_path_is_idempotent() {
    let mut config = Config::default();
    let first = config.add_whitelist_path("~/Projects", None).unwrap();
    let again = config.add_whitelist_path("~/Projects", None).unwrap();

    assert_eq!(first, again);
    assert_eq!(config.whitelist.len(), 1);
}

#[test]
fn test_add_whitelist_path_rejects_empty() {
    let mut config = Config::default();
    assert!(config.add_whitelist_path("   ", None).is_err());
}

#[test]
fn test_remove_whitelist_entry_by_path() {
    let mut config = Config::default();
    config.whitelist.push(WhitelistEntry {
        id: "docs".to_string(),
        path: "~/Documents".to_string(),
        description: None,
    });

    let removed = config.remove_whitelist_entry("~/Documents").unwrap();
    assert_eq!(removed.id, "docs");
    assert!(config.whitelist.is_empty());
    assert!(config.remove_whitelist_entry("docs").is_err());
}

#[test]
fn test_snapshot_settings_render_quotes_path() {
    let settings = SnapshotSettings::default();
    let cmd = settings.render(
        &settings.unique_size_command,
        "com.apple.TimeMachine.2024-01-15-143022.local",
    );
    assert_eq!(
        cmd,
        "tmutil uniquesize /.com.apple.TimeMachine.supported/com.apple.TimeMachine.2024-01-15-143022.local"
    );

    let spaced = settings.render("du -sh {path}", "odd name");
    assert_eq!(spaced, "du -sh '/.com.apple.TimeMachine.supported/odd name'");
}

#[test]
fn test_config_file_whitelist_rereads_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    let source = ConfigFileWhitelist::new(&path);

    assert!(source.snapshot().unwrap().is_empty());

    let mut config = Config::default();
    config.add_whitelist_path("~/Projects", None).unwrap();
    config.save(&path).unwrap();

    let entries = source.snapshot().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "~/Projects");
}

#[test]
fn test_validation_rejects_malformed_whitelist_glob() {
    let yaml = r#"
whitelist:
  - id: broken
    path: "/Users/[abc/Documents"
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("invalid glob"));
}
