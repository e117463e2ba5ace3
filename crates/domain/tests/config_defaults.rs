use sp_domain::config::{Config, ConfigSeverity, LogFormat};

#[test]
fn default_horizon_is_three_months() {
    let config = Config::default();
    assert_eq!(config.scheduling.horizon_months, 3);
}

#[test]
fn default_maintenance_runs_every_ten_minutes() {
    let config = Config::default();
    assert!(config.maintenance.enabled);
    assert_eq!(config.maintenance.interval_secs, 600);
}

#[test]
fn empty_file_parses_to_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.storage.state_path, std::path::PathBuf::from("./data"));
    assert_eq!(config.observability.log_format, LogFormat::Json);
}

#[test]
fn sections_parse() {
    let toml_str = r#"
[scheduling]
horizon_months = 6
max_generated_occurrences = 400

[maintenance]
enabled = false
interval_secs = 120

[storage]
state_path = "/var/lib/showplan"

[observability]
log_format = "compact"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.scheduling.horizon_months, 6);
    assert_eq!(config.scheduling.max_generated_occurrences, 400);
    assert_eq!(config.scheduling.preview_occurrences, 5);
    assert!(!config.maintenance.enabled);
    assert_eq!(config.storage.state_path, std::path::PathBuf::from("/var/lib/showplan"));
    assert_eq!(config.observability.log_format, LogFormat::Compact);
    assert!(config.validate().is_empty());
}

#[test]
fn oversized_horizon_fails_validation() {
    let config: Config = toml::from_str("[scheduling]\nhorizon_months = 48\n").unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.severity == ConfigSeverity::Error && i.field == "scheduling.horizon_months"));
}
