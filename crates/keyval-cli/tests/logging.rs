//! Tests for logging configuration that do not install a subscriber.

use tracing::level_filters::LevelFilter;

use keyval_cli::logging::{LogConfig, LogFormat, REDACTED_VALUE, log_data_enabled, redact_value};

#[test]
fn identifiers_are_redacted_by_default() {
    assert!(!log_data_enabled());
    assert_eq!(redact_value("DO12345"), REDACTED_VALUE);
}

#[test]
fn default_directive_scopes_level_to_workspace_crates() {
    let config = LogConfig::default().with_level_filter(LevelFilter::DEBUG);
    let directive = config.default_directive();
    assert!(directive.starts_with("warn,"));
    assert!(directive.contains("keyval_validate=debug"));
    assert!(directive.contains("keyval_ingest=debug"));
    assert!(!directive.contains("rayon"));
}

#[test]
fn builders_set_fields() {
    let config = LogConfig::default()
        .with_format(LogFormat::Json)
        .with_ansi(false)
        .with_timestamps(true)
        .with_log_data(true);
    assert_eq!(config.format, LogFormat::Json);
    assert!(!config.with_ansi);
    assert!(config.with_timestamps);
    assert!(config.log_data);
    assert!(config.log_file.is_none());
}
