//! Integration tests for logging system

use bridge_traits::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_logging_config_chain() {
    // Only one subscriber may be installed per process, so the builder is
    // checked separately from initialisation.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_pii_redaction(true)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.redact_pii);
    assert!(config.enable_spans);
}

#[test]
fn test_credentials_are_redacted() {
    assert_eq!(redact_if_sensitive("password", "my_password"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("id_token", "eyJhbGciOi"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("access_token", "ya29.a0"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("refresh_token", "1//0g"), "[REDACTED]");
}

#[test]
fn test_emails_are_redacted() {
    let redacted = redact_if_sensitive("email", "user@example.com");

    assert!(redacted.starts_with('u'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_plain_values_pass_through() {
    assert_eq!(redact_if_sensitive("user_id", "user_123"), "user_123");
    assert_eq!(redact_if_sensitive("operation", "login"), "login");
    // Not an address without a domain part
    assert_eq!(redact_if_sensitive("handle", "@ada"), "@ada");
}

#[test]
fn test_init_logging_twice_fails() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    init_logging(config.clone()).expect("first initialisation succeeds");

    match init_logging(config) {
        Err(Error::Config(msg)) => assert!(msg.contains("Failed to initialize logging")),
        other => panic!("Expected config error, got {:?}", other),
    }
}

#[test]
fn test_invalid_filter_rejected() {
    let config = LoggingConfig::default().with_filter("core_auth=[");
    assert!(matches!(init_logging(config), Err(Error::Config(_))));
}
