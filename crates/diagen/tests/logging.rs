//! Tests for logging functionality
//!
//! Initialization can only succeed once per process, so these tests check
//! that repeated or invalid calls fail gracefully rather than panic.

use diagen::core::logging::{init_logging, LogFormat};
use diagen::prelude::*;
use diagen::{parse, render, validate};
use serde_json::json;
use std::str::FromStr;
use tracing_subscriber::util::SubscriberInitExt;

fn sample_spec() -> serde_json::Value {
    json!({
        "title": "Traced",
        "provider": "aws",
        "components": [
            {"id": "web", "type": "EC2", "category": "compute"},
            {"id": "db", "type": "RDS", "category": "database"}
        ],
        "connections": [{"from": "web", "to": "db"}]
    })
}

#[test]
fn test_log_format_parsing() {
    assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
    assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
    assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
    assert_eq!(LogFormat::from_str("COMPACT").unwrap(), LogFormat::Compact);
    assert!(LogFormat::from_str("invalid").is_err());
}

#[test]
fn test_log_format_variants() {
    let variants = LogFormat::variants();
    assert!(variants.contains(&"compact"));
    assert!(variants.contains(&"pretty"));
    assert!(variants.contains(&"json"));
}

#[test]
fn test_init_logging_with_levels() {
    let _ = init_logging(Some("trace"), Some("compact"));
    let _ = init_logging(Some("debug"), Some("compact"));
    let _ = init_logging(Some("warn"), Some("compact"));
    let _ = init_logging(Some("off"), Some("compact"));
}

#[test]
fn test_init_logging_with_formats() {
    let _ = init_logging(Some("info"), Some("compact"));
    let _ = init_logging(Some("info"), Some("pretty"));
    let _ = init_logging(Some("info"), Some("json"));
}

#[test]
fn test_init_logging_invalid_format() {
    let result = init_logging(Some("info"), Some("invalid_format"));
    assert!(result.is_err());
}

#[test]
fn test_init_logging_invalid_level() {
    // EnvFilter falls back to info; a second init may still fail
    let _ = init_logging(Some("not-a-level"), Some("compact"));
}

#[test]
fn test_render_with_tracing_subscriber() {
    let _guard = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .set_default();

    let dir = tempfile::tempdir().unwrap();
    let result = render(&sample_spec(), &dir.path().join("traced"), OutputFormat::Dot);

    assert!(result.is_success(), "{:?}", result.error());
    assert!(dir.path().join("traced.dot").is_file());
}

#[test]
fn test_parse_and_validate_with_tracing() {
    let _ = init_logging(Some("debug"), Some("compact"));

    let spec = parse(&sample_spec()).unwrap();
    assert_eq!(spec.component_count(), 2);
    assert_eq!(spec.connection_count(), 1);

    let (valid, errors) = validate(&sample_spec());
    assert!(valid);
    assert!(errors.is_empty());
}
