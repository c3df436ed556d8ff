use std::io::Write;

use ootel_lib::config::{load_from_path, parse_config};
use ootel_lib::{Client, ExporterKind, OotelError};
use tempfile::NamedTempFile;

fn write_config(toml: &str) -> Result<NamedTempFile, Box<dyn std::error::Error + Send + Sync>> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{toml}")?;
    Ok(file)
}

#[test]
fn loads_full_config() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = write_config(
        r#"
[logging]
level = "debug"
show_target = true

[trace]
enabled = true
sample_rate = 0.25
service_name = "example-service"
service_version = "1.0.0"

[metric]
enabled = true
exporter_type = "otlphttp"
server_port = 9464
"#,
    )?;

    let cfg = load_from_path(file.path())?;
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.show_target);
    assert_eq!(cfg.logging.otel_log_level, "warn");

    let trace = cfg.trace.as_ref().ok_or("trace missing")?;
    assert!(trace.enabled);
    assert_eq!(trace.sample_rate, 0.25);
    assert_eq!(trace.service_name, "example-service");
    assert_eq!(trace.service_version, "1.0.0");

    let metric = cfg.metric.as_ref().ok_or("metric missing")?;
    assert_eq!(metric.exporter_kind()?, ExporterKind::OtlpHttp);
    assert_eq!(metric.server_port, 9464);

    let client = Client::from_config(&cfg);
    assert_eq!(client.metric_config(), cfg.metric.as_ref());
    Ok(())
}

#[test]
fn empty_file_disables_everything() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = write_config("")?;
    let cfg = load_from_path(file.path())?;
    assert!(cfg.trace.is_none());
    assert!(cfg.metric.is_none());
    assert_eq!(cfg.logging.level, "info");
    Ok(())
}

#[test]
fn section_defaults_apply() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = write_config(
        r#"
[trace]
service_name = "svc"

[metric]
"#,
    )?;
    let cfg = load_from_path(file.path())?;

    let trace = cfg.trace.ok_or("trace missing")?;
    assert!(trace.enabled);
    assert_eq!(trace.sample_rate, 1.0);

    let metric = cfg.metric.ok_or("metric missing")?;
    assert!(metric.enabled);
    assert_eq!(metric.exporter_type, "prometheus");
    assert_eq!(metric.server_port, 8081);
    Ok(())
}

#[test]
fn rejects_unknown_exporter_type() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = write_config(
        r#"
[metric]
exporter_type = "statsd"
"#,
    )?;

    match load_from_path(file.path()) {
        Err(OotelError::Config(msg)) => assert!(msg.contains("statsd"), "{msg}"),
        other => panic!("expected config error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn rejects_out_of_range_sample_rate() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = write_config(
        r#"
[trace]
service_name = "svc"
sample_rate = 1.5
"#,
    )?;
    assert!(matches!(load_from_path(file.path()), Err(OotelError::Config(_))));
    Ok(())
}

#[test]
fn rejects_port_zero() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = write_config(
        r#"
[metric]
server_port = 0
"#,
    )?;
    assert!(matches!(load_from_path(file.path()), Err(OotelError::Config(_))));
    Ok(())
}

#[test]
fn missing_file_is_a_config_error() {
    match load_from_path("/definitely/not/here/ootel.toml") {
        Err(OotelError::Config(msg)) => assert!(msg.contains("/definitely/not/here"), "{msg}"),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn inline_text_parses_without_a_file() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cfg = parse_config(
        r#"
        [metric]
        exporter_type = "otlphttp"
        server_port = 9464
        "#,
    )?;
    assert!(cfg.trace.is_none());
    let metric = cfg.metric.ok_or("metric section missing")?;
    assert_eq!(metric.exporter_kind()?, ExporterKind::OtlpHttp);
    assert_eq!(metric.server_port, 9464);

    assert!(matches!(parse_config("[metric\n"), Err(OotelError::Config(_))));
    Ok(())
}
