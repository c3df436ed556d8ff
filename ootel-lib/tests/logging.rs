use ootel_lib::telemetry::tracer_provider_with_exporter;
use ootel_lib::{init_logging, LoggingConfig, OotelError, TraceConfig};
use opentelemetry_sdk::trace::InMemorySpanExporter;

// One test: the subscriber is process-wide and can only be installed once.
#[test]
fn tracer_attached_after_logging_exports_spans(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = LoggingConfig::default();
    let logging = init_logging(&config, None)?;

    tracing::info_span!("before_attach").in_scope(|| tracing::info!("not exported"));

    let exporter = InMemorySpanExporter::default();
    let provider = tracer_provider_with_exporter(
        &TraceConfig::new(true, 1.0, "logging-test", "0.0.1"),
        exporter.clone(),
    );
    logging.attach_tracer(&provider)?;

    tracing::info_span!("after_attach").in_scope(|| tracing::info!("exported"));

    provider.force_flush()?;
    let names: Vec<String> = exporter
        .get_finished_spans()?
        .into_iter()
        .map(|span| span.name.into_owned())
        .collect();
    assert_eq!(names, vec!["after_attach"]);

    assert!(matches!(init_logging(&config, None), Err(OotelError::Logging(_))));

    provider.shutdown()?;
    Ok(())
}
