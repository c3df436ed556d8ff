//! Tracer provider assembly.
//!
//! Spans are exported over OTLP/gRPC in batches. The collector endpoint comes
//! from the standard `OTEL_EXPORTER_OTLP_*` variables.

use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{self as sdktrace, BatchSpanProcessor, Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing::debug;

use crate::config::TraceConfig;
use crate::error::{OotelError, Result};

const SERVICE_VERSION: &str = "service.version";

/// Install the W3C trace-context + baggage propagator as the global propagator
pub fn install_propagator() {
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));
}

/// Build a tracer provider exporting to OTLP over gRPC
pub fn tracer_provider(config: &TraceConfig) -> Result<SdkTracerProvider> {
    validate_sample_rate(config.sample_rate)?;

    let exporter = SpanExporter::builder()
        .with_tonic()
        .build()
        .map_err(|e| OotelError::exporter("otlpgrpc span", e))?;

    Ok(tracer_provider_with_exporter(config, exporter))
}

/// Assemble the provider around any span exporter.
///
/// Does not validate `sample_rate`; the ratio sampler clamps it.
pub fn tracer_provider_with_exporter<E>(config: &TraceConfig, exporter: E) -> SdkTracerProvider
where
    E: sdktrace::SpanExporter + 'static,
{
    debug!(
        service = %config.service_name,
        version = %config.service_version,
        sample_rate = config.sample_rate,
        "building tracer provider"
    );

    SdkTracerProvider::builder()
        .with_span_processor(BatchSpanProcessor::builder(exporter).build())
        .with_sampler(sampler(config.sample_rate))
        .with_resource(resource(config))
        .build()
}

/// Parent-based sampling with a ratio decision for root spans
pub fn sampler(sample_rate: f64) -> Sampler {
    Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(sample_rate)))
}

/// SDK default resource (sdk/telemetry attributes, OTEL_RESOURCE_ATTRIBUTES)
/// merged with the configured service identity
pub fn resource(config: &TraceConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new(SERVICE_VERSION, config.service_version.clone()))
        .build()
}

fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if (0.0..=1.0).contains(&sample_rate) {
        Ok(())
    } else {
        Err(OotelError::InvalidSampleRate(sample_rate))
    }
}
