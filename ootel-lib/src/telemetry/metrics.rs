use opentelemetry_otlp::MetricExporter;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use prometheus::Registry;
use tracing::debug;

use crate::config::ExporterKind;
use crate::error::{OotelError, Result};

/// A meter provider plus, for the pull-based kind, the registry to scrape
pub struct MeterPipeline {
    pub provider: SdkMeterProvider,
    pub registry: Option<Registry>,
}

/// Build the meter provider for one exporter kind.
///
/// Prometheus reads straight from the exporter on scrape; the OTLP kinds push
/// on a fixed interval through a periodic reader.
pub fn meter_provider(kind: ExporterKind) -> Result<MeterPipeline> {
    debug!(exporter = %kind, "building meter provider");

    let pipeline = match kind {
        ExporterKind::Prometheus => {
            let registry = Registry::new();
            let exporter = opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
                .map_err(|e| OotelError::exporter("prometheus metric", e))?;

            MeterPipeline {
                provider: SdkMeterProvider::builder().with_reader(exporter).build(),
                registry: Some(registry),
            }
        }
        ExporterKind::OtlpGrpc => {
            let exporter = MetricExporter::builder()
                .with_tonic()
                .build()
                .map_err(|e| OotelError::exporter("otlpgrpc metric", e))?;

            MeterPipeline {
                provider: SdkMeterProvider::builder()
                    .with_reader(PeriodicReader::builder(exporter).build())
                    .build(),
                registry: None,
            }
        }
        ExporterKind::OtlpHttp => {
            let exporter = MetricExporter::builder()
                .with_http()
                .build()
                .map_err(|e| OotelError::exporter("otlphttp metric", e))?;

            MeterPipeline {
                provider: SdkMeterProvider::builder()
                    .with_reader(PeriodicReader::builder(exporter).build())
                    .build(),
                registry: None,
            }
        }
    };

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn prometheus_pipeline_exposes_registry(
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pipeline = meter_provider(ExporterKind::Prometheus)?;
        let registry = pipeline.registry.ok_or("prometheus pipeline without registry")?;

        let counter = pipeline.provider.meter("unit").u64_counter("jobs_done").build();
        counter.add(3, &[]);

        let mut buf = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buf)?;
        let text = String::from_utf8(buf)?;
        assert!(text.contains("jobs_done"), "missing counter in:\n{text}");
        Ok(())
    }

    #[tokio::test]
    async fn push_pipelines_have_nothing_to_scrape() {
        for kind in [ExporterKind::OtlpGrpc, ExporterKind::OtlpHttp] {
            match meter_provider(kind) {
                Ok(pipeline) => assert!(pipeline.registry.is_none(), "{kind} exposed a registry"),
                Err(e) => panic!("{kind} pipeline failed: {e}"),
            }
        }
    }
}
