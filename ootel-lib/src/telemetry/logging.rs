use std::fmt;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{reload, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{OotelError, Result};

type OtelSlot = Option<Box<dyn Layer<Registry> + Send + Sync>>;

/// Handle to the installed subscriber's OpenTelemetry bridge
#[derive(Clone)]
pub struct LoggingHandle {
    otel: reload::Handle<OtelSlot, Registry>,
}

impl fmt::Debug for LoggingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attached = self.otel.with_current(Option::is_some).unwrap_or(false);
        f.debug_struct("LoggingHandle").field("tracer_attached", &attached).finish()
    }
}

impl LoggingHandle {
    /// Start exporting `tracing` spans through `provider`.
    ///
    /// Lets logging come up before telemetry so bring-up events are not lost.
    /// Attaching again replaces the previous provider.
    pub fn attach_tracer(&self, provider: &SdkTracerProvider) -> Result<()> {
        self.otel
            .reload(Some(otel_layer(provider)))
            .map_err(|e| OotelError::Logging(format!("Failed to attach tracer: {e}")))
    }
}

fn otel_layer(provider: &SdkTracerProvider) -> Box<dyn Layer<Registry> + Send + Sync> {
    Box::new(tracing_opentelemetry::layer().with_tracer(provider.tracer(env!("CARGO_PKG_NAME"))))
}

/// Install the global `tracing` subscriber.
///
/// RUST_LOG, when set, overrides both `level` and `otel_log_level`. With a
/// tracer provider, `tracing` spans are also exported as OpenTelemetry spans;
/// one can be attached later through the returned handle.
pub fn init_logging(
    config: &LoggingConfig,
    tracer_provider: Option<&SdkTracerProvider>,
) -> Result<LoggingHandle> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},opentelemetry={}", config.level, config.otel_log_level))
    });
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(config.show_target);
    let (otel, otel_handle) = reload::Layer::new(tracer_provider.map(otel_layer));

    let subscriber = Registry::default()
        .with(otel)
        .with(env_filter)
        .with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| OotelError::Logging(format!("Failed to set global tracing subscriber: {e}")))?;

    Ok(LoggingHandle { otel: otel_handle })
}
