//! Orchestrates subsystem bring-up: tracing first, then metrics and the
//! background health/metrics server, and hands back one composed shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use opentelemetry::global;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::info;

use crate::config::{Config, MetricConfig, TraceConfig};
use crate::error::{OotelError, Result};
use crate::shutdown::{ShutdownError, ShutdownFunc};
use crate::telemetry::{self, ServerHandle};

const TRACE_SUBSYSTEM: &str = "trace";
const METRIC_SUBSYSTEM: &str = "metric";

/// Telemetry client. Configure through [`Client::builder`] or
/// [`Client::from_config`], then call [`Client::init`] once.
#[derive(Debug, Default)]
pub struct Client {
    trace_config: Option<TraceConfig>,
    metric_config: Option<MetricConfig>,
    initialized: AtomicBool,
}

/// Builder for [`Client`]. Setting the same section twice keeps the last value.
#[derive(Debug, Default, Clone)]
pub struct ClientBuilder {
    trace_config: Option<TraceConfig>,
    metric_config: Option<MetricConfig>,
}

impl ClientBuilder {
    #[must_use]
    pub fn with_trace_config(mut self, config: TraceConfig) -> Self {
        self.trace_config = Some(config);
        self
    }

    #[must_use]
    pub fn with_metric_config(mut self, config: MetricConfig) -> Self {
        self.metric_config = Some(config);
        self
    }

    pub fn build(self) -> Client {
        Client {
            trace_config: self.trace_config,
            metric_config: self.metric_config,
            initialized: AtomicBool::new(false),
        }
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn from_config(config: &Config) -> Self {
        ClientBuilder {
            trace_config: config.trace.clone(),
            metric_config: config.metric.clone(),
        }
        .build()
    }

    pub fn trace_config(&self) -> Option<&TraceConfig> {
        self.trace_config.as_ref()
    }

    pub fn metric_config(&self) -> Option<&MetricConfig> {
        self.metric_config.as_ref()
    }

    /// Bring up every enabled subsystem and install the global providers.
    ///
    /// Fails fast on the first construction error; a subsystem installed
    /// before the failure stays installed. The metrics server is spawned on
    /// the current Tokio runtime and its failures only show up on
    /// [`Telemetry::server`]. Calling `init` again after a success returns
    /// [`OotelError::AlreadyInitialized`].
    pub async fn init(&self) -> Result<Telemetry> {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(OotelError::AlreadyInitialized);
        }

        let result = self.bring_up();
        if result.is_err() {
            self.initialized.store(false, Ordering::Release);
        }
        result
    }

    fn bring_up(&self) -> Result<Telemetry> {
        let mut handle = Telemetry::default();

        if let Some(tc) = self.trace_config.as_ref().filter(|tc| tc.enabled) {
            telemetry::install_propagator();

            let provider = telemetry::tracer_provider(tc)
                .map_err(|e| OotelError::TraceProvider(Box::new(e)))?;
            global::set_tracer_provider(provider.clone());
            handle.shutdown.register(TRACE_SUBSYSTEM, Box::new(provider.clone()));
            handle.tracer_provider = Some(provider);

            info!(
                service = %tc.service_name,
                version = %tc.service_version,
                sample_rate = tc.sample_rate,
                "tracer provider installed"
            );
        }

        if let Some(mc) = self.metric_config.as_ref().filter(|mc| mc.enabled) {
            let kind = mc
                .exporter_kind()
                .map_err(|e| OotelError::MeterProvider(Box::new(e)))?;
            let pipeline = telemetry::meter_provider(kind)
                .map_err(|e| OotelError::MeterProvider(Box::new(e)))?;
            let provider = pipeline.provider;
            handle.shutdown.register(METRIC_SUBSYSTEM, Box::new(provider.clone()));
            global::set_meter_provider(provider.clone());
            handle.meter_provider = Some(provider);

            info!(exporter = %kind, port = mc.server_port, "meter provider installed");

            let scrape = pipeline.registry.filter(|_| kind.is_pull_based());
            handle.server = Some(telemetry::spawn_metrics_server(mc.server_port, scrape));
        }

        Ok(handle)
    }
}

/// Result of [`Client::init`]: the installed providers, the metrics server
/// handle, and the composed shutdown.
#[derive(Debug, Default)]
pub struct Telemetry {
    shutdown: ShutdownFunc,
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    server: Option<ServerHandle>,
}

impl Telemetry {
    pub fn tracer_provider(&self) -> Option<&SdkTracerProvider> {
        self.tracer_provider.as_ref()
    }

    pub fn meter_provider(&self) -> Option<&SdkMeterProvider> {
        self.meter_provider.as_ref()
    }

    /// Present only when metrics are enabled
    pub fn server(&self) -> Option<&ServerHandle> {
        self.server.as_ref()
    }

    /// Flush and shut down every initialized subsystem.
    ///
    /// All subsystems are attempted; every failure is reported. The metrics
    /// server keeps running.
    pub fn shutdown(self, timeout: Option<Duration>) -> std::result::Result<(), ShutdownError> {
        self.shutdown.shutdown(timeout)
    }

    /// Detach the composed shutdown from the rest of the handle
    pub fn into_shutdown(self) -> ShutdownFunc {
        self.shutdown
    }
}
