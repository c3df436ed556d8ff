use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::OotelError;

pub const EXPORTER_TYPE_PROMETHEUS: &str = "prometheus";
pub const EXPORTER_TYPE_OTLP_GRPC: &str = "otlpgrpc";
pub const EXPORTER_TYPE_OTLP_HTTP: &str = "otlphttp";

/// Top-level configuration file layout
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Tracing section; absent means tracing is never set up
    #[serde(default)]
    pub trace: Option<TraceConfig>,
    /// Metrics section; absent means no meter provider and no server
    #[serde(default)]
    pub metric: Option<MetricConfig>,
}

/// Distributed tracing configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TraceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ratio of root spans to sample, from 0.0 (none) to 1.0 (all)
    /// Child spans follow their parent's decision
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
}

impl TraceConfig {
    pub fn new(
        enabled: bool,
        sample_rate: f64,
        service_name: impl Into<String>,
        service_version: impl Into<String>,
    ) -> Self {
        Self {
            enabled,
            sample_rate,
            service_name: service_name.into(),
            service_version: service_version.into(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MetricConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// One of "prometheus", "otlpgrpc", "otlphttp"
    /// Kept as a string so unknown values surface at init with the offending name
    #[serde(default = "default_exporter_type")]
    pub exporter_type: String,
    /// Port for the health/scrape server, bound on all interfaces
    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

impl MetricConfig {
    pub fn new(enabled: bool, exporter_type: impl Into<String>, server_port: u16) -> Self {
        Self { enabled, exporter_type: exporter_type.into(), server_port }
    }

    pub fn exporter_kind(&self) -> Result<ExporterKind, OotelError> {
        self.exporter_type.parse()
    }
}

/// Logging configuration
/// Controls application-level structured logging (stdout/stderr)
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    /// Can be overridden at runtime via RUST_LOG environment variable
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Show module path (target) in log messages
    #[serde(default)]
    pub show_target: bool,
    /// Verbosity of the OpenTelemetry SDK's own logs, separate from `level`
    #[serde(default = "default_otel_log_level")]
    pub otel_log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            show_target: false,
            otel_log_level: default_otel_log_level(),
        }
    }
}

/// Metric exporter flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExporterKind {
    /// Pull-based; scraped over `/metrics`
    Prometheus,
    /// OTLP push over gRPC
    OtlpGrpc,
    /// OTLP push over HTTP/protobuf
    OtlpHttp,
}

impl ExporterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExporterKind::Prometheus => EXPORTER_TYPE_PROMETHEUS,
            ExporterKind::OtlpGrpc => EXPORTER_TYPE_OTLP_GRPC,
            ExporterKind::OtlpHttp => EXPORTER_TYPE_OTLP_HTTP,
        }
    }

    pub fn is_pull_based(&self) -> bool {
        matches!(self, ExporterKind::Prometheus)
    }
}

impl FromStr for ExporterKind {
    type Err = OotelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            EXPORTER_TYPE_PROMETHEUS => Ok(ExporterKind::Prometheus),
            EXPORTER_TYPE_OTLP_GRPC => Ok(ExporterKind::OtlpGrpc),
            EXPORTER_TYPE_OTLP_HTTP => Ok(ExporterKind::OtlpHttp),
            other => Err(OotelError::UnsupportedExporter(other.to_string())),
        }
    }
}

impl fmt::Display for ExporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

fn default_sample_rate() -> f64 {
    1.0
}

fn default_service_version() -> String {
    "0.0.0".to_string()
}

fn default_exporter_type() -> String {
    EXPORTER_TYPE_PROMETHEUS.to_string()
}

fn default_server_port() -> u16 {
    8081
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_otel_log_level() -> String {
    "warn".to_string()
}
