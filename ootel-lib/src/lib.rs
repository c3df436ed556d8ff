#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod shutdown;
pub mod telemetry;

pub use client::{Client, ClientBuilder, Telemetry};
pub use config::{
    load_from_path, parse_config, Config, ExporterKind, LoggingConfig, MetricConfig, TraceConfig,
    EXPORTER_TYPE_OTLP_GRPC, EXPORTER_TYPE_OTLP_HTTP, EXPORTER_TYPE_PROMETHEUS,
};
pub use error::{OotelError, Result};
pub use shutdown::{Shutdown, ShutdownError, ShutdownFunc};
pub use telemetry::{init_logging, LoggingHandle, ServerHandle, ServerStatus};
