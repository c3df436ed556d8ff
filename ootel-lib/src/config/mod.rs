mod loader;
mod types;

pub use loader::{load_from_path, parse_config};
pub use types::{
    Config, ExporterKind, LoggingConfig, MetricConfig, TraceConfig, EXPORTER_TYPE_OTLP_GRPC,
    EXPORTER_TYPE_OTLP_HTTP, EXPORTER_TYPE_PROMETHEUS,
};
