//! Subsystem builders and the health/metrics HTTP surface.

pub mod health;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod trace;

pub use health::{health_check_response, Health};
pub use logging::{init_logging, LoggingHandle};
pub use metrics::{meter_provider, MeterPipeline};
pub use server::{
    spawn_metrics_server, ServerHandle, ServerStatus, HEALTHCHECK_PATH, METRICS_PATH,
};
pub use trace::{install_propagator, tracer_provider, tracer_provider_with_exporter};
