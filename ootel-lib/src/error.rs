use thiserror::Error;

/// Boxed error used where the underlying SDK error type is not worth naming.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while configuring or initializing telemetry
#[derive(Error, Debug)]
pub enum OotelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("failed to create trace provider: {0}")]
    TraceProvider(#[source] Box<OotelError>),

    #[error("failed to create meter provider: {0}")]
    MeterProvider(#[source] Box<OotelError>),

    #[error("failed to create {kind} exporter: {source}")]
    Exporter {
        kind: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("unsupported metric exporter type: {0}")]
    UnsupportedExporter(String),

    #[error("invalid sample rate {0}: must be within [0.0, 1.0]")]
    InvalidSampleRate(f64),

    #[error("telemetry client already initialized")]
    AlreadyInitialized,

    #[error("Logging error: {0}")]
    Logging(String),
}

impl OotelError {
    pub(crate) fn exporter<E>(kind: &'static str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        OotelError::Exporter { kind, source: Box::new(err) }
    }
}

pub type Result<T> = std::result::Result<T, OotelError>;
