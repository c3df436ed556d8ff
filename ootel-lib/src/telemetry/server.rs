use http::header::CONTENT_TYPE;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{OotelError, Result};
use crate::telemetry::health::empty_response;
use crate::telemetry::health_check_response;

type RespBody = BoxBody<Bytes, hyper::Error>;

pub const HEALTHCHECK_PATH: &str = "/healthcheck";
pub const METRICS_PATH: &str = "/metrics";

/// Lifecycle of the background metrics server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    /// Spawned but not yet bound
    Starting,
    Listening(SocketAddr),
    /// Bind or accept loop failed; the server is gone
    Failed(String),
}

/// Handle to a spawned metrics server.
///
/// Dropping the handle does not stop the server.
#[derive(Debug)]
pub struct ServerHandle {
    port: u16,
    status: watch::Receiver<ServerStatus>,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Current status without waiting
    pub fn status(&self) -> ServerStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to status transitions, e.g. to react to a late failure
    pub fn subscribe(&self) -> watch::Receiver<ServerStatus> {
        self.status.clone()
    }

    /// Wait until the server is accepting connections.
    ///
    /// Resolves with the bound address, or with the bind failure.
    pub async fn ready(&self) -> Result<SocketAddr> {
        let mut rx = self.status.clone();
        let status = rx
            .wait_for(|status| !matches!(status, ServerStatus::Starting))
            .await
            .map_err(|_| OotelError::Http("metrics server task exited".to_string()))?
            .clone();

        match status {
            ServerStatus::Listening(addr) => Ok(addr),
            ServerStatus::Failed(reason) => Err(OotelError::Http(reason)),
            ServerStatus::Starting => {
                Err(OotelError::Http("metrics server never started".to_string()))
            }
        }
    }
}

/// Spawn the health/metrics server on `0.0.0.0:port`.
///
/// Returns immediately; `scrape` is served on `/metrics` only when given.
/// Failures are logged and published on the handle, never returned here.
pub fn spawn_metrics_server(port: u16, scrape: Option<Registry>) -> ServerHandle {
    let (status_tx, status_rx) = watch::channel(ServerStatus::Starting);

    tokio::spawn(async move {
        if let Err(e) = start_metrics_server(port, scrape, &status_tx).await {
            error!(port, error = %e, "metrics server failed");
            status_tx.send_replace(ServerStatus::Failed(format!("failed to start server: {e}")));
        }
    });

    ServerHandle { port, status: status_rx }
}

/// Serve `/healthcheck` (and `/metrics` for a pull registry) until the process exits
pub async fn start_metrics_server(
    port: u16,
    registry: Option<Registry>,
    status: &watch::Sender<ServerStatus>,
) -> Result<()> {
    let registry = registry.map(Arc::new);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, scrape = registry.is_some(), "Metrics server started");
    status.send_replace(ServerStatus::Listening(local_addr));

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok((stream, peer)) => (stream, peer),
            Err(e) => {
                warn!(error = %e, "Metrics server: accept error");
                continue;
            }
        };

        let registry = registry.clone();
        tokio::spawn(async move {
            let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                let registry = registry.clone();
                async move { Ok::<_, hyper::Error>(route(req.uri().path(), registry.as_deref())) }
            });

            let builder = ConnBuilder::new(TokioExecutor::new());
            if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                warn!(?peer, error = %e, "Metrics server: serve_connection error");
            }
        });
    }
}

fn route(path: &str, registry: Option<&Registry>) -> Response<RespBody> {
    match (path, registry) {
        (HEALTHCHECK_PATH, _) => health_check_response(),
        (METRICS_PATH, Some(registry)) => scrape_response(registry),
        _ => empty_response(StatusCode::NOT_FOUND),
    }
}

/// Text exposition of everything gathered from `registry`; 500 if encoding fails
fn scrape_response(registry: &Registry) -> Response<RespBody> {
    let encoder = TextEncoder::new();
    let mut text = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut text) {
        warn!(error = %e, "failed to render metrics");
        return empty_response(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let body = Full::new(Bytes::from(text))
        .map_err(|never| match never {})
        .boxed();
    let mut resp = Response::new(body);
    if let Ok(value) = encoder.format_type().parse::<http::HeaderValue>() {
        resp.headers_mut().insert(CONTENT_TYPE, value);
    }
    resp
}
