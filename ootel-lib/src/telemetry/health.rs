use http::header::CONTENT_TYPE;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::Response;
use hyper::StatusCode;
use serde::Serialize;
use tracing::warn;

use crate::error::{OotelError, Result};

type RespBody = BoxBody<Bytes, hyper::Error>;

/// Liveness payload served on `/healthcheck`
#[derive(Debug, Serialize, PartialEq)]
pub struct Health {
    pub healthy: bool,
    pub hostname: String,
}

/// Health check response - 200 with host identity, 500 if the hostname can't be resolved
pub fn health_check_response() -> Response<RespBody> {
    health_response_for(resolve_hostname())
}

fn resolve_hostname() -> Result<String> {
    let name = hostname::get()?;
    name.into_string()
        .map_err(|raw| OotelError::Http(format!("hostname is not valid UTF-8: {raw:?}")))
}

pub(crate) fn health_response_for(hostname: Result<String>) -> Response<RespBody> {
    let built = hostname.and_then(|hostname| -> Result<Response<RespBody>> {
        let body_bytes = serde_json::to_vec(&Health { healthy: true, hostname }).map_err(|e| {
            OotelError::Http(format!("Failed to serialize health response: {e}"))
        })?;

        let body = Full::new(Bytes::from(body_bytes))
            .map_err(|never| match never {})
            .boxed();

        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .map_err(|e| OotelError::Http(format!("Failed to build health response: {e}")))
    });

    match built {
        Ok(resp) => resp,
        Err(e) => {
            warn!(error = %e, "health check failed");
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub(crate) fn empty_response(status: StatusCode) -> Response<RespBody> {
    let body = Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed();
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    resp
}
