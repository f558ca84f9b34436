use thiserror::Error;
use tracing::{info, warn};

/// Top-level error type for the `isapi-client` crate.
///
/// Only transport-level failures surface here. HTTP error statuses
/// (401, 404, 500, ...) are returned as ordinary responses -- inspecting
/// the status code is the caller's concern.
#[derive(Debug, Error)]
pub enum Error {
    /// The request exceeded its deadline.
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Connection-level failure (refused, reset, DNS, TLS handshake).
    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The device sent a `WWW-Authenticate` challenge that could not be parsed.
    #[error("invalid digest challenge: {0}")]
    Challenge(#[from] digest_auth::Error),

    /// The endpoint path could not be resolved against the base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The computed `Authorization` value is not a valid HTTP header.
    #[error("invalid authorization header: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    /// TLS configuration or client construction failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The client was used after `close()`.
    #[error("client is closed")]
    Closed,
}

impl Error {
    /// Classify a transport failure and log it once at the point of occurrence.
    pub(crate) fn transport(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            warn!("request timed out, endpoint: {endpoint}");
            Self::Timeout(err)
        } else if err.is_connect() {
            warn!("connection failed, endpoint: {endpoint}");
            Self::Connect(err)
        } else {
            info!("request failed, endpoint: {endpoint}: {err}");
            Self::Transport(err)
        }
    }

    /// Returns `true` if the request exceeded its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns `true` if the failure happened while connecting.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}
