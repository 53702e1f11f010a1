//! Error types for the HTTP client.
//!
//! # Design
//! Transport failures carry only the transport's stringified reason; there is
//! no structured error code. A failed synchronous call yields no `Response`
//! at all. Streaming failures that happen after the handle is returned never
//! surface here; they reach the subscriber as `AsyncError` + `AsyncEnd`.

use std::io;

use thiserror::Error;

/// Failure reported by a `Transport` (connection refused, DNS, timeout, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct TransportError {
    reason: String,
}

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Errors returned by `Client` and the request pipeline.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The transport could not complete the request.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The transport answered in the wrong mode (buffered vs streaming).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The event transformer thread could not be started.
    #[error("failed to start event transformer: {0}")]
    Worker(#[source] io::Error),

    /// A `ClientConfig` document could not be parsed.
    #[error("invalid client config: {0}")]
    Config(#[from] serde_json::Error),

    /// Query parameters could not be form-encoded.
    #[error("query encoding failed: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),
}

impl HttpError {
    /// The message a caller would show for this failure.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
