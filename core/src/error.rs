//! Error types for the ajx client.
//!
//! # Design
//! Every failed request settles with exactly one [`Error`] variant. The
//! `Display` output of each variant is the human-readable message callers
//! match on (`"timeout"`, `"network error"`, `"404 Not Found"`, ...).
//! Cancellation is recognized by variant, never by message, so a status or
//! timeout error carrying an identical string is not mistaken for a cancel.

use crate::cancel::CancelReason;

/// Errors returned by the request executor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport could not connect or complete the exchange.
    #[error("network error")]
    Network(#[source] TransportError),

    /// The configured deadline elapsed before a response arrived.
    #[error("timeout")]
    Timeout,

    /// The request's cancel token fired before a response arrived.
    #[error("{0}")]
    Cancel(CancelReason),

    /// The server answered with a status outside `200..=299`.
    #[error("{status} {status_text}")]
    Status {
        status: u16,
        status_text: String,
        /// The decoded response body.
        response: serde_json::Value,
    },

    /// The response claimed to be JSON but did not parse.
    #[error("parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// The request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

impl Error {
    /// Classify a response whose status fell outside the success range.
    pub fn from_status(status: u16, response: serde_json::Value) -> Self {
        let status_text = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("")
            .to_string();
        Error::Status {
            status,
            status_text,
            response,
        }
    }

    /// True exactly for errors produced by a cancel token.
    pub fn is_cancel(&self) -> bool {
        matches!(self, Error::Cancel(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded body of a status error.
    pub fn response(&self) -> Option<&serde_json::Value> {
        match self {
            Error::Status { response, .. } => Some(response),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Network(err)
    }
}

/// Failure reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}
