//! Promise-style HTTP client with cooperative cancellation.
//!
//! # Overview
//! `get`, `put`, `post` and `delete` resolve to the decoded response body or
//! fail with a classified [`Error`]. Request bodies are encoded by shape
//! (text, JSON, multi-part form data, form controls) and responses decoded by
//! content type. Any request can carry a timeout and a [`CancelToken`].
//!
//! # Design
//! - [`CancelToken`] is independent of any request; a request treats it as
//!   one of three racing completion sources next to the response and the
//!   timer, so cancellation works whether or not the transport can abort.
//! - [`Client::build`] and [`Client::parse`] are pure; only
//!   [`Client::send`] touches the [`Transport`].
//! - The free functions share one lazily created, immutable default client.

pub mod body;
pub mod cancel;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod form;
pub mod multipart;
pub mod request;
pub mod transport;

use std::sync::OnceLock;

pub use body::Body;
pub use cancel::{CancelReason, CancelToken, Subscription};
pub use client::{Client, Response};
pub use config::ClientConfig;
pub use error::{Error, TransportError};
pub use form::{Blob, ControlKind, Form, FormControl, FormData, FormValue};
pub use request::{Request, RequestOptions};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport, UreqTransport};

/// True exactly for errors caused by a cancel token.
pub fn is_cancel(error: &Error) -> bool {
    error.is_cancel()
}

fn default_client() -> &'static Client {
    static DEFAULT: OnceLock<Client> = OnceLock::new();
    DEFAULT.get_or_init(Client::from_env)
}

pub async fn get(url: &str, options: RequestOptions) -> Result<serde_json::Value, Error> {
    default_client().get(url, options).await
}

pub async fn put(
    url: &str,
    body: impl Into<Body>,
    options: RequestOptions,
) -> Result<serde_json::Value, Error> {
    default_client().put(url, body, options).await
}

pub async fn post(
    url: &str,
    body: impl Into<Body>,
    options: RequestOptions,
) -> Result<serde_json::Value, Error> {
    default_client().post(url, body, options).await
}

pub async fn delete(url: &str, options: RequestOptions) -> Result<serde_json::Value, Error> {
    default_client().delete(url, options).await
}
