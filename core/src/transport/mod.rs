//! Transport types and the collaborator trait that performs network I/O.
//!
//! # Design
//! [`HttpRequest`] and [`HttpResponse`] describe an exchange as plain data.
//! The client builds the former and parses the latter; a [`Transport`] moves
//! bytes between them. Keeping the transport behind a trait lets the executor
//! race timeouts and cancellation uniformly, whether or not the transport can
//! actually abort an in-flight call.

mod reqwest_0_12;
mod ureq_3;

use std::fmt;
use std::future::Future;

use http::HeaderMap;
use url::Url;

use crate::error::TransportError;

pub use reqwest_0_12::ReqwestTransport;
pub use ureq_3::UreqTransport;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Delete => http::Method::DELETE,
        }
    }
}

/// An encoded request, ready for the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    /// Empty when the request carries no body.
    pub body: Vec<u8>,
}

/// A raw response as delivered by the transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// Performs the actual network exchange.
pub trait Transport: Send + Sync + 'static {
    /// Send `request` and resolve with the raw response.
    ///
    /// Failing to connect or to complete the exchange is a [`TransportError`];
    /// any status code, including 4xx and 5xx, is a successful exchange.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send + 'static;

    /// Whether dropping the future returned by [`send`](Self::send) stops the
    /// underlying call.
    ///
    /// When `false`, a request that settles through a timeout or a cancel
    /// leaves the call running in the background and discards its result.
    fn aborts_on_drop(&self) -> bool {
        true
    }
}
