//! Request execution.
//!
//! # Design
//! A request moves through three stages:
//! - [`Client::build`] turns a [`Request`] into an [`HttpRequest`]: URL
//!   validation, header merging, body encoding. Pure, no I/O.
//! - [`Client::send`] hands the encoded request to the [`Transport`] and
//!   races it against the optional timeout and cancel token. Whichever
//!   settles first wins; the losing timer and listener are dropped with the
//!   race, and the transport call is either dropped (aborted) or detached,
//!   depending on [`Transport::aborts_on_drop`].
//! - [`Client::parse`] decodes the response and classifies non-2xx statuses.
//!   Pure, no I/O.

use std::future::{pending, Future};
use std::pin::Pin;
use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::Value;
use url::Url;

use crate::body::{self, Body};
use crate::cancel::{CancelReason, CancelToken};
use crate::config::ClientConfig;
use crate::decode::decode;
use crate::error::{Error, TransportError};
use crate::request::{Request, RequestOptions};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// A decoded response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    /// `Null` for an empty body, parsed JSON for JSON types, text otherwise.
    pub body: Value,
}

/// Issues requests through a [`Transport`].
///
/// Holds no per-request state; any number of requests may be in flight on
/// one client at once.
#[derive(Clone)]
pub struct Client<T = ReqwestTransport> {
    transport: T,
    config: ClientConfig,
}

impl Client {
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::default())
    }

    /// A reqwest-backed client configured from the environment.
    pub fn from_env() -> Self {
        Self::new().with_config(ClientConfig::from_env())
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

enum Settled {
    Completed(Result<HttpResponse, TransportError>),
    TimedOut,
    Cancelled(CancelReason),
}

impl<T: Transport> Client<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<Value, Error> {
        self.body_of(Request::get(url).options(options)).await
    }

    pub async fn put(
        &self,
        url: &str,
        body: impl Into<Body>,
        options: RequestOptions,
    ) -> Result<Value, Error> {
        self.body_of(Request::put(url, body).options(options)).await
    }

    pub async fn post(
        &self,
        url: &str,
        body: impl Into<Body>,
        options: RequestOptions,
    ) -> Result<Value, Error> {
        self.body_of(Request::post(url, body).options(options)).await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<Value, Error> {
        self.body_of(Request::delete(url).options(options)).await
    }

    async fn body_of(&self, request: Request) -> Result<Value, Error> {
        self.send(request).await.map(|response| response.body)
    }

    /// Execute `request` and return the decoded response.
    pub async fn send(&self, request: Request) -> Result<Response, Error> {
        let method = request.method;
        let result = self.execute(request).await;
        match &result {
            Ok(response) => tracing::debug!(%method, status = response.status, "request settled"),
            Err(err) => tracing::debug!(%method, error = %err, "request failed"),
        }
        result
    }

    async fn execute(&self, request: Request) -> Result<Response, Error> {
        let token = request.options.cancel_token.clone();
        if let Some(reason) = token.as_ref().and_then(CancelToken::reason) {
            return Err(Error::Cancel(reason));
        }
        let timeout = request.options.timeout.or_else(|| self.config.timeout());
        // A zero deadline has already passed; the timer would only fire on
        // the next tick, after a ready exchange.
        if timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(Error::Timeout);
        }
        let http_request = self.build(&request)?;
        tracing::debug!(
            method = %http_request.method,
            url = %http_request.url,
            ?timeout,
            "dispatching request"
        );

        let cancelled = token.as_ref().map(CancelToken::cancelled);
        let mut exchange = Box::pin(self.transport.send(http_request));
        let settled = tokio::select! {
            biased;
            reason = wait_cancelled(cancelled) => Settled::Cancelled(reason),
            () = wait_deadline(timeout) => Settled::TimedOut,
            result = &mut exchange => Settled::Completed(result),
        };

        let response = match settled {
            Settled::Completed(result) => result?,
            Settled::TimedOut => {
                self.discard(exchange);
                return Err(Error::Timeout);
            }
            Settled::Cancelled(reason) => {
                self.discard(exchange);
                return Err(Error::Cancel(reason));
            }
        };
        self.parse(response)
    }

    /// Drop an exchange that lost the race, or let it finish unobserved if
    /// the transport cannot abort.
    fn discard<F>(&self, exchange: Pin<Box<F>>)
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.transport.aborts_on_drop() {
            return;
        }
        tracing::trace!("detaching exchange that cannot be aborted");
        tokio::spawn(async move {
            let _ = exchange.await;
        });
    }

    /// Validate and encode `request` into its wire form.
    pub fn build(&self, request: &Request) -> Result<HttpRequest, Error> {
        let url = parse_url(&request.url)?;

        let mut headers = HeaderMap::new();
        if let Some(user_agent) = &self.config.user_agent {
            headers.insert(USER_AGENT, header_value(USER_AGENT.as_str(), user_agent)?);
        }
        for (name, value) in &self.config.headers {
            headers.insert(header_name(name)?, header_value(name, value)?);
        }
        let overrides = request
            .options
            .headers
            .iter()
            .map(|(name, value)| Ok((header_name(name)?, header_value(name, value)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        for (name, _) in &overrides {
            headers.remove(name);
        }
        for (name, value) in overrides {
            headers.append(name, value);
        }

        let body = body::encode(&request.body, &mut headers)?;
        Ok(HttpRequest {
            method: request.method,
            url,
            headers,
            body,
        })
    }

    /// Decode `response`, failing with [`Error::Status`] outside `200..=299`.
    pub fn parse(&self, response: HttpResponse) -> Result<Response, Error> {
        let decoded = decode(response.content_type(), &response.body);
        if !(200..300).contains(&response.status) {
            // A malformed error body still reports the status, with the raw text.
            let body = decoded.unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&response.body).into_owned())
            });
            return Err(Error::from_status(response.status, body));
        }
        Ok(Response {
            status: response.status,
            headers: response.headers,
            body: decoded?,
        })
    }
}

async fn wait_cancelled(cancelled: Option<impl Future<Output = CancelReason>>) -> CancelReason {
    match cancelled {
        Some(cancelled) => cancelled.await,
        None => pending().await,
    }
}

async fn wait_deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => pending().await,
    }
}

fn parse_url(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw).map_err(|err| Error::InvalidUrl(format!("{raw}: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidUrl(format!("{raw}: unsupported scheme `{other}`"))),
    }
}

fn header_name(name: &str) -> Result<HeaderName, Error> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| Error::InvalidHeader(name.to_string()))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(format!("{name}: {value}")))
}
