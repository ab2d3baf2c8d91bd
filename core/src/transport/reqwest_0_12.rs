use std::future::Future;

use super::{HttpRequest, HttpResponse, Transport};
use crate::error::TransportError;

/// Async transport backed by `reqwest`. Dropping an in-flight call closes it.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send + 'static {
        let client = self.client.clone();
        async move {
            let mut builder = client
                .request(request.method.into(), request.url)
                .headers(request.headers);
            if !request.body.is_empty() {
                builder = builder.body(request.body);
            }
            let response = builder.send().await.map_err(into_transport_error)?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(into_transport_error)?;
            Ok::<_, TransportError>(HttpResponse {
                status,
                headers,
                body: body.to_vec(),
            })
        }
    }
}

fn into_transport_error(err: reqwest::Error) -> TransportError {
    let message = if err.is_connect() {
        "connection failed"
    } else if err.is_timeout() {
        "transport timed out"
    } else if err.is_body() || err.is_decode() {
        "failed to read response body"
    } else {
        "request failed"
    };
    TransportError::with_source(message, err)
}
