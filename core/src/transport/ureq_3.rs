use std::future::Future;

use super::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::error::TransportError;

/// Blocking transport backed by `ureq`, run on tokio's blocking pool.
///
/// A blocking call cannot be interrupted, so this transport reports
/// `aborts_on_drop() == false`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        // Status codes are data for the client to classify, not errors.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send + 'static {
        let agent = self.agent.clone();
        async move {
            tokio::task::spawn_blocking(move || execute(&agent, request))
                .await
                .map_err(|err| TransportError::with_source("blocking call failed", err))
                .and_then(|result| result)
        }
    }

    fn aborts_on_drop(&self) -> bool {
        false
    }
}

fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    let url = request.url.as_str();
    let headers = request
        .headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_bytes()));

    let result = match (request.method, request.body.is_empty()) {
        (HttpMethod::Get, _) => {
            let builder = headers.fold(agent.get(url), |b, (n, v)| b.header(n, v));
            builder.call()
        }
        (HttpMethod::Delete, _) => {
            let builder = headers.fold(agent.delete(url), |b, (n, v)| b.header(n, v));
            builder.call()
        }
        (HttpMethod::Post, true) => {
            let builder = headers.fold(agent.post(url), |b, (n, v)| b.header(n, v));
            builder.send_empty()
        }
        (HttpMethod::Post, false) => {
            let builder = headers.fold(agent.post(url), |b, (n, v)| b.header(n, v));
            builder.send(&request.body[..])
        }
        (HttpMethod::Put, true) => {
            let builder = headers.fold(agent.put(url), |b, (n, v)| b.header(n, v));
            builder.send_empty()
        }
        (HttpMethod::Put, false) => {
            let builder = headers.fold(agent.put(url), |b, (n, v)| b.header(n, v));
            builder.send(&request.body[..])
        }
    };

    let mut response =
        result.map_err(|err| TransportError::with_source("request failed", err))?;
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(|err| TransportError::with_source("failed to read response body", err))?;
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
