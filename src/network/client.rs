//! HTTP transport - the seam between the executor and the wire

use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::error::TransportError;
use crate::models::{Header, HttpMethod};

/// A fully built request, ready for the wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<Header>,
    pub body: Option<String>,
}

/// What came back, whatever the status code
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

pub trait HttpTransport: Send + Sync {
    fn send(&self, request: WireRequest) -> BoxFuture<'_, Result<WireResponse, TransportError>>;
}

/// Transport backed by a shared reqwest client
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        ReqwestTransport {
            client: create_client(timeout),
        }
    }

    async fn dispatch(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let method = match request.method {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::PATCH => reqwest::Method::PATCH,
        };

        let mut req_builder = self.client.request(method, &request.url);
        for header in &request.headers {
            req_builder = req_builder.header(&header.key, &header.value);
        }
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let resp = req_builder.send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::MalformedResponse(format!("error reading body: {}", e)))?;
        Ok(WireResponse { status, body })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: WireRequest) -> BoxFuture<'_, Result<WireResponse, TransportError>> {
        Box::pin(self.dispatch(request))
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::ConnectionFailed(e.to_string())
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else if e.is_request() {
        TransportError::ConnectionFailed(format!("request failed: {}", e))
    } else {
        TransportError::MalformedResponse(e.to_string())
    }
}

/// Create an HTTP client with the given per-request timeout
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
