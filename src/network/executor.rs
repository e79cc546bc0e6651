//! Request executor - one definition plus one token in, one result out

use std::sync::Arc;
use std::time::Instant;

use crate::error::RequestBuildError;
use crate::models::{Header, RequestDefinition, RequestResult};
use crate::network::client::{HttpTransport, WireRequest};

const AUTHORIZATION: &str = "Authorization";

pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        RequestExecutor { transport }
    }

    /// Build the wire request for `definition`.
    ///
    /// The bearer token replaces any user-supplied `Authorization` header.
    /// Only body-bearing methods get a body, and an unparsable payload
    /// becomes no body at all.
    pub fn build(
        definition: &RequestDefinition,
        token: &str,
    ) -> Result<WireRequest, RequestBuildError> {
        let url = definition.effective_url();
        if url.is_empty() {
            return Err(RequestBuildError::MissingUrl);
        }

        let mut headers: Vec<Header> = definition
            .header_pairs()?
            .into_iter()
            .filter(|h| !h.key.eq_ignore_ascii_case(AUTHORIZATION))
            .collect();
        headers.push(Header::new(AUTHORIZATION, format!("Bearer {}", token)));

        let body = if definition.method.has_body() {
            match definition.parse_payload() {
                Ok(payload) => payload.map(|json| json.to_string()),
                Err(e) => {
                    tracing::warn!(error = %e, "Sending without body");
                    None
                }
            }
        } else {
            None
        };

        Ok(WireRequest {
            method: definition.method,
            url,
            headers,
            body,
        })
    }

    pub async fn execute(&self, definition: &RequestDefinition, token: &str) -> RequestResult {
        let request = match Self::build(definition, token) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Request aborted before dispatch");
                return RequestResult::aborted(&e);
            }
        };

        tracing::info!(method = request.method.as_str(), url = %request.url, "Executing request");
        let start = Instant::now();
        let outcome = self.transport.send(request).await;
        let elapsed = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                tracing::info!(status = response.status, elapsed_ms = elapsed, "Request completed");
                RequestResult::completed(response.status, elapsed, response.body)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Request failed");
                RequestResult::transport_failed(&e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::models::{HttpMethod, Outcome};
    use crate::network::client::WireResponse;
    use futures_util::future::BoxFuture;
    use std::sync::Mutex;

    /// Transport double that records every request it is handed
    pub(crate) struct RecordingTransport {
        pub requests: Mutex<Vec<WireRequest>>,
        pub reply: Result<WireResponse, TransportError>,
    }

    impl RecordingTransport {
        pub(crate) fn replying(status: u16, body: &str) -> Self {
            RecordingTransport {
                requests: Mutex::new(Vec::new()),
                reply: Ok(WireResponse {
                    status,
                    body: body.to_string(),
                }),
            }
        }

        pub(crate) fn failing(error: TransportError) -> Self {
            RecordingTransport {
                requests: Mutex::new(Vec::new()),
                reply: Err(error),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub(crate) fn last(&self) -> WireRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl HttpTransport for RecordingTransport {
        fn send(&self, request: WireRequest) -> BoxFuture<'_, Result<WireResponse, TransportError>> {
            self.requests.lock().unwrap().push(request);
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }
    }

    fn definition(method: HttpMethod, url: &str) -> RequestDefinition {
        RequestDefinition::new(method, url)
    }

    #[tokio::test]
    async fn test_invalid_headers_abort_without_dispatch() {
        let transport = Arc::new(RecordingTransport::replying(200, "{}"));
        let executor = RequestExecutor::new(transport.clone());
        let mut def = definition(HttpMethod::GET, "https://h/api/x");
        def.headers = String::from(r#"{"Accept": "#);

        let result = executor.execute(&def, "tok").await;

        assert_eq!(transport.calls(), 0);
        assert_eq!(result.outcome, Outcome::Aborted);
        assert_eq!(result.status_code, None);
        assert!(result.body.contains("invalid headers"));
    }

    #[tokio::test]
    async fn test_json_header_with_bad_name_aborts_without_dispatch() {
        let transport = Arc::new(RecordingTransport::replying(200, "{}"));
        let executor = RequestExecutor::new(transport.clone());
        let mut def = definition(HttpMethod::GET, "https://h/api/x");
        def.headers = String::from(r#"{"bad key": "v"}"#);

        let result = executor.execute(&def, "tok").await;

        assert_eq!(transport.calls(), 0);
        assert_eq!(result.outcome, Outcome::Aborted);
    }

    #[tokio::test]
    async fn test_unbuildable_request_is_aborted() {
        let transport = Arc::new(RecordingTransport::failing(TransportError::InvalidRequest(
            String::from("builder error"),
        )));
        let executor = RequestExecutor::new(transport);

        let result = executor
            .execute(&definition(HttpMethod::GET, "https://h/api/x"), "t")
            .await;

        assert_eq!(result.outcome, Outcome::Aborted);
        assert!(!result.outcome.dispatched());
        assert!(result.body.starts_with("Request not sent"));
    }

    #[tokio::test]
    async fn test_token_overrides_user_authorization() {
        let transport = Arc::new(RecordingTransport::replying(200, "ok"));
        let executor = RequestExecutor::new(transport.clone());
        let mut def = definition(HttpMethod::GET, "https://h/api/x");
        def.headers = String::from("authorization: Bearer stale\nAccept: application/json");

        executor.execute(&def, "fresh").await;

        let sent = transport.last();
        let auth: Vec<_> = sent
            .headers
            .iter()
            .filter(|h| h.key.eq_ignore_ascii_case("authorization"))
            .collect();
        assert_eq!(auth.len(), 1);
        assert_eq!(auth[0].value, "Bearer fresh");
        assert_eq!(sent.headers[0], Header::new("Accept", "application/json"));
    }

    #[tokio::test]
    async fn test_query_is_joined_onto_url() {
        let transport = Arc::new(RecordingTransport::replying(200, "ok"));
        let executor = RequestExecutor::new(transport.clone());
        let mut def = definition(HttpMethod::GET, "https://h/api/accounts?$select=name");
        def.query = String::from("$top=3");

        executor.execute(&def, "t").await;

        assert_eq!(transport.last().url, "https://h/api/accounts?$select=name&$top=3");
    }

    #[tokio::test]
    async fn test_payload_only_for_body_methods() {
        let transport = Arc::new(RecordingTransport::replying(201, ""));
        let executor = RequestExecutor::new(transport.clone());

        let mut post = definition(HttpMethod::POST, "https://h/api/accounts");
        post.payload = String::from("{ \"name\": \"Contoso\" }");
        executor.execute(&post, "t").await;
        assert_eq!(transport.last().body.as_deref(), Some(r#"{"name":"Contoso"}"#));

        let mut get = definition(HttpMethod::GET, "https://h/api/accounts");
        get.payload = post.payload.clone();
        executor.execute(&get, "t").await;
        assert_eq!(transport.last().body, None);
    }

    #[tokio::test]
    async fn test_invalid_payload_sends_empty_body() {
        let transport = Arc::new(RecordingTransport::replying(400, "bad"));
        let executor = RequestExecutor::new(transport.clone());
        let mut def = definition(HttpMethod::PUT, "https://h/api/x");
        def.payload = String::from("{oops");

        let result = executor.execute(&def, "t").await;

        assert_eq!(transport.calls(), 1);
        assert_eq!(transport.last().body, None);
        assert_eq!(result.status_code, Some(400));
        assert_eq!(result.body, "bad");
    }

    #[tokio::test]
    async fn test_transport_failure_has_no_status_or_timing() {
        let transport = Arc::new(RecordingTransport::failing(TransportError::ConnectionFailed(
            String::from("connection refused"),
        )));
        let executor = RequestExecutor::new(transport);

        let result = executor
            .execute(&definition(HttpMethod::GET, "http://127.0.0.1:9/api"), "t")
            .await;

        assert_eq!(result.outcome, Outcome::TransportFailed);
        assert_eq!(result.status_code, None);
        assert_eq!(result.elapsed_ms, None);
        assert!(result.body.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_server_error_is_a_populated_result() {
        let transport = Arc::new(RecordingTransport::replying(500, "{\"error\":\"boom\"}"));
        let executor = RequestExecutor::new(transport);

        let result = executor
            .execute(&definition(HttpMethod::DELETE, "https://h/api/x(1)"), "t")
            .await;

        assert_eq!(result.outcome, Outcome::Completed);
        assert_eq!(result.status_code, Some(500));
        assert!(result.elapsed_ms.is_some());
        assert_eq!(result.body, "{\"error\":\"boom\"}");
    }

    #[tokio::test]
    async fn test_empty_url_is_aborted() {
        let transport = Arc::new(RecordingTransport::replying(200, ""));
        let executor = RequestExecutor::new(transport.clone());

        let result = executor.execute(&RequestDefinition::default(), "t").await;

        assert_eq!(result.outcome, Outcome::Aborted);
        assert_eq!(transport.calls(), 0);
    }
}
