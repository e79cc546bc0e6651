use std::borrow::Cow;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::constants::{API_SEGMENT, AUTH_REQUIRED_MESSAGE, DEFAULT_HEADERS, SCOPE_SUFFIX};
use crate::error::{AuthError, RequestBuildError, TransportError};
use crate::headers;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::DELETE,
        HttpMethod::PATCH,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
        }
    }

    /// Methods that carry the JSON payload as their body
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH)
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported method: {}", s))
    }
}

/// HTTP Header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A single editable request.
///
/// Headers and payload are kept as the text the user typed; they are parsed
/// when the request is sent, so a bad payload never blocks editing or sending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDefinition {
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    /// Query string without the leading `?`, appended at send time
    pub query: String,
    /// JSON object text or `Key: Value` lines
    pub headers: String,
    /// JSON text; an empty or unparsable payload means "no body"
    pub payload: String,
}

impl Default for RequestDefinition {
    fn default() -> Self {
        RequestDefinition {
            name: String::new(),
            method: HttpMethod::GET,
            url: String::new(),
            query: String::new(),
            headers: String::from(DEFAULT_HEADERS),
            payload: String::new(),
        }
    }
}

impl RequestDefinition {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        RequestDefinition {
            method,
            url: url.into(),
            ..Default::default()
        }
    }

    /// URL with the separate query string joined on
    pub fn effective_url(&self) -> String {
        join_query(self.url.trim(), self.query.trim())
    }

    pub fn header_pairs(&self) -> Result<Vec<Header>, RequestBuildError> {
        headers::parse_headers(&self.headers)
    }

    /// Parsed payload, or `None` when it is blank or not valid JSON
    pub fn payload_json(&self) -> Option<serde_json::Value> {
        self.parse_payload().ok().flatten()
    }

    pub fn parse_payload(&self) -> Result<Option<serde_json::Value>, RequestBuildError> {
        let text = self.payload.trim();
        if text.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(text)
            .map(Some)
            .map_err(|e| RequestBuildError::InvalidPayload {
                reason: e.to_string(),
            })
    }
}

/// Split `url` on its first `?` into base URL and query string
pub fn extract_query(url: &str) -> (String, String) {
    match url.split_once('?') {
        Some((base, query)) => (base.to_string(), query.to_string()),
        None => (url.to_string(), String::new()),
    }
}

fn join_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, query)
}

/// History label for a URL: everything from its `/api` path segment, or the
/// whole URL. Only the path is searched, so `https://api.example.com/x` and
/// `/apis/x` are left alone.
pub fn display_url(url: &str) -> &str {
    let authority = url.find("://").map(|i| i + 3).unwrap_or(0);
    let Some(path_start) = url[authority..].find(['/', '?', '#']).map(|i| authority + i) else {
        return url;
    };
    let path_end = url[path_start..]
        .find(['?', '#'])
        .map(|i| path_start + i)
        .unwrap_or(url.len());
    let path = &url[path_start..path_end];

    path.match_indices(API_SEGMENT)
        .map(|(i, _)| i)
        .find(|&i| matches!(path[i + API_SEGMENT.len()..].chars().next(), None | Some('/')))
        .map(|i| &url[path_start + i..])
        .unwrap_or(url)
}

/// Resource scope for the host a URL targets, e.g.
/// `https://contoso.example.com/api/x` → `https://contoso.example.com/.default`
pub fn scope_for_url(url: &str) -> Option<String> {
    static ORIGIN: OnceLock<Regex> = OnceLock::new();
    let origin = ORIGIN.get_or_init(|| {
        Regex::new(r"^(https?)://([^/?#\s]+)").expect("origin pattern is valid")
    });
    let caps = origin.captures(url.trim())?;
    Some(format!("{}://{}{}", &caps[1], &caps[2], SCOPE_SUFFIX))
}

/// Where a tab is in its send lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SendStatus {
    #[default]
    Idle,
    Authenticating,
    Sending,
}

/// How a send ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A response arrived, whatever its status code
    Completed,
    /// The request was dispatched but no usable response came back
    TransportFailed,
    /// No token could be obtained; nothing was dispatched
    AuthFailed,
    /// The definition could not be turned into a request; nothing was dispatched
    Aborted,
    Cancelled,
}

impl Outcome {
    pub fn dispatched(&self) -> bool {
        matches!(self, Outcome::Completed | Outcome::TransportFailed)
    }
}

/// Result of one send
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestResult {
    pub status_code: Option<u16>,
    pub elapsed_ms: Option<u64>,
    pub body: String,
    pub outcome: Outcome,
}

impl RequestResult {
    pub fn completed(status_code: u16, elapsed_ms: u64, body: String) -> Self {
        RequestResult {
            status_code: Some(status_code),
            elapsed_ms: Some(elapsed_ms),
            body,
            outcome: Outcome::Completed,
        }
    }

    pub fn transport_failed(error: &TransportError) -> Self {
        match error {
            TransportError::InvalidRequest(_) => {
                Self::without_response(format!("Request not sent: {}", error), Outcome::Aborted)
            }
            _ => Self::without_response(format!("Request failed: {}", error), Outcome::TransportFailed),
        }
    }

    pub fn auth_failed(error: &AuthError) -> Self {
        Self::without_response(
            format!("{}\n{}", AUTH_REQUIRED_MESSAGE, error),
            Outcome::AuthFailed,
        )
    }

    pub fn aborted(error: &RequestBuildError) -> Self {
        Self::without_response(format!("Request not sent: {}", error), Outcome::Aborted)
    }

    pub fn cancelled() -> Self {
        Self::without_response(String::from("Request cancelled"), Outcome::Cancelled)
    }

    fn without_response(body: String, outcome: Outcome) -> Self {
        RequestResult {
            status_code: None,
            elapsed_ms: None,
            body,
            outcome,
        }
    }

    /// Body reformatted for display when it is JSON; the stored body is untouched
    pub fn pretty_body(&self) -> Cow<'_, str> {
        match serde_json::from_str::<serde_json::Value>(&self.body) {
            Ok(json @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
                serde_json::to_string_pretty(&json)
                    .map(Cow::Owned)
                    .unwrap_or(Cow::Borrowed(self.body.as_str()))
            }
            _ => Cow::Borrowed(self.body.as_str()),
        }
    }
}

/// One open, editable request
#[derive(Clone, Debug)]
pub struct Tab {
    /// Session-unique identity; never reused after the tab closes
    pub index: usize,
    pub definition: RequestDefinition,
    pub last_result: Option<RequestResult>,
    pub status: SendStatus,
    /// Send id the tab is waiting on, if any
    pub pending: Option<u64>,
    /// Definition as it was when the pending send started
    pub in_flight: Option<RequestDefinition>,
}

impl Tab {
    pub fn new(index: usize, definition: RequestDefinition) -> Self {
        Tab {
            index,
            definition,
            last_result: None,
            status: SendStatus::Idle,
            pending: None,
            in_flight: None,
        }
    }

    pub fn label(&self) -> String {
        if self.definition.name.trim().is_empty() {
            format!("Request {}", self.index + 1)
        } else {
            self.definition.name.clone()
        }
    }
}

/// A named snapshot of request definitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub requests: Vec<RequestDefinition>,
}

impl Group {
    pub fn new(name: impl Into<String>, requests: Vec<RequestDefinition>) -> Self {
        Group {
            name: name.into(),
            requests,
        }
    }
}

/// History entry
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub method: HttpMethod,
    pub display_url: String,
    pub tab_index: usize,
    pub sent_at: DateTime<Utc>,
}
