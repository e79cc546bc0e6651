//! Error types for each layer of the engine
//!
//! Every send-path error ends up as a visible [`RequestResult`](crate::models::RequestResult);
//! none of these escape a send as a fault.

/// Token acquisition failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("silent token acquisition failed: {reason}")]
    Silent { reason: String },
    #[error("interactive token acquisition failed: {reason}")]
    Interactive { reason: String },
    #[error("no signed-in account and interactive sign-in is disabled")]
    NoAccount,
}

/// Problems found while turning a definition into a wire request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestBuildError {
    #[error("invalid headers: {reason}")]
    InvalidHeaders { reason: String },
    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },
    #[error("endpoint URL is empty")]
    MissingUrl,
}

/// Failures below HTTP semantics: nothing usable came back
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("request timed out")]
    Timeout,
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The client refused to build the request; nothing was sent
    #[error("request could not be built: {0}")]
    InvalidRequest(String),
}

/// Rejected workbench state operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkbenchError {
    #[error("no tab with index {0}")]
    NoSuchTab(usize),
    #[error("no group at position {0}")]
    NoSuchGroup(usize),
    #[error("no saved request at position {0}")]
    NoSuchRequest(usize),
    #[error(transparent)]
    InvalidRequest(#[from] RequestBuildError),
}
