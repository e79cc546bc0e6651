//! # Scopebench
//!
//! An HTTP request workbench for APIs protected by the Microsoft identity
//! platform (Dataverse, Power Platform and similar).
//!
//! ## Features
//! - Tabs of editable requests: GET, POST, PUT, PATCH, DELETE
//! - Headers as JSON or `Key: Value` lines, JSON payloads
//! - Saved requests and named groups of tabs
//! - Per-host scopes with a scope-keyed token cache: silent by default,
//!   interactive (device code) only on an explicit login
//! - Send history
//!
//! ## Architecture
//! Actor-based with channels:
//! - Console layer - line commands in, text out
//! - App Layer (state machine over [`WorkbenchState`])
//! - Network Layer (Tokio runtime, [`TokenCache`] + [`RequestExecutor`])

pub mod app;
pub mod auth;
pub mod config;
pub mod console;
pub mod constants;
pub mod error;
pub mod headers;
pub mod messages;
pub mod models;
pub mod network;

// Re-export commonly used types
pub use app::{AppActor, WorkbenchState};
pub use auth::{AuthProvider, TokenCache};
pub use config::Config;
pub use error::{AuthError, RequestBuildError, TransportError, WorkbenchError};
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{Group, HttpMethod, RequestDefinition, RequestResult, Tab};
pub use network::{NetworkActor, RequestExecutor, SendPipeline};
