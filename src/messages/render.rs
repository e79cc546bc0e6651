//! Render state - snapshot sent from App layer to the presentation layer

use crate::models::{HistoryEntry, HttpMethod, SendStatus, Tab};

/// Sign-in status shown next to the login action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    NotAuthenticated,
    Authenticating,
    Authenticated,
    Failed(String),
}

impl AuthStatus {
    pub fn label(&self) -> String {
        match self {
            AuthStatus::NotAuthenticated => String::from("Not Authenticated"),
            AuthStatus::Authenticating => String::from("Authenticating..."),
            AuthStatus::Authenticated => String::from("Authenticated"),
            AuthStatus::Failed(reason) => format!("Auth Failed: {}", reason),
        }
    }
}

/// One entry of the tab strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSummary {
    pub index: usize,
    pub label: String,
    pub method: HttpMethod,
    pub status: SendStatus,
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub tabs: Vec<TabSummary>,
    /// The selected tab in full: editor contents plus last result
    pub active: Option<Tab>,

    pub groups: Vec<String>,
    pub selected_group: Option<usize>,

    /// Saved requests as `name (METHOD url)`
    pub requests: Vec<String>,
    pub selected_request: Option<usize>,

    pub history: Vec<HistoryEntry>,
    pub auth: AuthStatus,

    /// Outcome of the last rejected action, if any
    pub notice: Option<String>,
}
