//! UI events - messages from the presentation layer to the App layer

use crate::models::HttpMethod;

/// Events generated from user input in the UI layer.
///
/// Editing events apply to the selected tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    // Tabs
    AddTab,
    CloseTab(usize),
    SelectTab(usize),

    // Editing the selected tab
    SetName(String),
    SetMethod(HttpMethod),
    SetUrl(String),
    SetQuery(String),
    SetHeaders(String),
    SetPayload(String),
    ResetHeaders,
    ExtractQuery,

    // Sending
    SendRequest,
    CancelRequest,

    // Saved requests
    SaveRequest,
    OpenRequest(usize),
    DeleteRequest(usize),
    NewRequest,

    // Groups
    SaveGroup(String),
    AddGroup,
    SelectGroup(usize),
    DeleteGroup(usize),
    ClearGroup,

    // Auth
    Login(Vec<String>),
    Logout,

    // System
    Quit,
}
