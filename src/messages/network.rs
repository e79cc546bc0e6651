//! Network messages - communication between App and Network layers

use crate::error::AuthError;
use crate::models::{RequestDefinition, RequestResult};

/// Everything the network layer needs to perform one send
#[derive(Debug, Clone)]
pub struct SendJob {
    pub id: u64,
    pub tab_index: usize,
    pub definition: RequestDefinition,
    pub scopes: Vec<String>,
}

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Acquire a token silently, then execute the request
    Send(SendJob),
    /// Cancel a pending send
    Cancel(u64),
    /// Acquire a token with interactive sign-in allowed
    Login { scopes: Vec<String> },
    /// Forget every cached token
    Logout,
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// A token was obtained and the request is being dispatched
    Authenticated { id: u64 },
    /// The send ended with a result (including auth failure)
    Finished { id: u64, result: RequestResult },
    /// Send was cancelled before it finished
    Cancelled { id: u64 },
    LoginFinished {
        scope: String,
        outcome: Result<(), AuthError>,
    },
    LoggedOut,
}

impl NetworkResponse {
    /// Send id this response belongs to, if it belongs to a send
    pub fn send_id(&self) -> Option<u64> {
        match self {
            NetworkResponse::Authenticated { id }
            | NetworkResponse::Finished { id, .. }
            | NetworkResponse::Cancelled { id } => Some(*id),
            NetworkResponse::LoginFinished { .. } | NetworkResponse::LoggedOut => None,
        }
    }
}
