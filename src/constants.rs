//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Scope requested when a URL cannot be split into scheme and host
pub const DEFAULT_SCOPE: &str = "https://api.bap.microsoft.com/.default";

/// Authority used by the device code provider unless configured otherwise
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/organizations";

/// Suffix appended to `{scheme}://{host}` to form a resource scope
pub const SCOPE_SUFFIX: &str = "/.default";

/// History display URLs start at this path segment when present
pub const API_SEGMENT: &str = "/api";

/// Header editor contents for new and cleared requests
pub const DEFAULT_HEADERS: &str = "Accept: application/json\n\
Content-Type: application/json\n\
OData-MaxVersion: 4.0\n\
OData-Version: 4.0";

/// Per-request timeout for the HTTP transport
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Result body recorded when a send cannot obtain a token silently
pub const AUTH_REQUIRED_MESSAGE: &str =
    "Authentication required. Run `login` to sign in for this scope.";

/// Application name
pub const APP_NAME: &str = "scopebench";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
