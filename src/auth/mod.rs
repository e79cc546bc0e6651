//! Auth layer - scope-keyed token cache and the providers that fill it
//!
//! The cache decides between cached, silent and interactive acquisition;
//! providers only know how to talk to an identity service.

pub mod cache;
pub mod device_code;
pub mod jwt;
pub mod provider;

pub use cache::{scope_key, TokenCache};
pub use device_code::{DeviceCodePrompt, DeviceCodeProvider};
pub use provider::{AccessToken, AuthProvider, StaticTokenProvider};
