//! Network layer - token-authorized HTTP execution
//!
//! The Network actor receives send/auth commands and sends back responses.

pub mod actor;
pub mod client;
pub mod executor;
pub mod pipeline;

pub use actor::NetworkActor;
pub use client::{HttpTransport, ReqwestTransport, WireRequest, WireResponse};
pub use executor::RequestExecutor;
pub use pipeline::SendPipeline;
