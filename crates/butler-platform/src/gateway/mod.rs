//! Gateway (WebSocket) client
//!
//! Produces the ready signal and the message events consumed by the worker.

mod client;
mod session;

pub use client::GatewayClient;
pub use session::{Session, SessionState};
