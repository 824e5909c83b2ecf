//! # butler-platform
//!
//! Discord adapter: a REST client implementing
//! [`PlatformClient`](butler_core::PlatformClient) and a gateway client that
//! delivers message events and the ready signal.

pub mod events;
pub mod gateway;
pub mod models;
pub mod protocol;
pub mod rest;

pub use events::{GatewayEvent, GatewayEventType};
pub use gateway::GatewayClient;
pub use models::MessageRef;
pub use protocol::Intents;
pub use rest::DiscordClient;
