//! REST adapter for the platform's HTTP API

mod client;
mod error;

pub use client::DiscordClient;
