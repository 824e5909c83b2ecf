//! # butler-bot
//!
//! Moderation worker: keeps a gateway session open for message events and
//! drives the roster sync, activity scan, task execution and antifraud jobs.

pub mod events;
pub mod worker;

pub use worker::run;
