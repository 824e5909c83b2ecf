//! Gateway events
//!
//! Typed events decoded from dispatch frames and handed to the worker.

mod event_types;

pub use event_types::GatewayEventType;

use serde::Deserialize;
use serde_json::Value;

use butler_core::{PlatformMessage, Snowflake};

use crate::models::{MessagePayload, MessageRef};
use crate::protocol::ReadyPayload;

/// An event delivered to the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// A new session is live
    Ready { session_id: String, user_id: Snowflake },
    /// A dropped session was resumed; missed events were replayed
    Resumed,
    MessageCreate(PlatformMessage),
    /// Update dispatches may be partial, so only the reference is kept
    MessageUpdate(MessageRef),
    MessageDelete(MessageRef),
}

impl GatewayEvent {
    /// Decode a dispatch payload; `Ok(None)` for events the worker ignores
    pub fn from_dispatch(name: &str, data: &Value) -> serde_json::Result<Option<Self>> {
        let Some(kind) = GatewayEventType::from_name(name) else {
            return Ok(None);
        };

        let event = match kind {
            GatewayEventType::Ready => {
                let ready = ReadyPayload::deserialize(data)?;
                Self::Ready {
                    session_id: ready.session_id,
                    user_id: ready.user.id,
                }
            }
            GatewayEventType::Resumed => Self::Resumed,
            GatewayEventType::MessageCreate => {
                Self::MessageCreate(MessagePayload::deserialize(data)?.into_message(None))
            }
            GatewayEventType::MessageUpdate => Self::MessageUpdate(MessageRef::deserialize(data)?),
            GatewayEventType::MessageDelete => Self::MessageDelete(MessageRef::deserialize(data)?),
        };

        Ok(Some(event))
    }

    /// The event type of this event
    #[must_use]
    pub const fn kind(&self) -> GatewayEventType {
        match self {
            Self::Ready { .. } => GatewayEventType::Ready,
            Self::Resumed => GatewayEventType::Resumed,
            Self::MessageCreate(_) => GatewayEventType::MessageCreate,
            Self::MessageUpdate(_) => GatewayEventType::MessageUpdate,
            Self::MessageDelete(_) => GatewayEventType::MessageDelete,
        }
    }
}
