//! Gateway frame format
//!
//! Every text frame on the connection is one `{op, d, s, t}` object.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{IdentifyPayload, OpCode, ResumePayload};

/// Gateway frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event name (op=0 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (op=0 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Payload; always present on the wire, `null` when empty
    #[serde(default)]
    pub d: Value,
}

impl GatewayMessage {
    fn client(op: OpCode, d: Value) -> Self {
        Self {
            op,
            t: None,
            s: None,
            d,
        }
    }

    /// Heartbeat (op=1) carrying the last sequence number seen
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self::client(OpCode::Heartbeat, last_sequence.map_or(Value::Null, Value::from))
    }

    /// Identify (op=2)
    pub fn identify(payload: &IdentifyPayload) -> serde_json::Result<Self> {
        Ok(Self::client(OpCode::Identify, serde_json::to_value(payload)?))
    }

    /// Resume (op=6)
    pub fn resume(payload: &ResumePayload) -> serde_json::Result<Self> {
        Ok(Self::client(OpCode::Resume, serde_json::to_value(payload)?))
    }

    /// Decode the payload into a typed structure
    pub fn data<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.d)
    }

    /// Event name of a dispatch frame
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        match self.op {
            OpCode::Dispatch => self.t.as_deref(),
            _ => None,
        }
    }

    /// Parse a text frame
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize for sending
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
