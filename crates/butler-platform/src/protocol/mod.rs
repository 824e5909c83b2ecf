//! Gateway protocol definitions
//!
//! Op codes, frame format, close codes and control payloads of the platform's
//! WebSocket gateway, seen from the client side.

mod close_codes;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::{
    HelloPayload, IdentifyPayload, IdentifyProperties, Intents, ReadyPayload, ReadyUser,
    ResumePayload,
};
