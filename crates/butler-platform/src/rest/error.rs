//! Mapping of REST failures onto [`PlatformError`]

use reqwest::StatusCode;

use butler_core::PlatformError;

use crate::models::ApiErrorPayload;

/// Object named by an "Unknown ..." JSON error code
fn unknown_object(code: u64) -> Option<&'static str> {
    match code {
        10003 => Some("channel"),
        10007 => Some("member"),
        10008 => Some("message"),
        10011 => Some("role"),
        10013 => Some("user"),
        _ => None,
    }
}

/// JSON error codes for access problems
const ACCESS_CODES: &[u64] = &[
    50001, // Missing Access
    50007, // Cannot send messages to this user
    50013, // Missing Permissions
];

/// Map a non-success, non-429 response
///
/// `resource` labels a bare 404; an "Unknown ..." code names the missing
/// object itself, which need not be the one the request addressed.
pub(crate) fn map_error_response(
    status: StatusCode,
    body: Option<ApiErrorPayload>,
    resource: &'static str,
) -> PlatformError {
    let (code, message) = match body {
        Some(body) => (body.code, body.message),
        None => (None, String::new()),
    };
    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        message
    };

    if let Some(object) = code.and_then(unknown_object) {
        return PlatformError::not_found(object);
    }

    match code {
        Some(code) if ACCESS_CODES.contains(&code) => PlatformError::Forbidden(message),
        _ if status == StatusCode::NOT_FOUND => PlatformError::not_found(resource),
        _ if status == StatusCode::FORBIDDEN => PlatformError::Forbidden(message),
        _ => PlatformError::Api {
            status: status.as_u16(),
            code,
            message,
        },
    }
}

/// Map a failure to send the request or read its body
pub(crate) fn map_transport_error(err: reqwest::Error) -> PlatformError {
    if err.is_decode() {
        PlatformError::Decode(err.to_string())
    } else {
        PlatformError::Transport(err.to_string())
    }
}
