//! JSON text codec for the control link
//!
//! Every frame on the link is a single JSON object carried in one WebSocket
//! text message. Outbound frames are commands or liveness requests; inbound
//! frames are liveness replies or status reports:
//! ```text
//! {"result": "ping"}
//! {"id": "<corrId>", "demozone": "<zone>", "result": "<code>"}
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::messages::InboundFrame;
use crate::status::LinkCode;

/// Maximum frame size (1 MiB) accepted or produced on the link
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Message too large: {0} bytes (max: {MAX_MESSAGE_SIZE})")]
    MessageTooLarge(usize),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Empty or missing demozone")]
    EmptyDemozone,

    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A validated inbound link message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMessage {
    /// Reply to a liveness probe
    Pong,
    /// Status or completion report for a correlation
    Report {
        id: String,
        demozone: String,
        /// Raw result code, untranslated
        code: String,
    },
}

/// Encode an outbound frame as JSON text
pub fn encode<T: Serialize>(frame: &T) -> Result<String, CodecError> {
    let text = serde_json::to_string(frame)?;

    if text.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::MessageTooLarge(text.len()));
    }

    Ok(text)
}

/// Decode one inbound text frame
///
/// The liveness check comes first: a frame whose `result` is `ping` is a
/// pong regardless of any other field.
pub fn decode_inbound(text: &str) -> Result<LinkMessage, CodecError> {
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::MessageTooLarge(text.len()));
    }

    let frame: InboundFrame = serde_json::from_str(text)?;
    let code = frame.result.ok_or(CodecError::MissingField("result"))?;

    if LinkCode::parse(&code) == Some(LinkCode::Ping) {
        return Ok(LinkMessage::Pong);
    }

    let id = frame.id.ok_or(CodecError::MissingField("id"))?;
    let demozone = match frame.demozone {
        Some(d) if !d.is_empty() => d,
        _ => return Err(CodecError::EmptyDemozone),
    };

    Ok(LinkMessage::Report { id, demozone, code })
}

/// Decode a binary frame by treating it as UTF-8 text
pub fn decode_inbound_bytes(data: &[u8]) -> Result<LinkMessage, CodecError> {
    let text = std::str::from_utf8(data).map_err(|_| CodecError::InvalidUtf8)?;
    decode_inbound(text)
}
