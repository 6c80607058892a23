//! JSON codec for WebSocket text frames
//!
//! Every frame carries exactly one message:
//! ```text
//! inbound:  ping | {"cmd": "...", "id": 1, ...}
//! outbound: {"status": "ok" | "error", ...}
//! ```
//!
//! Decoding is strict about types: a channel value of 300 or a string id
//! fails the whole frame. Missing optional fields are left as `None` for the
//! dispatcher to default. `ping` and `getPixelCount` objects are the
//! exception: their other fields are never read.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::limits::{MAX_FRAME_LEN, PING_PAYLOAD};
use crate::{CommandId, ErrorReply, Reply};

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Frame too large: {0} bytes (max: {MAX_FRAME_LEN})")]
    FrameTooLarge(usize),

    #[error("Message is not a JSON object")]
    NotAnObject,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A decoded command message
///
/// Field names follow the wire format. Values of the wrong type are decode
/// errors; absent or null values are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    pub cmd: Option<String>,
    pub id: Option<CommandId>,
    pub r: Option<u8>,
    pub g: Option<u8>,
    pub b: Option<u8>,
    pub index: Option<u16>,
    pub brightness: Option<u8>,
}

impl InboundMessage {
    /// Command name, or the empty string when absent
    pub fn cmd(&self) -> &str {
        self.cmd.as_deref().unwrap_or("")
    }
}

const QUERY_PING: &str = "ping";
const QUERY_PIXEL_COUNT: &str = "getPixelCount";

/// One decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The bare `ping` text payload
    Ping,
    Message(InboundMessage),
}

/// Decode one inbound text frame
pub fn decode(text: &str) -> Result<Inbound, CodecError> {
    if text.len() > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge(text.len()));
    }

    if text == PING_PAYLOAD {
        return Ok(Inbound::Ping);
    }

    let value: Value = serde_json::from_str(text)?;
    let Some(object) = value.as_object() else {
        return Err(CodecError::NotAnObject);
    };

    // Queries are answered whatever else the object carries
    if let Some(cmd @ (QUERY_PING | QUERY_PIXEL_COUNT)) = object.get("cmd").and_then(Value::as_str) {
        return Ok(Inbound::Message(InboundMessage {
            cmd: Some(cmd.to_string()),
            ..Default::default()
        }));
    }

    Ok(Inbound::Message(serde_json::from_value(value)?))
}

/// Encode a reply as a JSON text frame
pub fn encode(reply: &Reply) -> Result<String, CodecError> {
    Ok(serde_json::to_string(reply)?)
}

impl Serialize for Reply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reply::Pong => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("status", "ok")?;
                map.serialize_entry("message", "pong")?;
                map.end()
            }
            Reply::PixelCount(count) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("status", "ok")?;
                map.serialize_entry("pixelCount", count)?;
                map.end()
            }
            Reply::Ack(id) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("status", "ok")?;
                map.serialize_entry("ack", id)?;
                map.end()
            }
            Reply::Done => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("status", "ok")?;
                map.end()
            }
            Reply::Error(err) => err.serialize(serializer),
        }
    }
}

impl Serialize for ErrorReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("status", "error")?;
        map.serialize_entry("error", self.code())?;
        if let Some(id) = self.command_id() {
            map.serialize_entry("id", &id)?;
        }
        if let ErrorReply::IndexOutOfBounds { max, .. } = self {
            map.serialize_entry("max", max)?;
        }
        map.end()
    }
}
