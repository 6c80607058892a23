//! Pixel Commander Shared Protocol Types
//!
//! This crate provides the command model, the bounded command queue and the
//! wire codec shared by the controller and its tests. Nothing in here talks
//! to a socket or to LED hardware.

pub mod codec;
pub mod lifecycle;
pub mod queue;

use std::fmt;

pub use queue::{CommandQueue, QueueError, QueueFull};
pub use smart_leds::RGB8;

/// Caller-chosen command identifier, echoed back verbatim in replies
pub type CommandId = u32;

/// Opaque handle identifying the connection a command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Protocol limits and defaults
pub mod limits {
    /// Default number of buffered commands
    pub const DEFAULT_QUEUE_CAPACITY: usize = 512;

    /// Default number of commands executed per tick
    pub const DEFAULT_DRAIN_PER_TICK: usize = 10;

    /// Brightness used when `setBrightness` carries no value, and at startup
    pub const DEFAULT_BRIGHTNESS: u8 = 255;

    /// Undelivered replies a client may hold before it is evicted
    pub const DEFAULT_REPLY_BACKLOG: usize = 64;

    /// Largest inbound text frame accepted for decoding
    pub const MAX_FRAME_LEN: usize = 4096;

    /// Literal liveness payload accepted outside of JSON
    pub const PING_PAYLOAD: &str = "ping";
}

/// The action a command performs on the LED state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Write one pixel
    SetPixel { index: u16, color: RGB8 },
    /// Write every pixel with the same color
    SetAll { color: RGB8 },
    /// Zero every pixel
    Clear,
    /// Push the in-memory buffer to the strip
    Show,
    /// Set the global brightness scalar
    SetBrightness { level: u8 },
}

impl CommandKind {
    /// Name of the wire command that produces this kind
    pub fn wire_name(&self) -> &'static str {
        match self {
            CommandKind::SetPixel { .. } => "setPixelColor",
            CommandKind::SetAll { .. } => "setColor",
            CommandKind::Clear => "clear",
            CommandKind::Show => "show",
            CommandKind::SetBrightness { .. } => "setBrightness",
        }
    }
}

/// One validated unit of work together with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub connection: ConnectionId,
    pub id: CommandId,
}

impl Command {
    pub fn new(kind: CommandKind, connection: ConnectionId, id: CommandId) -> Self {
        Self {
            kind,
            connection,
            id,
        }
    }
}

/// Error replies a client can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReply {
    /// Command needs a non-zero `id`
    MissingId,
    /// `cmd` is not a known command
    UnknownCmd { id: CommandId },
    /// `setPixelColor` index is past the end of the strip
    IndexOutOfBounds { id: CommandId, max: u16 },
    /// Command queue had no free slot
    QueueFull { id: CommandId },
    /// Payload could not be decoded
    BadJson,
    /// HTTP form lacks one of r, g, b
    MissingParams,
    /// HTTP form lacks brightness
    MissingParam,
    /// Driver refused a direct HTTP show
    ShowFailed,
}

impl ErrorReply {
    /// Error code as sent on the wire
    pub fn code(&self) -> &'static str {
        match self {
            ErrorReply::MissingId => "missing_id",
            ErrorReply::UnknownCmd { .. } => "unknown_cmd",
            ErrorReply::IndexOutOfBounds { .. } => "index_out_of_bounds",
            ErrorReply::QueueFull { .. } => "queue_full",
            ErrorReply::BadJson => "bad_json",
            ErrorReply::MissingParams => "missing_params",
            ErrorReply::MissingParam => "missing_param",
            ErrorReply::ShowFailed => "show_failed",
        }
    }

    /// Command id echoed with this error, if any
    pub fn command_id(&self) -> Option<CommandId> {
        match self {
            ErrorReply::UnknownCmd { id }
            | ErrorReply::IndexOutOfBounds { id, .. }
            | ErrorReply::QueueFull { id } => Some(*id),
            ErrorReply::MissingId
            | ErrorReply::BadJson
            | ErrorReply::MissingParams
            | ErrorReply::MissingParam
            | ErrorReply::ShowFailed => None,
        }
    }
}

/// A reply sent back to a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Answer to either ping form
    Pong,
    /// Strip length
    PixelCount(u16),
    /// Command executed
    Ack(CommandId),
    /// Plain success for the auxiliary HTTP endpoints
    Done,
    Error(ErrorReply),
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl From<ErrorReply> for Reply {
    fn from(err: ErrorReply) -> Self {
        Reply::Error(err)
    }
}
