//! Ingress dispatcher - validates inbound frames and queues commands

use pixel_commander_shared::codec::{self, Inbound, InboundMessage};
use pixel_commander_shared::{
    limits, Command, CommandId, CommandKind, CommandQueue, ConnectionId, ErrorReply, Reply, RGB8,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of dispatching one inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Answer immediately; nothing was queued
    Reply(Reply),
    /// Command queued; the executor will acknowledge it
    Queued(CommandId),
}

/// Turns inbound frames into queued commands or immediate replies
pub struct IngressDispatcher {
    queue: Arc<CommandQueue>,
    pixel_count: u16,
}

impl IngressDispatcher {
    /// Create a dispatcher feeding `queue` for a strip of `pixel_count` pixels
    pub fn new(queue: Arc<CommandQueue>, pixel_count: u16) -> Self {
        Self { queue, pixel_count }
    }

    pub fn pixel_count(&self) -> u16 {
        self.pixel_count
    }

    /// Dispatch one raw text frame from `connection`
    pub fn dispatch(&self, connection: ConnectionId, payload: &str) -> Dispatch {
        match codec::decode(payload) {
            Ok(Inbound::Ping) => {
                debug!("Received WebSocket ping from client {}", connection);
                Dispatch::Reply(Reply::Pong)
            }
            Ok(Inbound::Message(message)) => self.dispatch_message(connection, &message),
            Err(e) => {
                debug!("Bad frame from client {}: {}", connection, e);
                Dispatch::Reply(ErrorReply::BadJson.into())
            }
        }
    }

    /// Dispatch one decoded message from `connection`
    pub fn dispatch_message(&self, connection: ConnectionId, message: &InboundMessage) -> Dispatch {
        match message.cmd() {
            "ping" => {
                debug!("Received WebSocket ping (JSON) from client {}", connection);
                return Dispatch::Reply(Reply::Pong);
            }
            "getPixelCount" => {
                debug!("Received getPixelCount from client {}", connection);
                return Dispatch::Reply(Reply::PixelCount(self.pixel_count));
            }
            _ => {}
        }

        let id = match message.id {
            Some(id) if id != 0 => id,
            _ => return Dispatch::Reply(ErrorReply::MissingId.into()),
        };

        let kind = match self.translate(id, message) {
            Ok(kind) => kind,
            Err(err) => {
                debug!(
                    "Rejected '{}' id={} from client {}: {}",
                    message.cmd(),
                    id,
                    connection,
                    err.code()
                );
                return Dispatch::Reply(err.into());
            }
        };

        match self.queue.try_enqueue(Command::new(kind, connection, id)) {
            Ok(()) => Dispatch::Queued(id),
            Err(full) => {
                warn!(
                    "Command queue full! Dropping command ID {} from client {}",
                    full.0.id, connection
                );
                Dispatch::Reply(ErrorReply::QueueFull { id }.into())
            }
        }
    }

    /// Map a message onto a command kind, defaulting absent fields
    fn translate(&self, id: CommandId, message: &InboundMessage) -> Result<CommandKind, ErrorReply> {
        let color = RGB8::new(
            message.r.unwrap_or(0),
            message.g.unwrap_or(0),
            message.b.unwrap_or(0),
        );

        match message.cmd() {
            "setColor" => Ok(CommandKind::SetAll { color }),
            "clear" => Ok(CommandKind::Clear),
            "setPixelColor" => {
                let index = message.index.unwrap_or(0);
                if index >= self.pixel_count {
                    return Err(ErrorReply::IndexOutOfBounds {
                        id,
                        max: self.pixel_count.saturating_sub(1),
                    });
                }
                Ok(CommandKind::SetPixel { index, color })
            }
            "show" => Ok(CommandKind::Show),
            "setBrightness" => Ok(CommandKind::SetBrightness {
                level: message.brightness.unwrap_or(limits::DEFAULT_BRIGHTNESS),
            }),
            _ => Err(ErrorReply::UnknownCmd { id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONN: ConnectionId = ConnectionId(1);

    fn dispatcher(capacity: usize, pixel_count: u16) -> (IngressDispatcher, Arc<CommandQueue>) {
        let queue = Arc::new(CommandQueue::new(capacity).unwrap());
        (IngressDispatcher::new(queue.clone(), pixel_count), queue)
    }

    #[test]
    fn test_bare_ping_bypasses_queue() {
        let (dispatcher, queue) = dispatcher(4, 10);
        assert_eq!(dispatcher.dispatch(CONN, "ping"), Dispatch::Reply(Reply::Pong));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_json_ping_and_pixel_count_need_no_id() {
        let (dispatcher, queue) = dispatcher(4, 10);
        assert_eq!(dispatcher.dispatch(CONN, r#"{"cmd":"ping"}"#), Dispatch::Reply(Reply::Pong));
        assert_eq!(
            dispatcher.dispatch(CONN, r#"{"cmd":"getPixelCount"}"#),
            Dispatch::Reply(Reply::PixelCount(10))
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queries_answered_despite_malformed_fields() {
        let (dispatcher, queue) = dispatcher(4, 10);
        assert_eq!(
            dispatcher.dispatch(CONN, r#"{"cmd":"ping","id":"abc"}"#),
            Dispatch::Reply(Reply::Pong)
        );
        assert_eq!(
            dispatcher.dispatch(CONN, r#"{"cmd":"getPixelCount","r":300}"#),
            Dispatch::Reply(Reply::PixelCount(10))
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_set_pixel_queued() {
        let (dispatcher, queue) = dispatcher(4, 10);
        let result = dispatcher.dispatch(
            CONN,
            r#"{"cmd":"setPixelColor","id":1,"index":5,"r":10,"g":20,"b":30}"#,
        );
        assert_eq!(result, Dispatch::Queued(1));

        let command = queue.dequeue().expect("command should be queued");
        assert_eq!(command.connection, CONN);
        assert_eq!(command.id, 1);
        assert_eq!(
            command.kind,
            CommandKind::SetPixel {
                index: 5,
                color: RGB8::new(10, 20, 30)
            }
        );
    }

    #[test]
    fn test_index_out_of_bounds_never_queued() {
        let (dispatcher, queue) = dispatcher(4, 10);
        let result = dispatcher.dispatch(
            CONN,
            r#"{"cmd":"setPixelColor","id":2,"index":10,"r":0,"g":0,"b":0}"#,
        );
        assert_eq!(
            result,
            Dispatch::Reply(Reply::Error(ErrorReply::IndexOutOfBounds { id: 2, max: 9 }))
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_missing_channels_default_to_black() {
        let (dispatcher, queue) = dispatcher(4, 10);
        assert_eq!(dispatcher.dispatch(CONN, r#"{"cmd":"setColor","id":3}"#), Dispatch::Queued(3));
        assert_eq!(
            queue.dequeue().map(|c| c.kind),
            Some(CommandKind::SetAll {
                color: RGB8::new(0, 0, 0)
            })
        );
    }

    #[test]
    fn test_missing_brightness_defaults_to_full() {
        let (dispatcher, queue) = dispatcher(4, 10);
        dispatcher.dispatch(CONN, r#"{"cmd":"setBrightness","id":4}"#);
        dispatcher.dispatch(CONN, r#"{"cmd":"setBrightness","id":5,"brightness":40}"#);
        assert_eq!(queue.dequeue().map(|c| c.kind), Some(CommandKind::SetBrightness { level: 255 }));
        assert_eq!(queue.dequeue().map(|c| c.kind), Some(CommandKind::SetBrightness { level: 40 }));
    }

    #[test]
    fn test_missing_index_defaults_to_zero() {
        let (dispatcher, queue) = dispatcher(4, 10);
        dispatcher.dispatch(CONN, r#"{"cmd":"setPixelColor","id":6,"g":7}"#);
        assert_eq!(
            queue.dequeue().map(|c| c.kind),
            Some(CommandKind::SetPixel {
                index: 0,
                color: RGB8::new(0, 7, 0)
            })
        );
    }

    #[test]
    fn test_missing_or_zero_id() {
        let (dispatcher, queue) = dispatcher(4, 10);
        let missing = Dispatch::Reply(Reply::Error(ErrorReply::MissingId));
        assert_eq!(dispatcher.dispatch(CONN, r#"{"cmd":"show"}"#), missing);
        assert_eq!(dispatcher.dispatch(CONN, r#"{"cmd":"show","id":0}"#), missing);
        assert_eq!(dispatcher.dispatch(CONN, r#"{"cmd":"show","id":null}"#), missing);
        // The id check comes before the command name check
        assert_eq!(dispatcher.dispatch(CONN, r#"{"cmd":"dance"}"#), missing);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unknown_cmd_echoes_id() {
        let (dispatcher, queue) = dispatcher(4, 10);
        assert_eq!(
            dispatcher.dispatch(CONN, r#"{"cmd":"dance","id":42}"#),
            Dispatch::Reply(Reply::Error(ErrorReply::UnknownCmd { id: 42 }))
        );
        assert_eq!(
            dispatcher.dispatch(CONN, r#"{"id":43}"#),
            Dispatch::Reply(Reply::Error(ErrorReply::UnknownCmd { id: 43 }))
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_bad_json() {
        let (dispatcher, queue) = dispatcher(4, 10);
        let bad = Dispatch::Reply(Reply::Error(ErrorReply::BadJson));
        assert_eq!(dispatcher.dispatch(CONN, "{\"cmd\":"), bad);
        assert_eq!(dispatcher.dispatch(CONN, r#"{"cmd":"setColor","id":1,"r":256}"#), bad);
        assert_eq!(dispatcher.dispatch(CONN, r#""setColor""#), bad);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_full_rejects_with_own_id() {
        let (dispatcher, queue) = dispatcher(2, 10);
        assert_eq!(dispatcher.dispatch(CONN, r#"{"cmd":"show","id":1}"#), Dispatch::Queued(1));
        assert_eq!(dispatcher.dispatch(CONN, r#"{"cmd":"clear","id":2}"#), Dispatch::Queued(2));
        assert_eq!(
            dispatcher.dispatch(CONN, r#"{"cmd":"show","id":3}"#),
            Dispatch::Reply(Reply::Error(ErrorReply::QueueFull { id: 3 }))
        );
        assert_eq!(queue.len(), 2);

        // Space frees up once the executor drains
        queue.dequeue();
        assert_eq!(dispatcher.dispatch(CONN, r#"{"cmd":"show","id":4}"#), Dispatch::Queued(4));
    }

    #[test]
    fn test_large_ids_echoed_verbatim() {
        let (dispatcher, _queue) = dispatcher(4, 10);
        assert_eq!(
            dispatcher.dispatch(CONN, r#"{"cmd":"nope","id":4294967295}"#),
            Dispatch::Reply(Reply::Error(ErrorReply::UnknownCmd { id: u32::MAX }))
        );
    }
}
