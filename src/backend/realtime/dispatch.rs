/**
 * Inbound Frame Dispatch
 *
 * Decides what one inbound text frame means for a connection:
 *
 * | type           | effect                                             |
 * |----------------|----------------------------------------------------|
 * | `send_message` | persist, then broadcast a `message` frame          |
 * | `read`         | ack `read received`                                |
 * | `join`         | ack `joined room`                                  |
 * | `leave`        | stop the receive loop                              |
 * | anything else  | error `unknown message type`                       |
 *
 * Acks and errors go only to the sending connection, through its
 * [`Replier`].
 */
use std::sync::Arc;

use super::connection::Replier;
use super::hub::{HubError, RoomHub};
use super::persistence::MessageStore;
use crate::shared::{Envelope, EnvelopeKind, ServerFrame};

pub const INVALID_FORMAT: &str = "invalid message format";
pub const CONTENT_REQUIRED: &str = "content required";
pub const DB_ERROR: &str = "db error sending message";
pub const READ_RECEIVED: &str = "read received";
pub const JOINED_ROOM: &str = "joined room";
pub const UNKNOWN_TYPE: &str = "unknown message type";

/// What the receive loop does after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading
    Continue,
    /// Client asked to leave
    Leave,
    /// The hub stopped accepting broadcasts
    HubClosed,
}

/// Per-connection frame handler
pub struct Dispatcher {
    user_id: i64,
    room_id: i64,
    hub: RoomHub,
    replier: Replier,
    store: Arc<dyn MessageStore>,
}

impl Dispatcher {
    pub fn new(
        user_id: i64,
        room_id: i64,
        hub: RoomHub,
        replier: Replier,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            user_id,
            room_id,
            hub,
            replier,
            store,
        }
    }

    /// Handle one inbound text frame
    pub async fn handle(&self, text: &str) -> Flow {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(
                    "[Realtime] Malformed frame from user {} in room {}: {}",
                    self.user_id,
                    self.room_id,
                    e
                );
                self.reject(INVALID_FORMAT);
                return Flow::Continue;
            }
        };

        match envelope.kind() {
            EnvelopeKind::SendMessage => self.send_message(envelope.content).await,
            EnvelopeKind::Read => {
                self.replier.reply(&ServerFrame::ack(READ_RECEIVED));
                Flow::Continue
            }
            EnvelopeKind::Join => {
                self.replier.reply(&ServerFrame::ack(JOINED_ROOM));
                Flow::Continue
            }
            EnvelopeKind::Leave => Flow::Leave,
            EnvelopeKind::Unknown => {
                tracing::debug!(
                    "[Realtime] Unknown message type '{}' from user {}",
                    envelope.kind,
                    self.user_id
                );
                self.reject(UNKNOWN_TYPE);
                Flow::Continue
            }
        }
    }

    /// Report a frame that could not be decoded as text
    pub fn reject_invalid(&self) {
        self.reject(INVALID_FORMAT);
    }

    fn reject(&self, message: &str) {
        self.replier.reply(&ServerFrame::error(message));
    }

    async fn send_message(&self, content: String) -> Flow {
        if content.is_empty() {
            self.reject(CONTENT_REQUIRED);
            return Flow::Continue;
        }

        // The room comes from the connection, never from the envelope
        let message = match self
            .store
            .store_message(self.room_id, self.user_id, &content)
            .await
        {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(
                    "[Realtime] Failed to store message from user {} in room {}: {}",
                    self.user_id,
                    self.room_id,
                    e
                );
                self.reject(DB_ERROR);
                return Flow::Continue;
            }
        };

        let frame = match ServerFrame::from(message).encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("[Realtime] Failed to encode message frame: {}", e);
                return Flow::Continue;
            }
        };

        match self.hub.broadcast(frame).await {
            Ok(()) => Flow::Continue,
            Err(HubError::Closed(room_id)) => {
                tracing::warn!("[Realtime] Hub for room {} closed mid-session", room_id);
                Flow::HubClosed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::realtime::connection::{Connection, Frame};
    use crate::backend::realtime::hub::HubSettings;
    use crate::backend::realtime::memory::MemoryStore;
    use crate::backend::realtime::registry::HubRegistry;
    use tokio::sync::mpsc;

    struct Fixture {
        dispatcher: Dispatcher,
        own: mpsc::Receiver<Frame>,
        peer: mpsc::Receiver<Frame>,
    }

    async fn fixture(store: Arc<MemoryStore>) -> Fixture {
        let hub = RoomHub::spawn(5, &HubSettings::default());

        let (own_connection, own) = Connection::open(1, 5, 16);
        let replier = own_connection.replier();
        hub.register(own_connection).await.unwrap();

        let (peer_connection, peer) = Connection::open(2, 5, 16);
        hub.register(peer_connection).await.unwrap();

        Fixture {
            dispatcher: Dispatcher::new(1, 5, hub, replier, store),
            own,
            peer,
        }
    }

    fn parse(frame: &str) -> serde_json::Value {
        serde_json::from_str(frame).unwrap()
    }

    #[tokio::test]
    async fn test_send_message_persists_then_broadcasts() {
        let store = Arc::new(MemoryStore::default());
        let mut f = fixture(store.clone()).await;

        let flow = f
            .dispatcher
            .handle(r#"{"type":"send_message","room_id":99,"content":"hello"}"#)
            .await;
        assert_eq!(flow, Flow::Continue);

        for rx in [&mut f.own, &mut f.peer] {
            let frame = parse(&rx.recv().await.unwrap());
            assert_eq!(frame["type"], "message");
            assert_eq!(frame["content"], "hello");
            assert_eq!(frame["room_id"], 5);
            assert_eq!(frame["sender_id"], 1);
            assert_eq!(frame["id"], 1);
        }
        assert_eq!(store.stored().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected_to_sender_only() {
        let store = Arc::new(MemoryStore::default());
        let mut f = fixture(store.clone()).await;

        f.dispatcher
            .handle(r#"{"type":"send_message","room_id":5,"content":""}"#)
            .await;

        let frame = parse(&f.own.recv().await.unwrap());
        assert_eq!(frame, serde_json::json!({"type":"error","message":CONTENT_REQUIRED}));
        assert!(f.peer.try_recv().is_err());
        assert!(store.stored().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_broadcast() {
        let mut f = fixture(Arc::new(MemoryStore::failing())).await;

        let flow = f
            .dispatcher
            .handle(r#"{"type":"send_message","content":"lost"}"#)
            .await;

        assert_eq!(flow, Flow::Continue);
        let frame = parse(&f.own.recv().await.unwrap());
        assert_eq!(frame["message"], DB_ERROR);
        assert!(f.peer.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_acks_and_errors() {
        let mut f = fixture(Arc::new(MemoryStore::default())).await;

        let cases = [
            (r#"{"type":"read","room_id":5}"#, "ack", READ_RECEIVED),
            (r#"{"type":"join","room_id":5}"#, "ack", JOINED_ROOM),
            (r#"{"type":"typing"}"#, "error", UNKNOWN_TYPE),
            ("{not json", "error", INVALID_FORMAT),
        ];

        for (input, kind, message) in cases {
            assert_eq!(f.dispatcher.handle(input).await, Flow::Continue);
            let frame = parse(&f.own.recv().await.unwrap());
            assert_eq!(frame["type"], kind, "input {input}");
            assert_eq!(frame["message"], message, "input {input}");
        }
        assert!(f.peer.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_leave_stops_loop() {
        let f = fixture(Arc::new(MemoryStore::default())).await;
        assert_eq!(f.dispatcher.handle(r#"{"type":"leave"}"#).await, Flow::Leave);
    }

    #[tokio::test]
    async fn test_closed_hub_ends_loop() {
        let registry = HubRegistry::default();
        let mut membership = registry.join(1, 6).await.unwrap();
        let dispatcher = Dispatcher::new(
            1,
            6,
            membership.hub.clone(),
            membership.replier.clone(),
            Arc::new(MemoryStore::default()),
        );

        registry.shutdown();
        assert!(membership.outbound.recv().await.is_none());

        let flow = dispatcher
            .handle(r#"{"type":"send_message","content":"hi"}"#)
            .await;
        assert_eq!(flow, Flow::HubClosed);
    }
}
