/**
 * Client Connections
 *
 * A connection pairs one client transport with a bounded outbound queue.
 *
 * Ownership of the queue is split three ways:
 *
 * - [`Connection`] holds the only strong sender. It is handed to the room
 *   hub on registration, so only the hub can close the queue, and it does
 *   so by dropping the entry.
 * - [`Replier`] holds a weak sender used by the receive loop for acks and
 *   errors. It never keeps the queue open.
 * - The receiver is drained by [`run_send_loop`].
 */
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use super::transport::FrameSink;
use crate::shared::ServerFrame;

/// A serialized frame shared between every member of a broadcast
pub type Frame = Arc<str>;

/// Unique identifier of one client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hub-side member entry
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    user_id: i64,
    room_id: i64,
    outbound: mpsc::Sender<Frame>,
}

impl Connection {
    /// Open a connection with an outbound queue of `capacity` frames
    ///
    /// Returns the member entry and the receiving end of its queue.
    pub fn open(user_id: i64, room_id: i64, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let connection = Self {
            id: ConnectionId::new(),
            user_id,
            room_id,
            outbound,
        };
        (connection, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn room_id(&self) -> i64 {
        self.room_id
    }

    /// Weak handle for replies from the receive loop
    pub fn replier(&self) -> Replier {
        Replier {
            id: self.id,
            queue: self.outbound.downgrade(),
        }
    }

    /// Enqueue without waiting
    pub(crate) fn try_deliver(&self, frame: &Frame) -> Result<(), TrySendError<Frame>> {
        self.outbound.try_send(frame.clone())
    }

    /// True once the send loop dropped the receiver
    pub(crate) fn is_gone(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// Weak handle to a connection's own outbound queue
#[derive(Debug, Clone)]
pub struct Replier {
    id: ConnectionId,
    queue: mpsc::WeakSender<Frame>,
}

impl Replier {
    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a frame for this connection only
    ///
    /// Returns false when the frame was dropped: the hub already closed the
    /// queue, the queue is full, or the frame could not be encoded.
    pub fn reply(&self, frame: &ServerFrame) -> bool {
        let Some(queue) = self.queue.upgrade() else {
            tracing::debug!("[Realtime] Reply to {} dropped: queue closed", self.id);
            return false;
        };

        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("[Realtime] Failed to encode reply for {}: {}", self.id, e);
                return false;
            }
        };

        match queue.try_send(Frame::from(text)) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                tracing::warn!("[Realtime] Reply to {} dropped, queue full: {}", self.id, frame);
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("[Realtime] Reply to {} dropped: queue closed", self.id);
                false
            }
        }
    }
}

/// Drain the outbound queue into the sink in FIFO order
///
/// Ends when the queue is closed and empty or a write fails, then closes
/// the sink.
pub async fn run_send_loop<S>(id: ConnectionId, mut outbound: mpsc::Receiver<Frame>, mut sink: S)
where
    S: FrameSink,
{
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send_frame(&frame).await {
            tracing::info!("[Realtime] Write to {} failed: {}", id, e);
            break;
        }
    }

    if let Err(e) = sink.close().await {
        tracing::debug!("[Realtime] Close of {} reported: {}", id, e);
    }
    tracing::debug!("[Realtime] Send loop for {} finished", id);
}
