//! In-process transport and message store
//!
//! A [`FrameSink`]/[`FrameSource`] pair backed by unbounded channels, with a
//! [`ClientEnd`] that plays the remote peer, and a [`MemoryStore`] that
//! numbers messages itself. Together they drive sessions without a network
//! socket or a database.
//!
//! Only built for tests and with the `test-utils` feature.
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use super::persistence::{MessageStore, StoreError};
use super::transport::{FrameSink, FrameSource, TransportError};
use crate::shared::ChatMessage;

/// Create a connected sink, source and client end
pub fn memory_transport() -> (MemorySink, MemorySource, ClientEnd) {
    let (to_client, from_server) = mpsc::unbounded_channel();
    let (to_server, from_client) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));

    let sink = MemorySink {
        tx: Some(to_client),
        closed: closed.clone(),
    };
    let source = MemorySource { rx: from_client };
    let client = ClientEnd {
        tx: Some(to_server),
        rx: from_server,
        closed,
    };
    (sink, source, client)
}

/// Server-side write half
#[derive(Debug)]
pub struct MemorySink {
    tx: Option<mpsc::UnboundedSender<String>>,
    closed: Arc<AtomicBool>,
}

/// Server-side read half
#[derive(Debug)]
pub struct MemorySource {
    rx: mpsc::UnboundedReceiver<Result<String, TransportError>>,
}

/// The remote peer of an in-process transport
#[derive(Debug)]
pub struct ClientEnd {
    tx: Option<mpsc::UnboundedSender<Result<String, TransportError>>>,
    rx: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_frame(&mut self, frame: &str) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(frame.to_owned())
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        self.tx.take().map(|_| ()).ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        self.rx.recv().await
    }
}

impl ClientEnd {
    /// Send a text frame to the server; false once disconnected
    pub fn send(&self, frame: impl Into<String>) -> bool {
        match &self.tx {
            Some(tx) => tx.send(Ok(frame.into())).is_ok(),
            None => false,
        }
    }

    /// Inject a transport failure into the server's read half
    pub fn fail(&self, error: TransportError) -> bool {
        match &self.tx {
            Some(tx) => tx.send(Err(error)).is_ok(),
            None => false,
        }
    }

    /// Stop sending; the server sees end of stream
    pub fn disconnect(&mut self) {
        self.tx = None;
    }

    /// Next frame written by the server, `None` after the server closed
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Frame already written by the server, if any
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Whether the server closed its write half
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Message store that assigns increasing ids and keeps every message
///
/// A failing store answers every write with a database error.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: AtomicI64,
    fail: bool,
    messages: Mutex<Vec<ChatMessage>>,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every message accepted so far, oldest first
    pub fn stored(&self) -> Vec<ChatMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn store_message(
        &self,
        room_id: i64,
        sender_id: i64,
        content: &str,
    ) -> Result<ChatMessage, StoreError> {
        if self.fail {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let message = ChatMessage {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            room_id,
            sender_id,
            content: content.to_string(),
            sent_at: Utc::now(),
        };
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(message)
    }
}
