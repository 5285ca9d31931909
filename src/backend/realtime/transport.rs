/**
 * Frame Transport Abstraction
 *
 * The real-time core never touches a socket directly. A client transport
 * is split into a write half ([`FrameSink`]) owned by the send loop and a
 * read half ([`FrameSource`]) owned by the receive loop.
 *
 * Implementations are provided for the two halves of an axum `WebSocket`
 * and, in `memory`, for an in-process channel pair.
 */
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;

/// Transport-level failures
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer or the local side already closed the transport
    #[error("transport closed")]
    Closed,

    /// A frame arrived that cannot be read as text
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Underlying I/O or protocol failure
    #[error("transport error: {0}")]
    Io(String),
}

/// Write half of a client transport
#[async_trait]
pub trait FrameSink: Send {
    /// Write one text frame
    async fn send_frame(&mut self, frame: &str) -> Result<(), TransportError>;

    /// Close the transport; closing twice is allowed to fail
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Read half of a client transport
#[async_trait]
pub trait FrameSource: Send {
    /// Next text frame, or `None` once the peer has gone away
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>>;
}

#[async_trait]
impl FrameSink for SplitSink<WebSocket, Message> {
    async fn send_frame(&mut self, frame: &str) -> Result<(), TransportError> {
        self.send(Message::Text(frame.to_owned().into()))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        SinkExt::close(self)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}

#[async_trait]
impl FrameSource for SplitStream<WebSocket> {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            let message = match self.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::Io(e.to_string()))),
            };

            match message {
                Message::Text(text) => return Some(Ok(text.as_str().to_owned())),
                Message::Binary(bytes) => {
                    return Some(
                        String::from_utf8(bytes.to_vec())
                            .map_err(|e| TransportError::InvalidFrame(e.to_string())),
                    )
                }
                Message::Close(_) => return None,
                // axum answers pings itself
                Message::Ping(_) | Message::Pong(_) => continue,
            }
        }
    }
}
