/**
 * Connection Sessions
 *
 * Drives one authenticated client from registration to teardown:
 *
 * 1. Join the room through the registry
 * 2. Spawn the send loop over the outbound queue
 * 3. Run the receive loop on the calling task until it stops or the send
 *    loop ends (eviction or a failed write)
 * 4. Unregister, then wait for the send loop to flush and close the sink
 *
 * Closing the sink does not stop a peer from writing, so the receive loop
 * is cut off as soon as the send side is gone.
 */
use std::fmt;
use std::sync::Arc;

use tokio::task::JoinError;

use super::connection::{run_send_loop, ConnectionId};
use super::dispatch::{Dispatcher, Flow};
use super::hub::HubError;
use super::persistence::MessageStore;
use super::registry::HubRegistry;
use super::transport::{FrameSink, FrameSource, TransportError};

/// Why a receive loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// Client sent `leave`
    Left,
    /// Transport reached end of stream
    Closed,
    /// Transport read failed
    Failed,
    /// The room's hub stopped
    HubClosed,
    /// Outbound side ended first: the hub dropped the connection or a
    /// write failed
    Evicted,
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Left => "left",
            Self::Closed => "closed",
            Self::Failed => "transport error",
            Self::HubClosed => "hub closed",
            Self::Evicted => "evicted",
        };
        f.write_str(reason)
    }
}

/// Serve one client until it disconnects
///
/// Returns an error only if the room could not be joined; the sink is
/// closed in that case.
pub async fn serve_connection<S, R>(
    registry: &HubRegistry,
    store: Arc<dyn MessageStore>,
    user_id: i64,
    room_id: i64,
    mut sink: S,
    mut source: R,
) -> Result<Disconnect, HubError>
where
    S: FrameSink + 'static,
    R: FrameSource,
{
    let membership = match registry.join(user_id, room_id).await {
        Ok(membership) => membership,
        Err(e) => {
            tracing::warn!("[Realtime] User {} could not join room {}: {}", user_id, room_id, e);
            if let Err(e) = sink.close().await {
                tracing::debug!("[Realtime] Close after failed join reported: {}", e);
            }
            return Err(e);
        }
    };

    let id = membership.id;
    tracing::info!("[Realtime] User {} connected to room {} ({})", user_id, room_id, id);

    let mut send_task = tokio::spawn(run_send_loop(id, membership.outbound, sink));
    let dispatcher = Dispatcher::new(
        user_id,
        room_id,
        membership.hub.clone(),
        membership.replier,
        store,
    );

    let mut send_finished = false;
    let reason = tokio::select! {
        reason = receive_loop(&dispatcher, &mut source) => reason,
        joined = &mut send_task => {
            send_finished = true;
            log_send_exit(id, joined);
            Disconnect::Evicted
        }
    };

    membership.hub.unregister(id).await;
    if !send_finished {
        log_send_exit(id, send_task.await);
    }

    tracing::info!(
        "[Realtime] User {} disconnected from room {} ({})",
        user_id,
        room_id,
        reason
    );
    Ok(reason)
}

fn log_send_exit(id: ConnectionId, joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!("[Realtime] Send loop for {} panicked: {}", id, e);
    }
}

async fn receive_loop<R>(dispatcher: &Dispatcher, source: &mut R) -> Disconnect
where
    R: FrameSource,
{
    loop {
        let text = match source.next_frame().await {
            Some(Ok(text)) => text,
            Some(Err(TransportError::InvalidFrame(e))) => {
                tracing::debug!("[Realtime] Dropping unreadable frame: {}", e);
                dispatcher.reject_invalid();
                continue;
            }
            Some(Err(e)) => {
                tracing::info!("[Realtime] Read failed: {}", e);
                return Disconnect::Failed;
            }
            None => return Disconnect::Closed,
        };

        match dispatcher.handle(&text).await {
            Flow::Continue => {}
            Flow::Leave => return Disconnect::Left,
            Flow::HubClosed => return Disconnect::HubClosed,
        }
    }
}
