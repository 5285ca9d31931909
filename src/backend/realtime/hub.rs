/**
 * Room Hub
 *
 * One actor task per room. The actor owns the member set; the only way to
 * change it is through the hub's mailbox, which carries register,
 * unregister and broadcast events. A single mailbox keeps the events in
 * submission order: a caller that unregisters and then broadcasts never
 * sees its broadcast delivered to the removed member.
 *
 * # Backpressure
 *
 * Broadcast uses a non-blocking enqueue. A member whose outbound queue is
 * full or closed is evicted on the spot and its queue closed. The hub
 * never waits on a consumer.
 *
 * # Maintenance
 *
 * A ticker fires every `tick_interval`. Each tick prunes members whose send
 * loop has gone away and, if the room has been empty for at least
 * `idle_timeout`, retires the hub: its registry entry is removed and its
 * mailbox closed, so later lookups create a fresh hub.
 */
use std::collections::HashMap;
use std::future::pending;
use std::sync::{Arc, PoisonError, Weak};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::connection::{Connection, ConnectionId, Frame};
use super::registry::RoomMap;

/// Hub tuning knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSettings {
    /// Period of the maintenance tick
    pub tick_interval: Duration,
    /// How long an empty hub lives; `None` keeps it forever
    pub idle_timeout: Option<Duration>,
    /// Capacity of the hub's mailbox
    pub mailbox_capacity: usize,
    /// Capacity of every connection's outbound queue
    pub outbound_capacity: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(300),
            idle_timeout: Some(Duration::from_secs(600)),
            mailbox_capacity: 64,
            outbound_capacity: 256,
        }
    }
}

/// Hub failures seen by callers
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HubError {
    /// The hub retired or was shut down
    #[error("hub for room {0} is closed")]
    Closed(i64),
}

enum HubEvent {
    Register {
        connection: Connection,
        ack: oneshot::Sender<()>,
    },
    Unregister(ConnectionId),
    Broadcast(Frame),
}

struct HubHandle {
    room_id: i64,
    events: mpsc::Sender<HubEvent>,
    members: watch::Receiver<usize>,
}

/// Cloneable handle to a running room hub
///
/// The actor exits once every handle is dropped, on registry shutdown, or
/// on idle retirement.
#[derive(Clone)]
pub struct RoomHub {
    inner: Arc<HubHandle>,
}

impl std::fmt::Debug for RoomHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHub")
            .field("room_id", &self.inner.room_id)
            .field("members", &self.member_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl RoomHub {
    /// Spawn a hub that is not tracked by any registry
    pub fn spawn(room_id: i64, settings: &HubSettings) -> Self {
        Self::start(room_id, settings, None, None)
    }

    /// Spawn a hub owned by a registry
    pub(crate) fn spawn_linked(
        room_id: i64,
        settings: &HubSettings,
        rooms: Weak<RoomMap>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self::start(room_id, settings, Some(rooms), Some(shutdown))
    }

    fn start(
        room_id: i64,
        settings: &HubSettings,
        rooms: Option<Weak<RoomMap>>,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> Self {
        let (events_tx, events) = mpsc::channel(settings.mailbox_capacity.max(1));
        let (member_tx, member_rx) = watch::channel(0);

        let inner = Arc::new(HubHandle {
            room_id,
            events: events_tx,
            members: member_rx,
        });

        let actor = HubActor {
            room_id,
            members: HashMap::new(),
            member_count: member_tx,
            events,
            shutdown,
            rooms,
            identity: Arc::downgrade(&inner),
            tick_interval: settings.tick_interval,
            idle_timeout: settings.idle_timeout,
            empty_since: Some(Instant::now()),
        };
        tokio::spawn(actor.run());

        Self { inner }
    }

    pub fn room_id(&self) -> i64 {
        self.inner.room_id
    }

    /// Number of members after the last applied event
    pub fn member_count(&self) -> usize {
        *self.inner.members.borrow()
    }

    /// True once the actor stopped accepting events
    pub fn is_closed(&self) -> bool {
        self.inner.events.is_closed()
    }

    /// Whether two handles point at the same hub instance
    pub fn same_instance(&self, other: &RoomHub) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn is_instance(&self, identity: &Weak<HubHandle>) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.inner), identity.as_ptr())
    }

    /// Add a connection to the member set
    ///
    /// Resolves once the hub applied the registration. Fails with
    /// [`HubError::Closed`] if the hub retired first; the connection is
    /// dropped in that case, which closes its queue.
    pub async fn register(&self, connection: Connection) -> Result<(), HubError> {
        let closed = HubError::Closed(self.inner.room_id);
        let (ack, confirmed) = oneshot::channel();
        self.inner
            .events
            .send(HubEvent::Register { connection, ack })
            .await
            .map_err(|_| closed)?;
        confirmed.await.map_err(|_| closed)
    }

    /// Remove a connection and close its queue
    ///
    /// Unknown ids are ignored. A closed hub has no members left, so this
    /// never fails.
    pub async fn unregister(&self, id: ConnectionId) {
        if self.inner.events.send(HubEvent::Unregister(id)).await.is_err() {
            tracing::debug!(
                "[Hub] Room {} already closed while unregistering {}",
                self.inner.room_id,
                id
            );
        }
    }

    /// Fan a serialized frame out to every member
    pub async fn broadcast(&self, frame: impl Into<Frame>) -> Result<(), HubError> {
        self.inner
            .events
            .send(HubEvent::Broadcast(frame.into()))
            .await
            .map_err(|_| HubError::Closed(self.inner.room_id))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum TickOutcome {
    Continue,
    Retire,
}

struct HubActor {
    room_id: i64,
    members: HashMap<ConnectionId, Connection>,
    member_count: watch::Sender<usize>,
    events: mpsc::Receiver<HubEvent>,
    shutdown: Option<watch::Receiver<bool>>,
    rooms: Option<Weak<RoomMap>>,
    identity: Weak<HubHandle>,
    tick_interval: Duration,
    idle_timeout: Option<Duration>,
    empty_since: Option<Instant>,
}

impl HubActor {
    async fn run(mut self) {
        let period = self.tick_interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!("[Hub] Room {} started", self.room_id);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut self.shutdown) => {
                    tracing::info!("[Hub] Room {} shutting down", self.room_id);
                    break;
                }
                event = self.events.recv() => match event {
                    Some(HubEvent::Register { connection, ack }) => self.on_register(connection, ack),
                    Some(HubEvent::Unregister(id)) => self.on_unregister(id),
                    Some(HubEvent::Broadcast(frame)) => self.on_broadcast(frame),
                    // Every handle dropped
                    None => break,
                },
                _ = ticker.tick() => {
                    if self.on_tick() == TickOutcome::Retire {
                        self.retire();
                        break;
                    }
                }
            }
        }

        self.members.clear();
        self.member_count.send_replace(0);
        tracing::debug!("[Hub] Room {} stopped", self.room_id);
    }

    fn on_register(&mut self, connection: Connection, ack: oneshot::Sender<()>) {
        let id = connection.id();
        let user_id = connection.user_id();

        if self.members.contains_key(&id) {
            tracing::debug!("[Hub] {} already registered in room {}", id, self.room_id);
        } else {
            self.members.insert(id, connection);
            tracing::info!("[Hub] User {} joined room {} ({})", user_id, self.room_id, id);
        }
        self.membership_changed();

        if ack.send(()).is_err() {
            tracing::debug!("[Hub] Registrant for {} went away before confirmation", id);
        }
    }

    fn on_unregister(&mut self, id: ConnectionId) {
        // Dropping the entry drops the only strong sender and closes the queue
        if let Some(connection) = self.members.remove(&id) {
            tracing::info!(
                "[Hub] User {} left room {} ({})",
                connection.user_id(),
                self.room_id,
                id
            );
            self.membership_changed();
        }
    }

    fn on_broadcast(&mut self, frame: Frame) {
        let room_id = self.room_id;
        let before = self.members.len();

        self.members
            .retain(|id, connection| match connection.try_deliver(&frame) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        "[Hub] Evicting slow consumer {} (user {}) from room {}",
                        id,
                        connection.user_id(),
                        room_id
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::info!("[Hub] Dropping closed connection {} from room {}", id, room_id);
                    false
                }
            });

        if self.members.len() != before {
            self.membership_changed();
        }
    }

    fn on_tick(&mut self) -> TickOutcome {
        let room_id = self.room_id;
        let before = self.members.len();
        self.members.retain(|id, connection| {
            let gone = connection.is_gone();
            if gone {
                tracing::info!("[Hub] Pruning dead connection {} from room {}", id, room_id);
            }
            !gone
        });
        if self.members.len() != before {
            self.membership_changed();
        }

        match (self.idle_timeout, self.empty_since) {
            (Some(timeout), Some(since)) if since.elapsed() >= timeout => TickOutcome::Retire,
            _ => TickOutcome::Continue,
        }
    }

    fn membership_changed(&mut self) {
        if self.members.is_empty() {
            self.empty_since.get_or_insert_with(Instant::now);
        } else {
            self.empty_since = None;
        }
        self.member_count.send_replace(self.members.len());
    }

    /// Leave the registry and stop accepting events
    ///
    /// The registry lock is held until the mailbox is closed, so no caller
    /// can obtain this hub from the registry and then reach an open
    /// mailbox.
    fn retire(&mut self) {
        let rooms = self.rooms.as_ref().and_then(Weak::upgrade);
        match rooms {
            Some(rooms) => {
                let mut rooms = rooms.lock().unwrap_or_else(PoisonError::into_inner);
                let is_current = rooms
                    .get(&self.room_id)
                    .is_some_and(|hub| hub.is_instance(&self.identity));
                if is_current {
                    rooms.remove(&self.room_id);
                }
                self.close_mailbox();
            }
            None => self.close_mailbox(),
        }
        tracing::info!("[Hub] Room {} retired after idling", self.room_id);
    }

    fn close_mailbox(&mut self) {
        self.events.close();

        // Registrants waiting here see their ack dropped and retry
        while let Ok(event) = self.events.try_recv() {
            if let HubEvent::Register { connection, .. } = event {
                tracing::debug!(
                    "[Hub] Rejecting late registration {} for room {}",
                    connection.id(),
                    self.room_id
                );
            }
        }
    }
}

async fn shutdown_requested(shutdown: &mut Option<watch::Receiver<bool>>) {
    match shutdown {
        Some(rx) => {
            if rx.wait_for(|stop| *stop).await.is_err() {
                // Registry dropped without shutting down
                pending::<()>().await;
            }
        }
        None => pending::<()>().await,
    }
}
