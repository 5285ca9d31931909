/**
 * Hub Registry
 *
 * Maps room ids to their running [`RoomHub`]. Hubs are created lazily on
 * first lookup. One registry-wide lock guards lookup-or-insert, so
 * concurrent first lookups for the same room all get the same instance.
 *
 * The registry is an ordinary value owned by the application state; it is
 * cheap to clone and every clone sees the same rooms.
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};

use super::connection::{Connection, ConnectionId, Frame, Replier};
use super::hub::{HubError, HubSettings, RoomHub};

pub(crate) type RoomMap = Mutex<HashMap<i64, RoomHub>>;

/// Attempts `join` makes before giving up on a room whose hubs keep retiring
const JOIN_ATTEMPTS: usize = 3;

/// Room id to hub lookup table
#[derive(Clone)]
pub struct HubRegistry {
    rooms: Arc<RoomMap>,
    settings: HubSettings,
    shutdown: Arc<watch::Sender<bool>>,
}

/// A connection registered with its room's hub
///
/// Holds everything the two connection loops need: the hub to talk to, a
/// replier for acks and errors, and the outbound queue to drain.
#[derive(Debug)]
pub struct Membership {
    pub id: ConnectionId,
    pub user_id: i64,
    pub room_id: i64,
    pub hub: RoomHub,
    pub replier: Replier,
    pub outbound: mpsc::Receiver<Frame>,
}

impl HubRegistry {
    pub fn new(settings: HubSettings) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            settings,
            shutdown: Arc::new(shutdown),
        }
    }

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, RoomHub>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hub for `room_id`, spawning it if the room has none
    pub fn get_or_create(&self, room_id: i64) -> RoomHub {
        let mut rooms = self.lock();

        if let Some(hub) = rooms.get(&room_id) {
            if !hub.is_closed() {
                return hub.clone();
            }
            tracing::warn!("[Hub] Replacing stopped hub for room {}", room_id);
        }

        let hub = RoomHub::spawn_linked(
            room_id,
            &self.settings,
            Arc::downgrade(&self.rooms),
            self.shutdown.subscribe(),
        );
        rooms.insert(room_id, hub.clone());
        tracing::info!("[Hub] Created hub for room {}", room_id);
        hub
    }

    /// Hub for `room_id` if one is running
    pub fn get(&self, room_id: i64) -> Option<RoomHub> {
        self.lock()
            .get(&room_id)
            .filter(|hub| !hub.is_closed())
            .cloned()
    }

    /// Open a connection for `user_id` and register it with the room's hub
    ///
    /// A hub can retire between lookup and registration; in that case the
    /// registration is retried against a fresh hub.
    pub async fn join(&self, user_id: i64, room_id: i64) -> Result<Membership, HubError> {
        for attempt in 1..=JOIN_ATTEMPTS {
            let hub = self.get_or_create(room_id);
            let (connection, outbound) =
                Connection::open(user_id, room_id, self.settings.outbound_capacity);
            let id = connection.id();
            let replier = connection.replier();

            match hub.register(connection).await {
                Ok(()) => {
                    return Ok(Membership {
                        id,
                        user_id,
                        room_id,
                        hub,
                        replier,
                        outbound,
                    })
                }
                Err(HubError::Closed(_)) => {
                    tracing::debug!(
                        "[Hub] Hub for room {} closed during join (attempt {})",
                        room_id,
                        attempt
                    );
                }
            }
        }

        Err(HubError::Closed(room_id))
    }

    pub fn room_count(&self) -> usize {
        self.lock().len()
    }

    pub fn contains(&self, room_id: i64) -> bool {
        self.lock().contains_key(&room_id)
    }

    /// Stop every hub and forget all rooms
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let stopped = {
            let mut rooms = self.lock();
            let count = rooms.len();
            rooms.clear();
            count
        };
        tracing::info!("[Hub] Registry shut down ({} hubs stopped)", stopped);
    }
}

impl Default for HubRegistry {
    fn default() -> Self {
        Self::new(HubSettings::default())
    }
}

impl std::fmt::Debug for HubRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubRegistry")
            .field("rooms", &self.room_count())
            .field("settings", &self.settings)
            .finish()
    }
}
