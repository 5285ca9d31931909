//! Room fan-out scenarios driven through full sessions

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use roomchat::backend::realtime::memory::{memory_transport, ClientEnd, MemoryStore};
use roomchat::backend::realtime::{
    serve_connection, Disconnect, HubError, HubRegistry, HubSettings, MessageStore,
};
use roomchat::shared::ServerFrame;
use serde_json::Value;
use tokio::task::JoinHandle;

type Session = JoinHandle<Result<Disconnect, HubError>>;

fn connect(
    registry: &HubRegistry,
    store: &Arc<MemoryStore>,
    user_id: i64,
    room_id: i64,
) -> (ClientEnd, Session) {
    let (sink, source, client) = memory_transport();
    let registry = registry.clone();
    let store: Arc<dyn MessageStore> = store.clone();
    let session = tokio::spawn(async move {
        serve_connection(&registry, store, user_id, room_id, sink, source).await
    });
    (client, session)
}

async fn wait_for_members(registry: &HubRegistry, room_id: i64, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if registry
                .get(room_id)
                .is_some_and(|hub| hub.member_count() == count)
            {
                return;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("room never reached the expected size");
}

async fn next_json(client: &mut ClientEnd) -> Value {
    let frame = client.recv().await.expect("client transport closed");
    serde_json::from_str(&frame).expect("server frames are JSON")
}

#[tokio::test]
async fn test_messages_stay_in_their_room() {
    let registry = HubRegistry::default();
    let store = Arc::new(MemoryStore::default());

    let (mut a, _a) = connect(&registry, &store, 1, 5);
    let (mut b, _b) = connect(&registry, &store, 2, 5);
    let (mut c, _c) = connect(&registry, &store, 3, 5);
    let (mut d, _d) = connect(&registry, &store, 4, 6);
    wait_for_members(&registry, 5, 3).await;
    wait_for_members(&registry, 6, 1).await;

    a.send(r#"{"type":"send_message","room_id":5,"content":"hi room five"}"#);

    for client in [&mut a, &mut b, &mut c] {
        let frame = next_json(client).await;
        assert_eq!(frame["type"], "message");
        assert_eq!(frame["room_id"], 5);
        assert_eq!(frame["sender_id"], 1);
        assert_eq!(frame["content"], "hi room five");
        assert_eq!(frame["id"], 1);
    }

    d.send(r#"{"type":"read"}"#);
    assert_eq!(next_json(&mut d).await["message"], "read received");

    let stored = store.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].room_id, 5);
}

#[tokio::test]
async fn test_room_id_in_envelope_is_ignored() {
    let registry = HubRegistry::default();
    let store = Arc::new(MemoryStore::default());

    let (mut a, _a) = connect(&registry, &store, 1, 7);
    let (mut other, _other) = connect(&registry, &store, 2, 8);
    wait_for_members(&registry, 7, 1).await;
    wait_for_members(&registry, 8, 1).await;

    a.send(r#"{"type":"send_message","room_id":8,"content":"sneaky"}"#);

    assert_eq!(next_json(&mut a).await["room_id"], 7);
    other.send(r#"{"type":"join","room_id":8}"#);
    assert_eq!(next_json(&mut other).await["message"], "joined room");
}

#[tokio::test]
async fn test_external_broadcast_reaches_sessions() {
    let registry = HubRegistry::default();
    let store = Arc::new(MemoryStore::default());

    let (mut a, _a) = connect(&registry, &store, 1, 9);
    let (mut b, _b) = connect(&registry, &store, 2, 9);
    wait_for_members(&registry, 9, 2).await;

    let hub = registry.get(9).expect("hub is live");
    let frame = ServerFrame::ack("announcement").encode().unwrap();
    hub.broadcast(frame).await.unwrap();

    for client in [&mut a, &mut b] {
        assert_eq!(next_json(client).await["message"], "announcement");
    }
}

#[tokio::test]
async fn test_leaving_client_stops_receiving() {
    let registry = HubRegistry::default();
    let store = Arc::new(MemoryStore::default());

    let (mut a, _a) = connect(&registry, &store, 1, 10);
    let (mut b, b_session) = connect(&registry, &store, 2, 10);
    wait_for_members(&registry, 10, 2).await;

    b.send(r#"{"type":"leave"}"#);
    assert_matches!(b_session.await.unwrap(), Ok(Disconnect::Left));
    wait_for_members(&registry, 10, 1).await;

    a.send(r#"{"type":"send_message","content":"anyone?"}"#);
    assert_eq!(next_json(&mut a).await["content"], "anyone?");

    assert_eq!(b.recv().await, None);
    assert!(b.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_idle_room_retires_and_reopens() {
    let registry = HubRegistry::new(HubSettings {
        tick_interval: Duration::from_secs(1),
        idle_timeout: Some(Duration::from_secs(2)),
        ..HubSettings::default()
    });
    let store = Arc::new(MemoryStore::default());

    let (client, session) = connect(&registry, &store, 1, 11);
    wait_for_members(&registry, 11, 1).await;
    let first = registry.get(11).expect("hub is live");

    client.send(r#"{"type":"leave"}"#);
    assert_matches!(session.await.unwrap(), Ok(Disconnect::Left));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!registry.contains(11));
    assert!(first.is_closed());

    let (mut again, _again) = connect(&registry, &store, 1, 11);
    wait_for_members(&registry, 11, 1).await;
    let second = registry.get(11).expect("fresh hub");
    assert!(!second.same_instance(&first));

    again.send(r#"{"type":"read"}"#);
    assert_eq!(next_json(&mut again).await["message"], "read received");
}

#[tokio::test]
async fn test_shutdown_closes_every_session() {
    let registry = HubRegistry::default();
    let store = Arc::new(MemoryStore::default());

    let (mut a, _a) = connect(&registry, &store, 1, 12);
    let (mut b, _b) = connect(&registry, &store, 2, 13);
    wait_for_members(&registry, 12, 1).await;
    wait_for_members(&registry, 13, 1).await;

    registry.shutdown();

    assert_eq!(a.recv().await, None);
    assert_eq!(b.recv().await, None);
    assert_eq!(registry.room_count(), 0);
}
