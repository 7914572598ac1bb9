//! Integration tests for [`RealtimeNotifier`] against a local axum
//! websocket endpoint.

mod common;

use std::time::Duration;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::Query;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use gallery_client::client::NotifierClient;
use gallery_client::events::NotifierEvent;
use gallery_client::notifier::RealtimeNotifier;
use gallery_core::backoff::BackoffConfig;
use std::collections::HashMap;
use tokio::sync::broadcast;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn fast_backoff() -> BackoffConfig {
    BackoffConfig {
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(100),
        multiplier: 2.0,
    }
}

/// Websocket handler that echoes the received token in a `created` event,
/// then sends a `modified` event and closes.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token_id: i64 = params
        .get("token")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);

    ws.on_upgrade(move |mut socket| async move {
        let created = format!(r#"{{"event":"created","image_id":{token_id}}}"#);
        let _ = socket.send(Message::Text(created.into())).await;
        let _ = socket.send(Message::Text("garbage".into())).await;
        let _ = socket
            .send(Message::Text(r#"{"event":"modified","image_id":7}"#.into()))
            .await;
        let _ = socket.send(Message::Close(None)).await;
    })
}

async fn recv(rx: &mut broadcast::Receiver<NotifierEvent>) -> NotifierEvent {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("event within timeout")
        .expect("channel open")
}

// ---------------------------------------------------------------------------
// Test: events flow from the socket to subscribers, then reconnect happens
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notifier_broadcasts_events_and_reconnects() {
    let app = Router::new().route("/ws/image-updates", get(ws_handler));
    let addr = common::spawn_server(app).await;

    let client = NotifierClient::new(
        format!("ws://{addr}/ws/image-updates"),
        Some("41".into()),
    );
    let notifier = RealtimeNotifier::start(client, fast_backoff());
    let mut rx = notifier.subscribe();

    assert_eq!(recv(&mut rx).await, NotifierEvent::Connected);
    assert_eq!(
        recv(&mut rx).await,
        NotifierEvent::ItemCreated {
            item_id: Some(41),
            path: None
        }
    );
    assert_eq!(recv(&mut rx).await.item_id(), Some(7));
    assert_eq!(recv(&mut rx).await, NotifierEvent::Disconnected);

    // The server closed the session; the task reconnects on its own.
    assert_eq!(recv(&mut rx).await, NotifierEvent::Connected);

    notifier.shutdown().await;
    assert!(!notifier.is_connected());
}

// ---------------------------------------------------------------------------
// Test: shutdown stops a notifier that never managed to connect
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_while_unreachable() {
    let client = NotifierClient::new("ws://127.0.0.1:1/ws".into(), None);
    let notifier = RealtimeNotifier::start(client, fast_backoff());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!notifier.is_connected());

    tokio::time::timeout(RECV_TIMEOUT, notifier.shutdown())
        .await
        .expect("shutdown completes");
}
