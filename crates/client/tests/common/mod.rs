//! Shared helpers for client integration tests.
//!
//! Stands up a throwaway axum server on an ephemeral local port so the
//! REST and websocket clients talk to a real socket.

use axum::Router;

/// Serve `app` on `127.0.0.1:<ephemeral>` and return its `host:port`.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    addr.to_string()
}
