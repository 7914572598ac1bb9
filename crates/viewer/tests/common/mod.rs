//! Shared helpers for viewer integration tests.
//!
//! Stands up a throwaway axum backend on an ephemeral local port so the
//! session fallback runs against real HTTP status codes.

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
