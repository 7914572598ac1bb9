//! Websocket client for the backend's realtime notifier.
//!
//! [`NotifierClient`] holds the connection configuration. Call
//! [`NotifierClient::connect`] to establish a live [`NotifierConnection`].

use gallery_core::types::Timestamp;
use tokio_tungstenite::{connect_async, MaybeTlsStream};

/// Raw websocket stream type used by the notifier.
pub type NotifierStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Configuration handle for the realtime notifier endpoint.
#[derive(Debug, Clone)]
pub struct NotifierClient {
    ws_url: String,
    token: Option<String>,
}

/// A live websocket connection to the notifier.
pub struct NotifierConnection {
    /// The URL actually connected to (token redacted).
    pub url: String,
    pub connected_at: Timestamp,
    /// The raw websocket stream for reading frames.
    pub ws_stream: NotifierStream,
}

impl NotifierClient {
    /// * `ws_url` - Websocket URL, e.g. `ws://host:8000/ws/image-updates`.
    /// * `token`  - Optional session token; anonymous when `None`.
    pub fn new(ws_url: String, token: Option<String>) -> Self {
        Self { ws_url, token }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Full connection URL, with the token appended as a `token` query
    /// parameter when one is configured.
    pub fn connect_url(&self) -> Result<String, NotifierClientError> {
        let mut url = reqwest::Url::parse(&self.ws_url)
            .map_err(|e| NotifierClientError::InvalidUrl(format!("{}: {e}", self.ws_url)))?;
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url.to_string())
    }

    /// Connect to the notifier websocket endpoint.
    pub async fn connect(&self) -> Result<NotifierConnection, NotifierClientError> {
        let url = self.connect_url()?;

        let (ws_stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
            NotifierClientError::Connection(format!(
                "Failed to connect to notifier at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::info!(
            authenticated = self.is_authenticated(),
            "Connected to realtime notifier at {}",
            self.ws_url,
        );

        Ok(NotifierConnection {
            url: self.ws_url.clone(),
            connected_at: chrono::Utc::now(),
            ws_stream,
        })
    }
}

/// Errors that can occur when working with the websocket client.
#[derive(Debug, thiserror::Error)]
pub enum NotifierClientError {
    /// The configured URL could not be parsed.
    #[error("Invalid notifier URL: {0}")]
    InvalidUrl(String),

    /// Failed to establish the websocket connection.
    #[error("Connection error: {0}")]
    Connection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_url_has_no_query() {
        let client = NotifierClient::new("ws://host:8000/ws/image-updates".into(), None);
        assert_eq!(
            client.connect_url().unwrap(),
            "ws://host:8000/ws/image-updates"
        );
        assert!(!client.is_authenticated());
    }

    #[test]
    fn token_is_url_encoded() {
        let client = NotifierClient::new("ws://host/ws".into(), Some("a b+c".into()));
        let url = client.connect_url().unwrap();
        assert!(url.starts_with("ws://host/ws?token="));
        assert!(url.ends_with("token=a+b%2Bc"));
    }

    #[test]
    fn invalid_url_is_reported() {
        let client = NotifierClient::new("not a url".into(), None);
        assert!(matches!(
            client.connect_url(),
            Err(NotifierClientError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let client = NotifierClient::new("ws://127.0.0.1:1/ws".into(), None);
        assert!(matches!(
            client.connect().await,
            Err(NotifierClientError::Connection(_))
        ));
    }
}
