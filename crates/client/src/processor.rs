//! Websocket message processing loop.
//!
//! Reads raw frames from a notifier connection, parses them into typed
//! [`NotifierMessage`](crate::messages::NotifierMessage) variants and
//! emits [`NotifierEvent`]s to the broadcast channel.

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;

use crate::events::NotifierEvent;
use crate::messages::parse_message;

/// Why a processing loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server closed the connection or the stream was exhausted.
    Closed,
    /// A receive error ended the connection.
    Failed,
    /// The cancellation token fired.
    Cancelled,
}

/// Process messages from a notifier connection.
///
/// Loops until the websocket closes, encounters a receive error, or
/// `cancel` fires. Each text frame is parsed and forwarded as a
/// [`NotifierEvent`]; frames that fail to parse are logged and skipped.
pub async fn process_messages<S>(
    ws_stream: &mut S,
    event_tx: &broadcast::Sender<NotifierEvent>,
    cancel: &CancellationToken,
) -> StreamEnd
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return StreamEnd::Cancelled,
            next = ws_stream.next() => next,
        };

        match next {
            Some(Ok(Message::Text(text))) => {
                handle_text_message(text.as_str(), event_tx);
            }
            Some(Ok(Message::Binary(_))) => {
                tracing::trace!("Ignoring binary notifier frame");
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                // Handled automatically by tungstenite.
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(?frame, "Notifier websocket closed");
                return StreamEnd::Closed;
            }
            Some(Ok(Message::Frame(_))) => {}
            Some(Err(e)) => {
                tracing::error!(error = %e, "Notifier websocket receive error");
                return StreamEnd::Failed;
            }
            None => {
                tracing::info!("Notifier websocket stream exhausted");
                return StreamEnd::Closed;
            }
        }
    }
}

/// Parse a single text frame and broadcast it.
fn handle_text_message(text: &str, event_tx: &broadcast::Sender<NotifierEvent>) {
    match parse_message(text) {
        Ok(msg) => {
            let event = NotifierEvent::from(msg);
            tracing::debug!(item_id = event.item_id(), ?event, "Notifier event");
            // Zero receivers is fine; nobody is listening right now.
            let _ = event_tx.send(event);
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                raw_message = %text,
                "Failed to parse notifier message",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    fn text(s: &str) -> Result<Message, WsError> {
        Ok(Message::Text(s.into()))
    }

    #[tokio::test]
    async fn text_frames_become_events_and_garbage_is_skipped() {
        let (tx, mut rx) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let mut frames = stream::iter(vec![
            text(r#"{"event":"created","image_id":1}"#),
            text("not json"),
            Ok(Message::Binary(vec![1, 2, 3].into())),
            text(r#"{"event":"deleted","path":"/x.jpg"}"#),
        ]);

        let end = process_messages(&mut frames, &tx, &cancel).await;
        assert_eq!(end, StreamEnd::Closed);

        assert_eq!(
            rx.recv().await.unwrap(),
            NotifierEvent::ItemCreated {
                item_id: Some(1),
                path: None
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            NotifierEvent::ItemDeleted {
                item_id: None,
                path: Some("/x.jpg".into())
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn close_frame_stops_processing() {
        let (tx, mut rx) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let mut frames = stream::iter(vec![
            Ok(Message::Close(None)),
            text(r#"{"event":"created","image_id":1}"#),
        ]);

        assert_eq!(
            process_messages(&mut frames, &tx, &cancel).await,
            StreamEnd::Closed
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn receive_error_reports_failure() {
        let (tx, _rx) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let mut frames = stream::iter(vec![Err(WsError::ConnectionClosed)]);

        assert_eq!(
            process_messages(&mut frames, &tx, &cancel).await,
            StreamEnd::Failed
        );
    }

    #[tokio::test]
    async fn cancellation_stops_a_silent_stream() {
        let (tx, _rx) = broadcast::channel::<NotifierEvent>(16);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut frames = stream::pending::<Result<Message, WsError>>();

        assert_eq!(
            process_messages(&mut frames, &tx, &cancel).await,
            StreamEnd::Cancelled
        );
    }
}
