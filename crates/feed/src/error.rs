use gallery_client::api::GalleryApiError;

/// A page or item fetch that failed.
///
/// Cloneable so a single failure can be both recorded by the controller's
/// host and forwarded to UI reporting channels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// Backend unreachable, timed out, or answered with a non-success status.
    #[error("Failed to load items: {message}")]
    Transport {
        /// HTTP status when the backend answered at all.
        status: Option<u16>,
        message: String,
    },

    /// The payload was not an array of item records.
    #[error("Malformed item page: {0}")]
    Malformed(String),
}

impl FeedError {
    pub fn transport(message: impl Into<String>) -> Self {
        FeedError::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// `true` when the backend rejected the session; hosts reset the feed
    /// and drop back to anonymous browsing.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            FeedError::Transport {
                status: Some(401),
                ..
            }
        )
    }
}

impl From<GalleryApiError> for FeedError {
    fn from(err: GalleryApiError) -> Self {
        match err {
            GalleryApiError::Request(e) => FeedError::Transport {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            GalleryApiError::ApiError { status, body } => FeedError::Transport {
                status: Some(status),
                message: format!("backend returned {status}: {body}"),
            },
            GalleryApiError::Decode(e) => FeedError::Malformed(e.to_string()),
        }
    }
}
