//! Session fallback.
//!
//! When the backend rejects the session's token the feed built under it is
//! no longer trustworthy: the viewer signs out and starts the feed over as
//! an anonymous session.

use gallery_client::api::GalleryApi;
use gallery_feed::{FeedController, FeedError, ItemSource};

/// Sign `api` out and reset `feed` with its current viewing context.
///
/// Returns `false`, leaving the feed alone, when the session was already
/// anonymous.
pub fn fall_back_to_anonymous<S: ItemSource>(api: &GalleryApi, feed: &FeedController<S>) -> bool {
    if !api.sign_out() {
        return false;
    }
    feed.reload();
    true
}

/// Apply `fall_back_to_anonymous` if `error` is a rejected session.
pub fn handle_rejection<S: ItemSource>(
    error: &FeedError,
    api: &GalleryApi,
    feed: &FeedController<S>,
) -> bool {
    error.is_unauthorized() && fall_back_to_anonymous(api, feed)
}
