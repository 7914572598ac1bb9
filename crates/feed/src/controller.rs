//! The feed controller.
//!
//! [`FeedController`] owns a [`FeedState`] behind a short, synchronous
//! lock that is never held across an `.await`. The only suspension point
//! is the [`ItemSource`] call inside [`FeedController::fetch_next`].
//!
//! Every fetch is tagged with the generation active when it was issued.
//! [`FeedController::reset`] bumps the generation, so a page that arrives
//! afterwards is recognised as stale and dropped without touching the new
//! feed.

use gallery_core::context::ViewingContext;
use gallery_core::item::Item;
use gallery_core::pagination::{clamp_page_size, Cursor, PageRequest};
use gallery_core::types::ItemId;
use parking_lot::Mutex;

use crate::error::FeedError;
use crate::source::ItemSource;
use crate::state::FeedState;

/// What a call to [`FeedController::fetch_next`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Another fetch was in flight or the feed is exhausted. The backend
    /// was not contacted and nothing changed.
    Skipped,
    /// A page was merged.
    Merged {
        /// Items appended after de-duplication.
        appended: usize,
        /// The page was short; no further fetches will be issued.
        exhausted: bool,
    },
    /// The feed was reset while the fetch was in flight; its page was
    /// discarded.
    Stale,
}

/// Point-in-time copy of the feed for rendering.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub generation: u64,
    pub context: ViewingContext,
    pub items: Vec<Item>,
    pub cursor: Option<Cursor>,
    pub has_more: bool,
    pub fetch_in_flight: bool,
    /// At least one fetch of this generation completed. Distinguishes an
    /// empty feed from one that has not loaded yet.
    pub loaded: bool,
}

/// Single owner and mutator of a paginated item feed.
pub struct FeedController<S> {
    source: S,
    page_size: usize,
    state: Mutex<FeedState>,
}

impl<S: ItemSource> FeedController<S> {
    /// Create a controller for `context`. `page_size` is clamped to the
    /// valid range.
    pub fn new(source: S, context: ViewingContext, page_size: usize) -> Self {
        Self {
            source,
            page_size: clamp_page_size(Some(page_size)),
            state: Mutex::new(FeedState::new(context, 1)),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Discard the feed and start over for `context`.
    ///
    /// Any fetch still in flight belongs to the previous generation; its
    /// result will be dropped when it arrives.
    pub fn reset(&self, context: ViewingContext) {
        let mut state = self.state.lock();
        let was_in_flight = state.fetch_in_flight;
        state.reset(context);
        tracing::debug!(
            generation = state.generation,
            abandoned_fetch = was_in_flight,
            sort_by = %state.context.sort_key,
            sort_order = %state.context.sort_direction,
            "Feed reset",
        );
    }

    /// Reset with the current viewing context, e.g. to retry after an
    /// error or after the session changed.
    pub fn reload(&self) {
        let context = self.context();
        self.reset(context);
    }

    /// Fetch and merge the next page.
    ///
    /// Returns [`FetchOutcome::Skipped`] immediately, without contacting
    /// the backend, if a fetch is already in flight or the feed is
    /// exhausted. On failure the feed stops paging (`has_more` becomes
    /// false) and the error is returned; items and cursor are unchanged.
    pub async fn fetch_next(&self) -> Result<FetchOutcome, FeedError> {
        let (request, generation) = {
            let mut state = self.state.lock();
            if state.fetch_in_flight || !state.has_more {
                return Ok(FetchOutcome::Skipped);
            }
            state.fetch_in_flight = true;
            (
                PageRequest {
                    page_size: self.page_size,
                    cursor: state.cursor.clone(),
                    context: state.context.clone(),
                },
                state.generation,
            )
        };

        // Clears the in-flight flag on every exit path, including when
        // this future is dropped mid-request.
        let _in_flight = InFlightGuard {
            state: &self.state,
            generation,
        };

        tracing::debug!(
            generation,
            last_id = request.cursor.as_ref().map(|c| c.last_id),
            page_size = request.page_size,
            "Fetching next page",
        );

        let result = self.source.fetch_page(&request).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(
                fetch_generation = generation,
                current_generation = state.generation,
                "Discarding stale page",
            );
            return Ok(FetchOutcome::Stale);
        }

        match result {
            Ok(page) => {
                let merged = state.merge_page(page, self.page_size);
                tracing::debug!(
                    generation,
                    received = merged.received,
                    appended = merged.appended,
                    total = state.items.len(),
                    exhausted = merged.exhausted,
                    "Page merged",
                );
                Ok(FetchOutcome::Merged {
                    appended: merged.appended,
                    exhausted: merged.exhausted,
                })
            }
            Err(e) => {
                state.fail();
                tracing::warn!(generation, error = %e, "Page fetch failed, paging stopped");
                Err(e)
            }
        }
    }

    // ---- read access ----

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.state.lock();
        FeedSnapshot {
            generation: state.generation,
            context: state.context.clone(),
            items: state.items.clone(),
            cursor: state.cursor.clone(),
            has_more: state.has_more,
            fetch_in_flight: state.fetch_in_flight,
            loaded: state.loaded,
        }
    }

    /// Run `f` against the current items without cloning them.
    pub fn with_items<R>(&self, f: impl FnOnce(&[Item]) -> R) -> R {
        f(&self.state.lock().items)
    }

    pub fn items(&self) -> Vec<Item> {
        self.with_items(|items| items.to_vec())
    }

    pub fn len(&self) -> usize {
        self.with_items(|items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().has_more
    }

    pub fn is_fetching(&self) -> bool {
        self.state.lock().fetch_in_flight
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn context(&self) -> ViewingContext {
        self.state.lock().context.clone()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.state.lock().cursor.clone()
    }

    pub fn get(&self, id: ItemId) -> Option<Item> {
        self.with_items(|items| items.iter().find(|i| i.id == id).cloned())
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.with_items(|items| items.iter().position(|i| i.id == id))
    }

    /// Items immediately before and after `id` in the loaded list, for
    /// previous/next navigation in a detail view.
    pub fn neighbours(&self, id: ItemId) -> (Option<Item>, Option<Item>) {
        self.with_items(|items| match items.iter().position(|i| i.id == id) {
            Some(idx) => (
                idx.checked_sub(1).and_then(|p| items.get(p)).cloned(),
                items.get(idx + 1).cloned(),
            ),
            None => (None, None),
        })
    }
}

/// Releases the in-flight flag of one generation on drop.
struct InFlightGuard<'a> {
    state: &'a Mutex<FeedState>,
    generation: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        // A reset already released the flag and a newer generation may own
        // it now.
        if state.generation == self.generation {
            state.fetch_in_flight = false;
        }
    }
}
