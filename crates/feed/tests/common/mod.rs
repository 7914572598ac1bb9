//! In-memory item sources for feed integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use async_trait::async_trait;
use gallery_core::item::Item;
use gallery_core::pagination::PageRequest;
use gallery_core::types::ItemId;
use gallery_feed::{FeedError, ItemSource};
use parking_lot::Mutex;
use tokio::sync::{mpsc, Semaphore};

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// Keyset-paginated backend over a fixed id list in server order.
pub struct MemoryBackend {
    ids: Vec<ItemId>,
    requests: Mutex<Vec<PageRequest>>,
}

impl MemoryBackend {
    pub fn new(ids: &[ItemId]) -> Self {
        Self {
            ids: ids.to_vec(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    fn page(&self, request: &PageRequest) -> Vec<Item> {
        let start = match &request.cursor {
            Some(cursor) => self
                .ids
                .iter()
                .position(|id| *id == cursor.last_id)
                .map(|p| p + 1)
                .unwrap_or(self.ids.len()),
            None => 0,
        };
        self.ids
            .iter()
            .skip(start)
            .take(request.page_size)
            .map(|id| Item::bare(*id))
            .collect()
    }
}

#[async_trait]
impl ItemSource for MemoryBackend {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Item>, FeedError> {
        self.requests.lock().push(request.clone());
        Ok(self.page(request))
    }
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// Replays canned responses in order; an empty page once the script runs out.
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Vec<Item>, FeedError>>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<Vec<ItemId>, FeedError>>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(|ids| ids.into_iter().map(Item::bare).collect()))
                    .collect(),
            ),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ItemSource for ScriptedSource {
    async fn fetch_page(&self, _request: &PageRequest) -> Result<Vec<Item>, FeedError> {
        *self.calls.lock() += 1;
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// GatedSource
// ---------------------------------------------------------------------------

/// Wraps another source and holds every request until the test releases a
/// permit. Each request announces itself on `started` first.
pub struct GatedSource<S> {
    inner: S,
    gate: Semaphore,
    started: mpsc::UnboundedSender<PageRequest>,
}

impl<S> GatedSource<S> {
    pub fn new(inner: S) -> (Self, mpsc::UnboundedReceiver<PageRequest>) {
        let (started, started_rx) = mpsc::unbounded_channel();
        (
            Self {
                inner,
                gate: Semaphore::new(0),
                started,
            },
            started_rx,
        )
    }

    /// Let `n` held requests through.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ItemSource> ItemSource for GatedSource<S> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Item>, FeedError> {
        let _ = self.started.send(request.clone());
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| FeedError::transport("gate closed"))?;
        permit.forget();
        self.inner.fetch_page(request).await
    }
}

pub fn ids_of(items: &[Item]) -> Vec<ItemId> {
    items.iter().map(|i| i.id).collect()
}
