//! Optimistic tag editing for a single item.
//!
//! A toggle is applied to the local [`TagSelection`] immediately and marked
//! uncommitted. [`TagEditor::commit`] sends the whole set to the backend;
//! if the backend rejects it, the local set is replaced by an authoritative
//! refetch instead of being rolled back by hand.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use gallery_client::api::GalleryApi;
use gallery_core::item::Tag;
use gallery_core::types::{ItemId, TagId};
use gallery_events::{EventBus, ItemEvent, ItemEventKind};

use crate::error::FeedError;

// ---------------------------------------------------------------------------
// TagStore seam
// ---------------------------------------------------------------------------

/// Backend operations the tag editor needs.
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn fetch_tags(&self, item_id: ItemId) -> Result<Vec<Tag>, FeedError>;
    async fn store_tags(&self, item_id: ItemId, tag_ids: &[TagId]) -> Result<(), FeedError>;
}

#[async_trait]
impl TagStore for GalleryApi {
    async fn fetch_tags(&self, item_id: ItemId) -> Result<Vec<Tag>, FeedError> {
        Ok(self.get_item_tags(item_id).await?)
    }

    async fn store_tags(&self, item_id: ItemId, tag_ids: &[TagId]) -> Result<(), FeedError> {
        Ok(self.set_item_tags(item_id, tag_ids).await?)
    }
}

#[async_trait]
impl<T: TagStore + ?Sized> TagStore for Arc<T> {
    async fn fetch_tags(&self, item_id: ItemId) -> Result<Vec<Tag>, FeedError> {
        (**self).fetch_tags(item_id).await
    }

    async fn store_tags(&self, item_id: ItemId, tag_ids: &[TagId]) -> Result<(), FeedError> {
        (**self).store_tags(item_id, tag_ids).await
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Local view of an item's tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSelection {
    pub tag_ids: BTreeSet<TagId>,
    /// `true` when `tag_ids` is known to match the backend.
    pub committed: bool,
}

impl TagSelection {
    fn committed(tags: &[Tag]) -> Self {
        Self {
            tag_ids: tags.iter().map(|t| t.id).collect(),
            committed: true,
        }
    }

    pub fn contains(&self, tag_id: TagId) -> bool {
        self.tag_ids.contains(&tag_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The tag was added (`active: true`) or removed locally.
    Applied { active: bool },
    /// Editing is not allowed; the host should search for items with this
    /// tag instead.
    SearchFor(TagId),
}

#[derive(Debug, thiserror::Error)]
pub enum TagEditError {
    #[error("Tag editing is not permitted for this session")]
    ReadOnly,

    /// The backend refused the update. The selection has been replaced by
    /// the authoritative set when `resynced` is `true`.
    #[error("Tag update rejected: {source}")]
    Rejected { source: FeedError, resynced: bool },
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

pub struct TagEditor<T> {
    store: T,
    bus: Arc<EventBus>,
    item_id: ItemId,
    can_modify: bool,
    selection: TagSelection,
}

impl<T: TagStore> TagEditor<T> {
    /// Load the authoritative tag set for `item_id`.
    pub async fn load(
        store: T,
        bus: Arc<EventBus>,
        item_id: ItemId,
        can_modify: bool,
    ) -> Result<Self, FeedError> {
        let tags = store.fetch_tags(item_id).await?;
        Ok(Self {
            store,
            bus,
            item_id,
            can_modify,
            selection: TagSelection::committed(&tags),
        })
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn can_modify(&self) -> bool {
        self.can_modify
    }

    pub fn selection(&self) -> &TagSelection {
        &self.selection
    }

    /// Flip `tag_id` in the local selection. Nothing is sent yet.
    pub fn toggle(&mut self, tag_id: TagId) -> ToggleOutcome {
        if !self.can_modify {
            return ToggleOutcome::SearchFor(tag_id);
        }

        let active = if self.selection.tag_ids.remove(&tag_id) {
            false
        } else {
            self.selection.tag_ids.insert(tag_id);
            true
        };
        self.selection.committed = false;
        ToggleOutcome::Applied { active }
    }

    /// Send the local selection to the backend.
    ///
    /// On success the selection becomes committed and a `TagsChanged`
    /// event is published. On rejection the selection is replaced by a
    /// fresh fetch; if that fetch fails too, the local set is kept and
    /// stays uncommitted.
    pub async fn commit(&mut self) -> Result<(), TagEditError> {
        if !self.can_modify {
            return Err(TagEditError::ReadOnly);
        }
        if self.selection.committed {
            return Ok(());
        }

        let tag_ids: Vec<TagId> = self.selection.tag_ids.iter().copied().collect();
        match self.store.store_tags(self.item_id, &tag_ids).await {
            Ok(()) => {
                self.selection.committed = true;
                self.bus
                    .publish(ItemEvent::new(self.item_id, ItemEventKind::TagsChanged));
                tracing::debug!(item_id = self.item_id, count = tag_ids.len(), "Tags committed");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(item_id = self.item_id, error = %source, "Tag update rejected, resyncing");
                let resynced = self.refresh().await.is_ok();
                Err(TagEditError::Rejected { source, resynced })
            }
        }
    }

    /// Toggle and commit in one step.
    pub async fn toggle_and_commit(&mut self, tag_id: TagId) -> Result<ToggleOutcome, TagEditError> {
        let outcome = self.toggle(tag_id);
        if let ToggleOutcome::Applied { .. } = outcome {
            self.commit().await?;
        }
        Ok(outcome)
    }

    /// Replace the local selection with the backend's current set.
    pub async fn refresh(&mut self) -> Result<(), FeedError> {
        match self.store.fetch_tags(self.item_id).await {
            Ok(tags) => {
                self.selection = TagSelection::committed(&tags);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(item_id = self.item_id, error = %e, "Failed to refetch tags");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct MemoryTags {
        tags: Mutex<HashMap<ItemId, Vec<TagId>>>,
        reject_writes: bool,
        fail_reads_after_write: bool,
        writes: Mutex<usize>,
    }

    fn tag(id: TagId) -> Tag {
        Tag {
            id,
            name: format!("tag{id}"),
            color: None,
            icon: None,
            text_color: None,
            admin_only: false,
            built_in: false,
        }
    }

    #[async_trait]
    impl TagStore for MemoryTags {
        async fn fetch_tags(&self, item_id: ItemId) -> Result<Vec<Tag>, FeedError> {
            if self.fail_reads_after_write && *self.writes.lock() > 0 {
                return Err(FeedError::transport("offline"));
            }
            Ok(self
                .tags
                .lock()
                .get(&item_id)
                .map(|ids| ids.iter().map(|id| tag(*id)).collect())
                .unwrap_or_default())
        }

        async fn store_tags(&self, item_id: ItemId, tag_ids: &[TagId]) -> Result<(), FeedError> {
            *self.writes.lock() += 1;
            if self.reject_writes {
                return Err(FeedError::Transport {
                    status: Some(403),
                    message: "forbidden".into(),
                });
            }
            self.tags.lock().insert(item_id, tag_ids.to_vec());
            Ok(())
        }
    }

    fn store_with(item_id: ItemId, ids: &[TagId]) -> MemoryTags {
        let store = MemoryTags::default();
        store.tags.lock().insert(item_id, ids.to_vec());
        store
    }

    #[tokio::test]
    async fn load_is_committed() {
        let editor = TagEditor::load(store_with(1, &[3]), Arc::new(EventBus::default()), 1, true)
            .await
            .unwrap();
        assert!(editor.selection().committed);
        assert!(editor.selection().contains(3));
    }

    #[tokio::test]
    async fn toggle_applies_locally_and_marks_uncommitted() {
        let mut editor =
            TagEditor::load(store_with(1, &[3]), Arc::new(EventBus::default()), 1, true)
                .await
                .unwrap();

        assert_eq!(editor.toggle(4), ToggleOutcome::Applied { active: true });
        assert_eq!(editor.toggle(3), ToggleOutcome::Applied { active: false });
        assert!(!editor.selection().committed);
        assert_eq!(editor.selection().tag_ids, BTreeSet::from([4]));
    }

    #[tokio::test]
    async fn commit_success_publishes_event() {
        let bus = Arc::new(EventBus::default());
        let mut sub = bus.subscribe_to(1);
        let store = Arc::new(store_with(1, &[]));
        let mut editor = TagEditor::load(Arc::clone(&store), Arc::clone(&bus), 1, true)
            .await
            .unwrap();

        editor.toggle_and_commit(5).await.unwrap();

        assert!(editor.selection().committed);
        assert_eq!(store.tags.lock().get(&1), Some(&vec![5]));
        let event = sub.recv().await.unwrap();
        assert_eq!(event.kind, ItemEventKind::TagsChanged);
    }

    #[tokio::test]
    async fn rejected_commit_resyncs_from_backend() {
        let store = MemoryTags {
            reject_writes: true,
            ..store_with(1, &[3])
        };
        let mut editor = TagEditor::load(store, Arc::new(EventBus::default()), 1, true)
            .await
            .unwrap();

        let err = editor.toggle_and_commit(9).await.unwrap_err();
        assert_matches!(err, TagEditError::Rejected { resynced: true, .. });
        assert!(editor.selection().committed);
        assert_eq!(editor.selection().tag_ids, BTreeSet::from([3]));
    }

    #[tokio::test]
    async fn rejected_commit_without_resync_keeps_local_uncommitted() {
        let store = MemoryTags {
            reject_writes: true,
            fail_reads_after_write: true,
            ..store_with(1, &[3])
        };
        let mut editor = TagEditor::load(store, Arc::new(EventBus::default()), 1, true)
            .await
            .unwrap();

        let err = editor.toggle_and_commit(9).await.unwrap_err();
        assert_matches!(err, TagEditError::Rejected { resynced: false, .. });
        assert!(!editor.selection().committed);
        assert!(editor.selection().contains(9));
    }

    #[tokio::test]
    async fn read_only_editor_suggests_search() {
        let store = Arc::new(store_with(1, &[3]));
        let mut editor = TagEditor::load(Arc::clone(&store), Arc::new(EventBus::default()), 1, false)
            .await
            .unwrap();

        assert_eq!(editor.toggle(3), ToggleOutcome::SearchFor(3));
        assert!(editor.selection().committed);
        assert_matches!(editor.commit().await, Err(TagEditError::ReadOnly));
        assert_eq!(*store.writes.lock(), 0);
    }

    #[tokio::test]
    async fn committed_selection_does_not_write() {
        let store = Arc::new(store_with(1, &[3]));
        let mut editor = TagEditor::load(Arc::clone(&store), Arc::new(EventBus::default()), 1, true)
            .await
            .unwrap();
        editor.commit().await.unwrap();
        assert_eq!(*store.writes.lock(), 0);
    }
}
