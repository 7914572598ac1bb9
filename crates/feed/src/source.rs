//! Async seams between the feed and the backend.
//!
//! [`ItemSource`] is how the controller fetches pages; [`ItemLookup`] is
//! how hosts fetch a single item out-of-band. Both are implemented for
//! [`GalleryApi`] and for `Arc<T>` so test doubles and shared clients plug
//! in the same way.

use std::sync::Arc;

use async_trait::async_trait;
use gallery_client::api::GalleryApi;
use gallery_core::item::Item;
use gallery_core::pagination::PageRequest;
use gallery_core::types::ItemId;

use crate::error::FeedError;

/// Source of item pages.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch the page described by `request`, in server order.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Item>, FeedError>;
}

/// Single-item lookup.
#[async_trait]
pub trait ItemLookup: Send + Sync {
    async fn fetch_item(&self, item_id: ItemId) -> Result<Item, FeedError>;
}

#[async_trait]
impl ItemSource for GalleryApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Item>, FeedError> {
        Ok(self.list_items(request).await?)
    }
}

#[async_trait]
impl ItemLookup for GalleryApi {
    async fn fetch_item(&self, item_id: ItemId) -> Result<Item, FeedError> {
        Ok(self.get_item(item_id).await?)
    }
}

#[async_trait]
impl<T: ItemSource + ?Sized> ItemSource for Arc<T> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Item>, FeedError> {
        (**self).fetch_page(request).await
    }
}

#[async_trait]
impl<T: ItemLookup + ?Sized> ItemLookup for Arc<T> {
    async fn fetch_item(&self, item_id: ItemId) -> Result<Item, FeedError> {
        (**self).fetch_item(item_id).await
    }
}
