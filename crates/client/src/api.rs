//! REST API client for the gallery backend.
//!
//! Wraps the item and tag HTTP endpoints (page listing, single-item
//! lookup, tag retrieval and replacement) using [`reqwest`].

use std::sync::Arc;

use gallery_core::item::{Item, Tag};
use gallery_core::pagination::PageRequest;
use gallery_core::types::{ItemId, TagId};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::ClientConfig;

/// HTTP client for one gallery backend.
///
/// Clones share one session: [`GalleryApi::sign_out`] on any clone makes
/// every clone anonymous.
#[derive(Clone)]
pub struct GalleryApi {
    client: reqwest::Client,
    api_url: String,
    token: Arc<RwLock<Option<String>>>,
}

/// Errors from the gallery REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum GalleryApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Gallery API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GalleryApiError {
    /// `true` when the backend rejected the session credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GalleryApiError::ApiError { status: 401, .. })
    }
}

#[derive(Serialize)]
struct TagUpdate<'a> {
    tag_ids: &'a [TagId],
}

impl GalleryApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000`.
    /// * `token`   - Optional bearer token attached to every request.
    pub fn new(api_url: String, token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, token)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, token: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(token)),
        }
    }

    /// Build a client with the configured request timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self, GalleryApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(
            client,
            config.api_url.clone(),
            config.token.clone(),
        ))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Drop the bearer token; later requests are anonymous. Returns `false`
    /// if the session was already anonymous.
    pub fn sign_out(&self) -> bool {
        let signed_out = self.token.write().take().is_some();
        if signed_out {
            tracing::info!(api_url = %self.api_url, "Signed out, continuing anonymously");
        }
        signed_out
    }

    /// Fetch one page of items.
    ///
    /// Sends `GET /api/images/` with the page size, the viewing context
    /// and, after the first page, the keyset cursor. An empty JSON array is
    /// a valid, empty page.
    pub async fn list_items(&self, request: &PageRequest) -> Result<Vec<Item>, GalleryApiError> {
        let response = self
            .authorized(self.client.get(format!("{}/api/images/", self.api_url)))
            .query(&page_query(request))
            .send()
            .await?;

        let items: Vec<Item> = Self::parse_response(response).await?;
        tracing::debug!(
            count = items.len(),
            page_size = request.page_size,
            last_id = request.cursor.as_ref().map(|c| c.last_id),
            "Fetched item page",
        );
        Ok(items)
    }

    /// Fetch the current representation of a single item.
    pub async fn get_item(&self, item_id: ItemId) -> Result<Item, GalleryApiError> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/api/images/{}", self.api_url, item_id)),
            )
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the tags currently attached to an item.
    pub async fn get_item_tags(&self, item_id: ItemId) -> Result<Vec<Tag>, GalleryApiError> {
        let response = self
            .authorized(self.client.get(format!("{}/api/tags/", self.api_url)))
            .query(&[("imageId", item_id.to_string())])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Replace an item's tag set.
    ///
    /// Sends `PUT /api/images/{id}/tags` with the complete list of tag ids.
    pub async fn set_item_tags(
        &self,
        item_id: ItemId,
        tag_ids: &[TagId],
    ) -> Result<(), GalleryApiError> {
        let response = self
            .authorized(
                self.client
                    .put(format!("{}/api/images/{}/tags", self.api_url, item_id)),
            )
            .json(&TagUpdate { tag_ids })
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ---- private helpers ----

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`GalleryApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GalleryApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GalleryApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    ///
    /// The body is read as text first so that a shape mismatch surfaces as
    /// [`GalleryApiError::Decode`] rather than a transport error.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GalleryApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), GalleryApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Query parameters for a page request, in the backend's naming.
///
/// `filter_ids` is an extension; backends that do not know it ignore it.
pub fn page_query(request: &PageRequest) -> Vec<(&'static str, String)> {
    let ctx = &request.context;
    let mut query = vec![
        ("limit", request.page_size.to_string()),
        ("sort_by", ctx.sort_key.as_str().to_string()),
        ("sort_order", ctx.sort_direction.as_str().to_string()),
    ];

    if let Some(term) = ctx.search_term() {
        query.push(("search_query", term.to_string()));
    }

    if !ctx.filter_ids.is_empty() {
        let ids: Vec<String> = ctx.filter_ids.iter().map(|id| id.to_string()).collect();
        query.push(("filter_ids", ids.join(",")));
    }

    if let Some(cursor) = &request.cursor {
        query.push(("last_id", cursor.last_id.to_string()));
        if let Some(value) = &cursor.last_sort_value {
            query.push(("last_sort_value", value.clone()));
        }
    }

    query
}
