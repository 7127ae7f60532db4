//! # Document API
//!
//! The transport seam between [`ManualStore`](super::store::ManualStore)
//! and Notion. Implementations speak raw Notion JSON; the store owns all
//! interpretation of it.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use super::errors::StoreResult;

/// Notion API version sent with every request
pub const NOTION_VERSION: &str = "2022-06-28";

/// Boxed future returned by [`DocumentApi`] calls
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// The subset of the Notion API the store relies on.
///
/// Non-2xx responses are reported as [`StoreError`](super::StoreError)
/// values built with `StoreError::from_response`.
pub trait DocumentApi: Send + Sync {
    /// `GET /databases/{id}`
    fn retrieve_database<'a>(&'a self, database_id: &'a str) -> ApiFuture<'a, Value>;

    /// `GET /pages/{id}`
    fn retrieve_page<'a>(&'a self, page_id: &'a str) -> ApiFuture<'a, Value>;

    /// `GET /blocks/{id}/children`
    fn list_block_children<'a>(&'a self, block_id: &'a str) -> ApiFuture<'a, Value>;

    /// `POST /databases/{id}/query`
    fn query_database<'a>(&'a self, database_id: &'a str, query: Value) -> ApiFuture<'a, Value>;

    /// `POST /pages`
    fn create_page(&self, body: Value) -> ApiFuture<'_, Value>;

    /// `PATCH /pages/{id}`
    fn update_page<'a>(&'a self, page_id: &'a str, body: Value) -> ApiFuture<'a, Value>;
}
