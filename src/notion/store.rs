//! # Manual Store
//!
//! All interaction with the Notion database that holds the manuals.
//!
//! ## Collection resolution
//!
//! The configured identifier may name the database itself, a row page of
//! the database, or a page that embeds the database as a child block. The
//! store tries those three readings in order on first use and keeps the
//! answer for its own lifetime. Concurrent first calls may each run the
//! lookup; every lookup is read-only and converges on the same id, and the
//! first stored value wins.

use std::sync::{Arc, OnceLock};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::manual::mapper::{draft_properties, patch_properties, to_manual};
use crate::manual::{validate_new, validate_patch, Manual, ManualPatch, NewManual};

use super::api::DocumentApi;
use super::errors::{StoreError, StoreResult};

/// Rows fetched per query round trip
const QUERY_PAGE_SIZE: u64 = 100;

/// Which reading of the configured identifier matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Database,
    PageParent,
    ChildDatabase,
}

/// Notion-backed manual store
pub struct ManualStore {
    api: Arc<dyn DocumentApi>,
    configured_id: String,
    collection_id: OnceLock<String>,
}

impl ManualStore {
    /// Create a store; `configured_id` is trimmed
    pub fn new(api: Arc<dyn DocumentApi>, configured_id: &str) -> Self {
        Self {
            api,
            configured_id: configured_id.trim().to_string(),
            collection_id: OnceLock::new(),
        }
    }

    /// The cached collection id, if resolution already happened
    pub fn cached_collection_id(&self) -> Option<&str> {
        self.collection_id.get().map(String::as_str)
    }

    /// Resolve the database id, hitting the API only until the first success
    pub async fn resolve_collection_id(&self) -> StoreResult<String> {
        if let Some(id) = self.collection_id.get() {
            return Ok(id.clone());
        }

        let (resolved, how) = self.resolve_uncached().await?;
        info!(resolution = ?how, "notion database resolved");
        Ok(self.collection_id.get_or_init(|| resolved).clone())
    }

    async fn resolve_uncached(&self) -> StoreResult<(String, Resolution)> {
        let id = self.configured_id.as_str();

        match self.api.retrieve_database(id).await {
            Ok(database) if object_kind(&database) == Some("database") => {
                if let Some(found) = database.get("id").and_then(Value::as_str) {
                    return Ok((found.to_string(), Resolution::Database));
                }
            }
            Ok(_) => {}
            Err(e) if e.is_fatal_for_resolution() => return Err(e),
            Err(e) => debug!(error = %e, "configured id is not a database"),
        }

        let page = match self.api.retrieve_page(id).await {
            Ok(page) => page,
            Err(e) if e.is_fatal_for_resolution() => return Err(e),
            Err(e) => {
                debug!(error = %e, "configured id is not a page");
                return Err(StoreError::Resolution);
            }
        };

        if page.pointer("/parent/type").and_then(Value::as_str) == Some("database_id") {
            if let Some(parent) = page.pointer("/parent/database_id").and_then(Value::as_str) {
                return Ok((parent.to_string(), Resolution::PageParent));
            }
        }

        let children = match self.api.list_block_children(id).await {
            Ok(children) => children,
            Err(e) if e.is_fatal_for_resolution() => return Err(e),
            Err(e) => {
                debug!(error = %e, "could not list page children");
                return Err(StoreError::Resolution);
            }
        };

        children
            .get("results")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|block| block.get("type").and_then(Value::as_str) == Some("child_database"))
            .and_then(|block| block.get("id").and_then(Value::as_str))
            .map(|found| {
                info!(
                    "configured id is a container page; configuring the embedded database id directly skips two lookups"
                );
                (found.to_string(), Resolution::ChildDatabase)
            })
            .ok_or(StoreError::Resolution)
    }

    /// Every live manual, newest first
    pub async fn list_all(&self) -> StoreResult<Vec<Manual>> {
        let database_id = self.resolve_collection_id().await?;
        let mut manuals = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = json!({
                "sorts": [{ "timestamp": "created_time", "direction": "descending" }],
                "page_size": QUERY_PAGE_SIZE,
            });
            if let Some(cursor) = &cursor {
                query["start_cursor"] = json!(cursor);
            }

            let response = self.api.query_database(&database_id, query).await?;
            let results = response
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| StoreError::Decode("query response has no results".into()))?;
            manuals.extend(results.iter().map(to_manual));

            let has_more = response.get("has_more").and_then(Value::as_bool) == Some(true);
            cursor = response
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if !has_more || cursor.is_none() {
                break;
            }
        }

        debug!(count = manuals.len(), "listed manuals");
        Ok(manuals)
    }

    /// One manual by page id
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Manual> {
        let page = self
            .api
            .retrieve_page(id)
            .await
            .map_err(|e| not_found_or(e, id))?;

        if page.get("archived").and_then(Value::as_bool) == Some(true) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(to_manual(&page))
    }

    /// Validate and create a manual
    pub async fn create(&self, input: NewManual) -> StoreResult<Manual> {
        let draft = validate_new(input)?;
        let database_id = self.resolve_collection_id().await?;

        let page = self
            .api
            .create_page(json!({
                "parent": { "database_id": database_id },
                "properties": draft_properties(&draft),
            }))
            .await?;

        let manual = to_manual(&page);
        info!(id = %manual.id, "manual created");
        Ok(manual)
    }

    /// Apply the fields present in `patch`
    pub async fn update(&self, id: &str, patch: ManualPatch) -> StoreResult<Manual> {
        let patch = validate_patch(patch)?;
        if patch.is_empty() {
            return self.get_by_id(id).await;
        }

        let page = self
            .api
            .update_page(id, json!({ "properties": patch_properties(&patch) }))
            .await
            .map_err(|e| not_found_or(e, id))?;

        info!(id, "manual updated");
        Ok(to_manual(&page))
    }

    /// Archive a manual; the store keeps it but stops listing it
    pub async fn archive(&self, id: &str) -> StoreResult<()> {
        self.api
            .update_page(id, json!({ "archived": true }))
            .await
            .map_err(|e| not_found_or(e, id))?;

        info!(id, "manual archived");
        Ok(())
    }
}

impl std::fmt::Debug for ManualStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualStore")
            .field("resolved", &self.collection_id.get().is_some())
            .finish_non_exhaustive()
    }
}

fn object_kind(value: &Value) -> Option<&str> {
    value.get("object").and_then(Value::as_str)
}

fn not_found_or(err: StoreError, id: &str) -> StoreError {
    if err.is_object_missing() {
        warn!(id, "manual not found");
        StoreError::NotFound(id.to_string())
    } else {
        err
    }
}
