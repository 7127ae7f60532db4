//! # In-Memory Notion
//!
//! A [`DocumentApi`] that keeps databases, pages and child blocks in
//! process memory and mimics the response shapes and error codes of the
//! real API closely enough for the store to run against it. Used by tests
//! and by `start --in-memory` for local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::api::{ApiFuture, DocumentApi};
use super::errors::{StoreError, StoreResult};

/// Default and maximum page size of a database query
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Default)]
struct MemoryState {
    databases: Vec<String>,
    pages: Vec<Value>,
    children: HashMap<String, Vec<Value>>,
    ticks: i64,
    failure: Option<(u16, Value)>,
}

impl MemoryState {
    /// Logical clock: one second per write, starting 2024-01-01
    fn tick(&mut self) -> String {
        self.ticks += 1;
        let epoch: DateTime<Utc> = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        (epoch + Duration::seconds(self.ticks)).to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn page_mut(&mut self, page_id: &str) -> StoreResult<&mut Value> {
        self.pages
            .iter_mut()
            .find(|p| p["id"] == page_id)
            .ok_or_else(|| not_found("page", page_id))
    }

    fn has_page(&self, page_id: &str) -> bool {
        self.pages.iter().any(|p| p["id"] == page_id)
    }
}

/// In-memory Notion workspace
#[derive(Debug, Default)]
pub struct InMemoryNotion {
    state: RwLock<MemoryState>,
    requests: AtomicUsize,
}

impl InMemoryNotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workspace holding one empty database
    pub fn with_database(database_id: &str) -> Self {
        let notion = Self::new();
        notion.add_database(database_id);
        notion
    }

    /// Register a database id
    pub fn add_database(&self, database_id: &str) {
        if let Ok(mut state) = self.state.write() {
            state.databases.push(database_id.to_string());
        }
    }

    /// Add a page that lives inside `database_id`; returns its id
    pub fn add_row(&self, database_id: &str, properties: Value) -> String {
        let id = Uuid::new_v4().to_string();
        if let Ok(mut state) = self.state.write() {
            let now = state.tick();
            state.pages.push(page_object(
                &id,
                json!({ "type": "database_id", "database_id": database_id }),
                stored_properties(&properties),
                &now,
            ));
        }
        id
    }

    /// Add a standalone page that embeds `database_id` as a child database
    pub fn add_container_page(&self, page_id: &str, database_id: &str) {
        if let Ok(mut state) = self.state.write() {
            let now = state.tick();
            state.databases.push(database_id.to_string());
            state.pages.push(page_object(
                page_id,
                json!({ "type": "workspace", "workspace": true }),
                json!({}),
                &now,
            ));
            state.children.insert(
                page_id.to_string(),
                vec![
                    json!({
                        "object": "block",
                        "id": Uuid::new_v4().to_string(),
                        "type": "paragraph"
                    }),
                    json!({ "object": "block", "id": database_id, "type": "child_database" }),
                ],
            );
        }
    }

    /// Make every following call fail with `status` and a Notion error body
    pub fn fail_with(&self, status: u16, code: &str, message: &str) {
        if let Ok(mut state) = self.state.write() {
            state.failure = Some((
                status,
                json!({ "object": "error", "status": status, "code": code, "message": message }),
            ));
        }
    }

    /// Stop injecting failures
    pub fn recover(&self) {
        if let Ok(mut state) = self.state.write() {
            state.failure = None;
        }
    }

    /// Number of API calls received so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Count the call, then run `op` unless a failure is injected
    fn call<T>(&self, op: impl FnOnce(&mut MemoryState) -> StoreResult<T>) -> StoreResult<T> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Transport("Lock poisoned".to_string()))?;

        if let Some((status, body)) = &state.failure {
            return Err(StoreError::from_response(*status, body));
        }
        op(&mut *state)
    }

    fn retrieve_database_now(&self, database_id: &str) -> StoreResult<Value> {
        self.call(|state| {
            if state.databases.iter().any(|d| d == database_id) {
                Ok(json!({ "object": "database", "id": database_id }))
            } else {
                Err(not_found("database", database_id))
            }
        })
    }

    fn retrieve_page_now(&self, page_id: &str) -> StoreResult<Value> {
        self.call(|state| state.page_mut(page_id).map(|page| page.clone()))
    }

    fn list_block_children_now(&self, block_id: &str) -> StoreResult<Value> {
        self.call(|state| {
            if !state.has_page(block_id) {
                return Err(not_found("block", block_id));
            }
            let results = state.children.get(block_id).cloned().unwrap_or_default();
            Ok(json!({
                "object": "list",
                "results": results,
                "has_more": false,
                "next_cursor": null
            }))
        })
    }

    fn query_database_now(&self, database_id: &str, query: &Value) -> StoreResult<Value> {
        self.call(|state| {
            if !state.databases.iter().any(|d| d == database_id) {
                return Err(not_found("database", database_id));
            }

            let mut rows: Vec<&Value> = state
                .pages
                .iter()
                .filter(|p| p["parent"]["database_id"] == database_id && p["archived"] != true)
                .collect();

            let newest_first = query["sorts"][0]["timestamp"] == "created_time"
                && query["sorts"][0]["direction"] == "descending";
            if newest_first {
                rows.sort_by(|a, b| b["created_time"].as_str().cmp(&a["created_time"].as_str()));
            }

            let page_size = query["page_size"]
                .as_u64()
                .map_or(MAX_PAGE_SIZE, |n| (n as usize).clamp(1, MAX_PAGE_SIZE));
            let start = query["start_cursor"]
                .as_str()
                .and_then(|cursor| cursor.parse::<usize>().ok())
                .unwrap_or(0);

            let end = (start + page_size).min(rows.len());
            let results: Vec<Value> = rows
                .get(start..end)
                .unwrap_or_default()
                .iter()
                .map(|p| (*p).clone())
                .collect();
            let has_more = end < rows.len();

            Ok(json!({
                "object": "list",
                "results": results,
                "has_more": has_more,
                "next_cursor": has_more.then(|| end.to_string()),
            }))
        })
    }

    fn create_page_now(&self, body: &Value) -> StoreResult<Value> {
        self.call(|state| {
            let database_id = body["parent"]["database_id"].as_str().unwrap_or_default();
            if !state.databases.iter().any(|d| d == database_id) {
                return Err(not_found("database", database_id));
            }

            let id = Uuid::new_v4().to_string();
            let now = state.tick();
            let page = page_object(
                &id,
                json!({ "type": "database_id", "database_id": database_id }),
                stored_properties(&body["properties"]),
                &now,
            );
            state.pages.push(page.clone());
            Ok(page)
        })
    }

    fn update_page_now(&self, page_id: &str, body: &Value) -> StoreResult<Value> {
        self.call(|state| {
            let now = state.tick();
            let page = state.page_mut(page_id)?;

            if let Some(archived) = body["archived"].as_bool() {
                page["archived"] = json!(archived);
            }
            if let (Some(updates), Some(current)) = (
                body["properties"].as_object(),
                page["properties"].as_object_mut(),
            ) {
                for (key, value) in updates {
                    current.insert(key.clone(), stored_property(value));
                }
            }
            page["last_edited_time"] = json!(now);
            Ok(page.clone())
        })
    }
}

impl DocumentApi for InMemoryNotion {
    fn retrieve_database<'a>(&'a self, database_id: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move { self.retrieve_database_now(database_id) })
    }

    fn retrieve_page<'a>(&'a self, page_id: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move { self.retrieve_page_now(page_id) })
    }

    fn list_block_children<'a>(&'a self, block_id: &'a str) -> ApiFuture<'a, Value> {
        Box::pin(async move { self.list_block_children_now(block_id) })
    }

    fn query_database<'a>(&'a self, database_id: &'a str, query: Value) -> ApiFuture<'a, Value> {
        Box::pin(async move { self.query_database_now(database_id, &query) })
    }

    fn create_page(&self, body: Value) -> ApiFuture<'_, Value> {
        Box::pin(async move { self.create_page_now(&body) })
    }

    fn update_page<'a>(&'a self, page_id: &'a str, body: Value) -> ApiFuture<'a, Value> {
        Box::pin(async move { self.update_page_now(page_id, &body) })
    }
}

fn not_found(kind: &str, id: &str) -> StoreError {
    StoreError::from_response(
        404,
        &json!({
            "code": "object_not_found",
            "message": format!("Could not find {kind} with ID: {id}."),
        }),
    )
}

fn page_object(id: &str, parent: Value, properties: Value, now: &str) -> Value {
    json!({
        "object": "page",
        "id": id,
        "parent": parent,
        "archived": false,
        "created_time": now,
        "last_edited_time": now,
        "properties": properties,
    })
}

fn stored_properties(properties: &Value) -> Value {
    let stored: Map<String, Value> = properties
        .as_object()
        .map(|props| {
            props
                .iter()
                .map(|(key, value)| (key.clone(), stored_property(value)))
                .collect()
        })
        .unwrap_or_default();
    Value::Object(stored)
}

/// Request-shaped property to response shape. Only titles differ: the API
/// answers with `plain_text` on every rich text run.
fn stored_property(value: &Value) -> Value {
    let Some(runs) = value.get("title").and_then(Value::as_array) else {
        return value.clone();
    };

    let runs: Vec<Value> = runs
        .iter()
        .map(|run| {
            let content = run["text"]["content"].as_str().unwrap_or_default();
            json!({ "type": "text", "text": { "content": content }, "plain_text": content })
        })
        .collect();
    json!({ "title": runs })
}
