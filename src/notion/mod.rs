//! # Notion Store
//!
//! Notion is the only persistence layer. This module wraps its REST API
//! behind [`DocumentApi`] and exposes manual-level operations through
//! [`ManualStore`].

pub mod api;
pub mod errors;
pub mod http;
pub mod memory;
pub mod store;

pub use api::{ApiFuture, DocumentApi, NOTION_VERSION};
pub use errors::{Scrubber, StoreError, StoreResult, REDACTED};
pub use http::NotionHttp;
pub use memory::InMemoryNotion;
pub use store::{ManualStore, Resolution};
