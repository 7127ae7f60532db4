//! # Shared State
//!
//! Everything handlers need, built once at startup.

use std::sync::Arc;

use crate::notion::{ManualStore, Scrubber};
use crate::upload::{EchoSink, ImageSink};

/// State shared by the manuals and upload handlers
#[derive(Debug)]
pub struct AppState {
    pub store: ManualStore,
    pub scrubber: Scrubber,
    pub sink: Arc<dyn ImageSink>,
}

impl AppState {
    /// State that echoes uploads back as data URLs
    pub fn new(store: ManualStore, scrubber: Scrubber) -> Self {
        Self::with_sink(store, scrubber, Arc::new(EchoSink))
    }

    pub fn with_sink(store: ManualStore, scrubber: Scrubber, sink: Arc<dyn ImageSink>) -> Self {
        Self {
            store,
            scrubber,
            sink,
        }
    }
}
