//! # Manuals
//!
//! The record type, its validation rules and the mapping to and from
//! Notion page properties.

pub mod mapper;
pub mod model;
pub mod validation;

pub use mapper::{to_manual, Field};
pub use model::{Manual, ManualPatch, NewManual};
pub use validation::{validate_new, validate_patch, ManualDraft, ValidationError, MAX_IMAGES, MAX_NAME_CHARS};
