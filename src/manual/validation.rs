//! # Input Validation
//!
//! Checks run before any call to the external store. Creation checks run in
//! a fixed order and the first failure wins: name presence, name length,
//! URL shape, date shape, image count.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use thiserror::Error;

use super::model::{ManualPatch, NewManual};

/// Maximum product name length, in characters, after trimming
pub const MAX_NAME_CHARS: usize = 100;

/// Maximum number of manual images per record
pub const MAX_IMAGES: usize = 10;

static DATE_SHAPE: OnceLock<Regex> = OnceLock::new();

/// Client input errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Product name is required")]
    MissingName,

    #[error("Product name must be at most {MAX_NAME_CHARS} characters")]
    NameTooLong,

    #[error("Manual URL is not a valid URL")]
    InvalidUrl,

    #[error("Purchase date must use the YYYY-MM-DD format")]
    InvalidDate,

    #[error("At most {MAX_IMAGES} manual images are allowed")]
    TooManyImages,
}

/// A create payload that passed validation, with the name trimmed and empty
/// optional strings dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualDraft {
    pub name: String,
    pub manual_url: Option<String>,
    pub manual_images: Vec<String>,
    pub purchase_date: Option<String>,
    pub category: Option<String>,
}

/// Validate and normalize a create payload
pub fn validate_new(input: NewManual) -> Result<ManualDraft, ValidationError> {
    let name = check_name(input.name.as_deref().unwrap_or_default())?;
    let manual_url = non_empty(input.manual_url);
    let purchase_date = non_empty(input.purchase_date);
    let manual_images = input.manual_images.unwrap_or_default();

    if let Some(url) = &manual_url {
        check_url(url)?;
    }
    if let Some(date) = &purchase_date {
        check_date(date)?;
    }
    check_image_count(&manual_images)?;

    Ok(ManualDraft {
        name,
        manual_url,
        manual_images,
        purchase_date,
        category: non_empty(input.category),
    })
}

/// Validate the fields present in a patch with the create rules.
///
/// Empty strings become explicit clears.
pub fn validate_patch(patch: ManualPatch) -> Result<ManualPatch, ValidationError> {
    let name = patch.name.as_deref().map(check_name).transpose()?;
    let manual_url = patch.manual_url.map(non_empty);
    let purchase_date = patch.purchase_date.map(non_empty);

    if let Some(Some(url)) = &manual_url {
        check_url(url)?;
    }
    if let Some(Some(date)) = &purchase_date {
        check_date(date)?;
    }
    if let Some(Some(images)) = &patch.manual_images {
        check_image_count(images)?;
    }

    Ok(ManualPatch {
        name,
        manual_url,
        manual_images: patch.manual_images,
        purchase_date,
        category: patch.category.map(non_empty),
    })
}

fn check_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::NameTooLong);
    }
    Ok(name.to_string())
}

fn check_url(url: &str) -> Result<(), ValidationError> {
    Url::parse(url)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidUrl)
}

/// Shape check only; `2024-13-40` passes.
fn check_date(date: &str) -> Result<(), ValidationError> {
    let shape = DATE_SHAPE.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern is valid")
    });
    if shape.is_match(date) {
        Ok(())
    } else {
        Err(ValidationError::InvalidDate)
    }
}

fn check_image_count(images: &[String]) -> Result<(), ValidationError> {
    if images.len() > MAX_IMAGES {
        return Err(ValidationError::TooManyImages);
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
