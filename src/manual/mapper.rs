//! # Record Mapper
//!
//! Translates between Notion page objects and [`Manual`] records.
//!
//! Reading probes an ordered list of candidate property names per field so
//! that renamed columns in the Notion database keep working. Reading never
//! fails: missing or unexpected shapes fall back to empty values. Writing
//! always uses the first candidate name.

use serde_json::{json, Map, Value};

use super::model::{Manual, ManualPatch};
use super::validation::ManualDraft;

/// File name attached to uploaded manual images
pub const IMAGE_FILE_NAME: &str = "説明書画像";

/// Logical record fields backed by a Notion property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    ManualUrl,
    ManualImages,
    PurchaseDate,
    Category,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::ManualUrl,
        Field::ManualImages,
        Field::PurchaseDate,
        Field::Category,
    ];

    /// Property names to probe, in priority order
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Field::Name => &["製品名", "Name", "名前"],
            Field::ManualUrl => &["説明書URL", "URL", "説明書url"],
            Field::ManualImages => &["説明書画像", "画像", "Image"],
            Field::PurchaseDate => &["購入日", "Purchase Date", "購入日時"],
            Field::Category => &["カテゴリ", "Category", "カテゴリー"],
        }
    }

    /// Property name used when writing
    pub fn primary(self) -> &'static str {
        self.candidates()[0]
    }

    /// First candidate property present on the page
    pub fn lookup(self, properties: &Value) -> Option<&Value> {
        self.candidates()
            .iter()
            .find_map(|key| properties.get(*key).filter(|v| !v.is_null()))
    }
}

/// Convert a Notion page object into a [`Manual`]
pub fn to_manual(page: &Value) -> Manual {
    let properties = page.get("properties").unwrap_or(&Value::Null);
    let images = Field::ManualImages
        .lookup(properties)
        .map(files_of)
        .unwrap_or_default();

    Manual {
        id: string_at(page, "id").unwrap_or_default(),
        name: Field::Name
            .lookup(properties)
            .and_then(title_of)
            .unwrap_or_default(),
        manual_url: Field::ManualUrl.lookup(properties).and_then(url_of),
        manual_images: (!images.is_empty()).then_some(images),
        purchase_date: Field::PurchaseDate.lookup(properties).and_then(date_of),
        category: Field::Category.lookup(properties).and_then(select_of),
        created_at: string_at(page, "created_time").unwrap_or_default(),
        updated_at: string_at(page, "last_edited_time").unwrap_or_default(),
    }
}

/// Properties for a new page
pub fn draft_properties(draft: &ManualDraft) -> Value {
    let mut properties = Map::new();
    properties.insert(Field::Name.primary().to_string(), title_value(&draft.name));

    if let Some(url) = &draft.manual_url {
        properties.insert(Field::ManualUrl.primary().to_string(), json!({ "url": url }));
    }
    if !draft.manual_images.is_empty() {
        properties.insert(
            Field::ManualImages.primary().to_string(),
            files_value(&draft.manual_images),
        );
    }
    if let Some(date) = &draft.purchase_date {
        properties.insert(
            Field::PurchaseDate.primary().to_string(),
            json!({ "date": { "start": date } }),
        );
    }
    if let Some(category) = &draft.category {
        properties.insert(
            Field::Category.primary().to_string(),
            category_value(Some(category)),
        );
    }

    Value::Object(properties)
}

/// Properties for a partial update; absent fields are omitted
pub fn patch_properties(patch: &ManualPatch) -> Value {
    let mut properties = Map::new();

    if let Some(name) = &patch.name {
        properties.insert(Field::Name.primary().to_string(), title_value(name));
    }
    if let Some(url) = &patch.manual_url {
        properties.insert(Field::ManualUrl.primary().to_string(), json!({ "url": url }));
    }
    if let Some(images) = &patch.manual_images {
        let images = images.as_deref().unwrap_or_default();
        properties.insert(Field::ManualImages.primary().to_string(), files_value(images));
    }
    if let Some(date) = &patch.purchase_date {
        let date = date.as_ref().map(|start| json!({ "start": start }));
        properties.insert(
            Field::PurchaseDate.primary().to_string(),
            json!({ "date": date }),
        );
    }
    if let Some(category) = &patch.category {
        properties.insert(
            Field::Category.primary().to_string(),
            category_value(category.as_ref()),
        );
    }

    Value::Object(properties)
}

fn title_value(text: &str) -> Value {
    json!({ "title": [{ "text": { "content": text } }] })
}

fn files_value(urls: &[String]) -> Value {
    let files: Vec<Value> = urls
        .iter()
        .map(|url| json!({ "name": IMAGE_FILE_NAME, "external": { "url": url } }))
        .collect();
    json!({ "files": files })
}

/// Categories are written as a single-element multi-select
fn category_value(category: Option<&String>) -> Value {
    match category {
        Some(name) => json!({ "multi_select": [{ "name": name }] }),
        None => json!({ "multi_select": [] }),
    }
}

fn string_at(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn title_of(property: &Value) -> Option<String> {
    property
        .get("title")
        .and_then(Value::as_array)
        .and_then(|runs| runs.first())
        .and_then(|run| string_at(run, "plain_text"))
}

fn url_of(property: &Value) -> Option<String> {
    non_empty_str(property.get("url"))
}

/// Internally hosted URL first, then external; entries with neither drop out
fn files_of(property: &Value) -> Vec<String> {
    let Some(files) = property.get("files").and_then(Value::as_array) else {
        return Vec::new();
    };

    files
        .iter()
        .filter_map(|file| {
            non_empty_str(file.pointer("/file/url"))
                .or_else(|| non_empty_str(file.pointer("/external/url")))
        })
        .collect()
}

fn date_of(property: &Value) -> Option<String> {
    non_empty_str(property.pointer("/date/start"))
}

/// Select label, or the first multi-select label
fn select_of(property: &Value) -> Option<String> {
    non_empty_str(property.pointer("/select/name"))
        .or_else(|| non_empty_str(property.pointer("/multi_select/0/name")))
}
