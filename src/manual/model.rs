//! # Manual Records
//!
//! The application's fixed record shape and the payloads that create or
//! modify it.

use serde::{Deserialize, Deserializer, Serialize};

/// One manual entry as surfaced to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manual {
    /// Page identifier assigned by the external store
    pub id: String,

    /// Product name (empty only when the external page has no title)
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_url: Option<String>,

    /// Image URLs in display order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_images: Option<Vec<String>>,

    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating a manual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewManual {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub manual_url: Option<String>,
    #[serde(default)]
    pub manual_images: Option<Vec<String>>,
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewManual {
    /// Create a payload with only a name set
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Partial update payload.
///
/// Outer `None` leaves the field untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub manual_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub manual_images: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "present")]
    pub purchase_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
}

impl ManualPatch {
    /// True when the patch touches no field
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.manual_url.is_none()
            && self.manual_images.is_none()
            && self.purchase_date.is_none()
            && self.category.is_none()
    }
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manual_serializes_camel_case_and_skips_absent() {
        let manual = Manual {
            id: "page-1".to_string(),
            name: "Toaster".to_string(),
            manual_url: Some("https://x.com/a.pdf".to_string()),
            manual_images: None,
            purchase_date: None,
            category: None,
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-02T00:00:00.000Z".to_string(),
        };

        let value = serde_json::to_value(&manual).unwrap();
        assert_eq!(value["manualUrl"], "https://x.com/a.pdf");
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00.000Z");
        assert!(value.get("manualImages").is_none());
        assert!(value.get("category").is_none());
    }

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let patch: ManualPatch = serde_json::from_value(json!({
            "manualUrl": null,
            "category": "Kitchen"
        }))
        .unwrap();

        assert_eq!(patch.name, None);
        assert_eq!(patch.manual_url, Some(None));
        assert_eq!(patch.category, Some(Some("Kitchen".to_string())));
        assert_eq!(patch.purchase_date, None);
        assert_eq!(patch.manual_images, None);
    }

    #[test]
    fn test_empty_patch() {
        let patch: ManualPatch = serde_json::from_value(json!({})).unwrap();
        assert!(patch.is_empty());
    }
}
