//! # Response Envelope
//!
//! Every JSON response has the shape `{success, data?, error?}`.

use serde::Serialize;

/// Standard response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failure that still carries a payload
    pub fn failure_with(error: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::ok(json!({"id": "a"}))).unwrap();
        assert_eq!(json, json!({"success": true, "data": {"id": "a"}}));
    }

    #[test]
    fn test_unit_data_serializes_as_null() {
        let json = serde_json::to_value(ApiResponse::ok(())).unwrap();
        assert_eq!(json, json!({"success": true, "data": null}));
    }

    #[test]
    fn test_failure_envelope() {
        let json = serde_json::to_value(ApiResponse::failure("Product name is required")).unwrap();
        assert_eq!(
            json,
            json!({"success": false, "error": "Product name is required"})
        );
    }
}
