//! # Image Upload
//!
//! Checks an inbound base64 image data URL and hands it to an
//! [`ImageSink`]. Nothing is decoded here; the size is estimated from the
//! length of the base64 payload.

pub mod errors;
pub mod sink;

pub use errors::{UploadError, UploadResult};
pub use sink::{EchoSink, ImageSink};

use serde::{Deserialize, Serialize};

/// Required prefix of an image data URL
pub const IMAGE_DATA_PREFIX: &str = "data:image/";

/// Largest accepted image, in megabytes
pub const MAX_UPLOAD_MB: u64 = 10;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Upload request body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub image_data: Option<String>,

    #[serde(default)]
    pub file_name: Option<String>,
}

/// Upload response body
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// An image that passed the checks
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub data_url: String,
    pub file_name: Option<String>,
    /// Decoded size estimated from the base64 length
    pub estimated_bytes: usize,
}

impl UploadRequest {
    /// Check the data URL shape and size
    pub fn accept(self) -> UploadResult<UploadedImage> {
        let data_url = self
            .image_data
            .filter(|d| !d.is_empty())
            .ok_or(UploadError::MissingImageData)?;

        if !data_url.starts_with(IMAGE_DATA_PREFIX) {
            return Err(UploadError::InvalidImageFormat);
        }
        let (_, payload) = data_url
            .split_once(',')
            .ok_or(UploadError::InvalidImageFormat)?;

        let estimated_bytes = payload.len() * 3 / 4;
        let size_mb = estimated_bytes as f64 / BYTES_PER_MB;
        if size_mb > MAX_UPLOAD_MB as f64 {
            return Err(UploadError::TooLarge(size_mb, MAX_UPLOAD_MB));
        }

        Ok(UploadedImage {
            data_url,
            file_name: self.file_name,
            estimated_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(image_data: Option<String>) -> UploadRequest {
        UploadRequest {
            image_data,
            file_name: Some("manual.jpg".to_string()),
        }
    }

    #[test]
    fn test_accepts_image_data_url() {
        let image = request(Some("data:image/jpeg;base64,QUJDRA==".to_string()))
            .accept()
            .unwrap();
        assert_eq!(image.data_url, "data:image/jpeg;base64,QUJDRA==");
        assert_eq!(image.estimated_bytes, 6);
        assert_eq!(image.file_name.as_deref(), Some("manual.jpg"));
    }

    #[test]
    fn test_missing_data() {
        assert!(matches!(request(None).accept(), Err(UploadError::MissingImageData)));
        assert!(matches!(
            request(Some(String::new())).accept(),
            Err(UploadError::MissingImageData)
        ));
    }

    #[test]
    fn test_non_image_rejected() {
        assert!(matches!(
            request(Some("data:application/pdf;base64,AAAA".to_string())).accept(),
            Err(UploadError::InvalidImageFormat)
        ));
        assert!(matches!(
            request(Some("data:image/png;base64".to_string())).accept(),
            Err(UploadError::InvalidImageFormat)
        ));
    }

    #[test]
    fn test_size_limit() {
        // 10 MiB decoded is exactly at the limit
        let at_limit = "A".repeat(10 * 1024 * 1024 / 3 * 4);
        assert!(request(Some(format!("data:image/png;base64,{at_limit}")))
            .accept()
            .is_ok());

        let over = "A".repeat(15 * 1024 * 1024);
        assert!(matches!(
            request(Some(format!("data:image/png;base64,{over}"))).accept(),
            Err(UploadError::TooLarge(_, 10))
        ));
    }

    #[test]
    fn test_request_is_camel_case() {
        let req: UploadRequest =
            serde_json::from_str(r#"{"imageData":"data:image/png;base64,AA","fileName":"a.png"}"#)
                .unwrap();
        assert_eq!(req.file_name.as_deref(), Some("a.png"));
        assert!(req.image_data.is_some());
    }
}
