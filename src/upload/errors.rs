//! # Upload Errors

use thiserror::Error;

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Image upload errors
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("No image data provided")]
    MissingImageData,

    #[error("Invalid image format")]
    InvalidImageFormat,

    #[error("Image is too large: {0:.1} MB (max: {1} MB)")]
    TooLarge(f64, u64),

    /// The configured sink could not keep the image
    #[error("Image could not be stored: {0}")]
    Sink(String),
}

impl UploadError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            UploadError::MissingImageData => 400,
            UploadError::InvalidImageFormat => 400,
            UploadError::TooLarge(_, _) => 400,
            UploadError::Sink(_) => 500,
        }
    }
}
