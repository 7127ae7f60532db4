//! # Image Sink
//!
//! Where accepted images end up. The sink turns an accepted upload into
//! the URL that gets stored on the record.

use super::errors::UploadResult;
use super::UploadedImage;

/// Destination for accepted images
pub trait ImageSink: Send + Sync + std::fmt::Debug {
    /// Keep `image` and return the URL it can be fetched from
    fn store(&self, image: &UploadedImage) -> UploadResult<String>;
}

/// Returns the data URL unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoSink;

impl ImageSink for EchoSink {
    fn store(&self, image: &UploadedImage) -> UploadResult<String> {
        Ok(image.data_url.clone())
    }
}
