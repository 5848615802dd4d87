use async_trait::async_trait;

use super::OcrError;

/// Text detection over raw image bytes (allows mocking).
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Full text found in the image; empty when nothing was detected.
    async fn detect_text(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

/// An uploaded image held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// `scan.final.jpg` → `scan`, matching how report downloads are named.
pub fn file_stem(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}
