pub mod types;
pub mod vision_ocr;

pub use types::*;
pub use vision_ocr::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Google Vision API key is not configured (GOOGLE_VISION_API_KEY)")]
    MissingCredentials,

    #[error("Google Vision is not reachable at {0}")]
    Connection(String),

    #[error("Google Vision returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Google Vision could not process the image (code {code}): {message}")]
    ImageRejected { code: i32, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}
