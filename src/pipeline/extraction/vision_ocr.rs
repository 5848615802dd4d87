//! Google Cloud Vision OCR: `images:annotate` with `TEXT_DETECTION`.
//!
//! The image is sent inline as base64. The first text annotation holds the
//! full detected text; later annotations are per-word and ignored.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::types::TextDetector;
use super::OcrError;

pub const VISION_BASE_URL: &str = "https://vision.googleapis.com/v1";

// ──────────────────────────────────────────────
// GoogleVisionClient
// ──────────────────────────────────────────────

/// Production OCR engine backed by Google Cloud Vision.
pub struct GoogleVisionClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GoogleVisionClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OcrError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub fn hosted(api_key: Option<String>, timeout_secs: u64) -> Result<Self, OcrError> {
        Self::new(VISION_BASE_URL, api_key, timeout_secs)
    }
}

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl AnnotateResponse {
    fn into_text(self) -> Result<String, OcrError> {
        let Some(first) = self.responses.into_iter().next() else {
            return Ok(String::new());
        };
        if let Some(status) = first.error {
            return Err(OcrError::ImageRejected {
                code: status.code,
                message: status.message,
            });
        }
        Ok(first
            .text_annotations
            .into_iter()
            .next()
            .map(|a| a.description)
            .unwrap_or_default())
    }
}

#[async_trait]
impl TextDetector for GoogleVisionClient {
    async fn detect_text(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        let api_key = self.api_key.as_deref().ok_or(OcrError::MissingCredentials)?;
        let start = std::time::Instant::now();

        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image_bytes),
                },
                features: vec![Feature {
                    kind: "TEXT_DETECTION",
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/images:annotate", self.base_url))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    OcrError::Connection(self.base_url.clone())
                } else {
                    OcrError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| OcrError::ResponseParsing(e.to_string()))?;
        let text = parsed.into_text()?;

        tracing::info!(
            image_size = image_bytes.len(),
            text_len = text.len(),
            elapsed_ms = %start.elapsed().as_millis(),
            "Vision text detection complete"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AnnotateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn first_annotation_is_full_text() {
        let resp = parse(
            r#"{"responses":[{"textAnnotations":[
                {"description":"Rx\nAmoxicillin 500mg"},
                {"description":"Rx"}
            ]}]}"#,
        );
        assert_eq!(resp.into_text().unwrap(), "Rx\nAmoxicillin 500mg");
    }

    #[test]
    fn no_annotations_is_empty_text() {
        assert_eq!(parse(r#"{"responses":[{}]}"#).into_text().unwrap(), "");
        assert_eq!(parse(r#"{}"#).into_text().unwrap(), "");
    }

    #[test]
    fn per_image_error_is_rejected() {
        let resp = parse(r#"{"responses":[{"error":{"code":3,"message":"Bad image data."}}]}"#);
        match resp.into_text() {
            Err(OcrError::ImageRejected { code, message }) => {
                assert_eq!(code, 3);
                assert_eq!(message, "Bad image data.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn request_uses_text_detection_feature() {
        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: "aGk=".into(),
                },
                features: vec![Feature {
                    kind: "TEXT_DETECTION",
                }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["requests"][0]["features"][0]["type"], "TEXT_DETECTION");
        assert_eq!(json["requests"][0]["image"]["content"], "aGk=");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = GoogleVisionClient::new("http://127.0.0.1:9", None, 5).unwrap();
        let err = client.detect_text(b"image").await.unwrap_err();
        assert!(matches!(err, OcrError::MissingCredentials));
    }
}
