//! Upload pipeline: image → OCR text → analysis prompt → model reply →
//! parsed [`PrescriptionAnalysis`].

use thiserror::Error;
use tracing::Instrument;

use crate::pipeline::extraction::{OcrError, TextDetector, UploadedImage};
use crate::pipeline::structuring::{build_analysis_prompt, parse_fenced, GenerationError, TextGenerator};
use crate::prescription::PrescriptionAnalysis;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),

    #[error("No text found in image")]
    NoText,

    #[error("AI service unavailable")]
    AiUnavailable,

    #[error("Generation failed: {0}")]
    Generation(GenerationError),

    #[error("Content generation was blocked: {0}")]
    Blocked(String),

    #[error("AI response is not valid JSON: {0}")]
    InvalidJson(String),
}

impl From<GenerationError> for ProcessingError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Blocked(reason) => ProcessingError::Blocked(reason),
            other => ProcessingError::Generation(other),
        }
    }
}

/// Run the full analysis pipeline for one uploaded image.
pub async fn analyze_prescription(
    ocr: &dyn TextDetector,
    generator: Option<&dyn TextGenerator>,
    image: &UploadedImage,
) -> Result<PrescriptionAnalysis, ProcessingError> {
    let span = tracing::info_span!(
        "analyze_prescription",
        file = %image.file_name,
        size = image.bytes.len(),
    );
    run_pipeline(ocr, generator, image).instrument(span).await
}

async fn run_pipeline(
    ocr: &dyn TextDetector,
    generator: Option<&dyn TextGenerator>,
    image: &UploadedImage,
) -> Result<PrescriptionAnalysis, ProcessingError> {
    let text = ocr.detect_text(&image.bytes).await?;
    // Only a detector that found nothing counts as "no text"; whitespace goes to the model.
    if text.is_empty() {
        tracing::info!("No text found in image");
        return Err(ProcessingError::NoText);
    }

    let generator = generator.ok_or(ProcessingError::AiUnavailable)?;
    let reply = generator.generate(&build_analysis_prompt(&text)).await?;
    tracing::debug!(
        model = generator.model_name(),
        preview = %reply.chars().take(400).collect::<String>(),
        "Analysis reply received"
    );

    let mut analysis: PrescriptionAnalysis = parse_fenced(&reply).map_err(|e| match e {
        GenerationError::ResponseParsing(msg) => ProcessingError::InvalidJson(msg),
        other => ProcessingError::Generation(other),
    })?;
    analysis.stamp(&image.file_name, chrono::Utc::now());

    tracing::info!(medicines = analysis.medicines.len(), "Prescription analysed");
    Ok(analysis)
}
