//! Prescription pipeline: OCR extraction, model structuring, orchestration.

pub mod extraction;
pub mod processor;
pub mod structuring;

pub use processor::{analyze_prescription, ProcessingError};
