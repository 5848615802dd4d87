//! Downloadable PDF report for a prescription analysis.

pub mod layout;
pub mod pdf;

use thiserror::Error;

use crate::pipeline::extraction::file_stem;
use crate::prescription::PrescriptionAnalysis;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF font error: {0}")]
    Font(String),
    #[error("PDF save error: {0}")]
    Save(String),
}

/// `MedASK_Analysis_<file stem>.pdf`
pub fn report_file_name(analysis: &PrescriptionAnalysis) -> String {
    format!("MedASK_Analysis_{}.pdf", file_stem(&analysis.file_name))
}

/// Lay out and render the analysis report. Returns PDF bytes.
pub fn generate_analysis_pdf(analysis: &PrescriptionAnalysis) -> Result<Vec<u8>, ReportError> {
    let pages = layout::layout_analysis(analysis);
    tracing::debug!(pages = pages.len(), file = %analysis.file_name, "Rendering analysis report");
    pdf::render_pages("Analysis Report", &pages)
}
