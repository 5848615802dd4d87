//! Process-local store of finished analyses.
//!
//! Entries live until the process exits. Not shared across instances.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::core_state::CoreError;
use crate::prescription::PrescriptionAnalysis;

#[derive(Default)]
pub struct AnalysisStore {
    entries: RwLock<HashMap<String, PrescriptionAnalysis>>,
}

/// `analysis_<unix-millis>`.
pub fn analysis_id(at: chrono::DateTime<chrono::Utc>) -> String {
    format!("analysis_{}", at.timestamp_millis())
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store under a freshly generated id. Two inserts in the same
    /// millisecond share an id and the later one wins.
    pub fn insert(&self, analysis: PrescriptionAnalysis) -> Result<String, CoreError> {
        let id = analysis_id(chrono::Utc::now());
        self.insert_with_id(id.clone(), analysis)?;
        Ok(id)
    }

    pub fn insert_with_id(
        &self,
        id: String,
        analysis: PrescriptionAnalysis,
    ) -> Result<(), CoreError> {
        let mut entries = self.entries.write().map_err(|_| CoreError::LockPoisoned)?;
        if entries.insert(id.clone(), analysis).is_some() {
            tracing::warn!(id = %id, "Analysis id reused, previous entry replaced");
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<PrescriptionAnalysis>, CoreError> {
        let entries = self.entries.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(entries.get(id).cloned())
    }

    /// Number of analyses held; reported by the health check.
    pub fn count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}
