//! Shared application state behind every route.
//!
//! Vendor clients sit behind traits so router tests can swap in mocks.
//! Everything here is immutable after startup except the analysis store.

use std::sync::Arc;
use std::time::Instant;

use crate::analysis_store::AnalysisStore;
use crate::config::{self, Config};
use crate::db::{DatabaseError, MongoRemedyStore, SupabaseJournalStore};
use crate::journal::JournalStore;
use crate::pipeline::extraction::{GoogleVisionClient, OcrError, TextDetector};
use crate::pipeline::structuring::{GeminiClient, TextGenerator};
use crate::remedies::RemedyStore;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    /// `None` when the model client could not be built; AI routes degrade.
    generator: Option<Arc<dyn TextGenerator>>,
    ocr: Arc<dyn TextDetector>,
    /// `None` when the Supabase client could not be built; journal routes answer 503.
    journal: Option<Arc<dyn JournalStore>>,
    remedies: Arc<dyn RemedyStore>,
    pub analyses: AnalysisStore,
    pub max_upload_bytes: usize,
    started_at: Instant,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Could not connect to MongoDB: {0}")]
    Database(#[from] DatabaseError),
    #[error("Could not build OCR client: {0}")]
    Ocr(#[from] OcrError),
}

impl CoreState {
    pub fn new(ocr: Arc<dyn TextDetector>, remedies: Arc<dyn RemedyStore>) -> Self {
        Self {
            generator: None,
            ocr,
            journal: None,
            remedies,
            analyses: AnalysisStore::new(),
            max_upload_bytes: config::DEFAULT_MAX_UPLOAD_BYTES,
            started_at: Instant::now(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_journal(mut self, journal: Arc<dyn JournalStore>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Build every vendor client from configuration. MongoDB must answer a
    /// ping; a model or Supabase client that fails to build only disables
    /// its routes.
    pub async fn connect(config: &Config) -> Result<Self, StartupError> {
        tracing::info!(database = %config.mongodb_database, "Connecting to MongoDB");
        let remedies = MongoRemedyStore::connect(&config.mongodb_uri, &config.mongodb_database).await?;
        remedies.ping().await?;
        tracing::info!("MongoDB connection established");

        if config.vision_api_key.is_none() {
            tracing::warn!("GOOGLE_VISION_API_KEY is not set, uploads will fail at the OCR step");
        }
        let ocr = GoogleVisionClient::hosted(config.vision_api_key.clone(), config.http_timeout_secs)?;

        let mut state = Self::new(Arc::new(ocr), Arc::new(remedies))
            .with_max_upload_bytes(config.max_upload_bytes);

        match GeminiClient::hosted(
            &config.gemini_api_key,
            &config.gemini_model,
            config.http_timeout_secs,
        ) {
            Ok(client) => {
                tracing::info!(model = %config.gemini_model, "Gemini client initialized");
                state = state.with_generator(Arc::new(client));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize Gemini client, AI features unavailable");
            }
        }

        match SupabaseJournalStore::new(
            &config.supabase_url,
            &config.supabase_service_role_key,
            config.http_timeout_secs,
        ) {
            Ok(store) => {
                tracing::info!("Supabase client initialized");
                state = state.with_journal(Arc::new(store));
            }
            Err(e) => {
                tracing::error!(error = %e, "Supabase client creation failed, journal disabled");
            }
        }

        Ok(state)
    }

    pub fn generator(&self) -> Option<&dyn TextGenerator> {
        self.generator.as_deref()
    }

    pub fn ocr(&self) -> &dyn TextDetector {
        self.ocr.as_ref()
    }

    pub fn journal(&self) -> Option<&dyn JournalStore> {
        self.journal.as_deref()
    }

    pub fn remedies(&self) -> &dyn RemedyStore {
        self.remedies.as_ref()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockGenerator, MockJournalStore, MockOcr, MockRemedyStore};

    #[test]
    fn optional_clients_default_to_absent() {
        let state = CoreState::new(
            Arc::new(MockOcr::text("Rx")),
            Arc::new(MockRemedyStore::new(vec![])),
        );
        assert!(state.generator().is_none());
        assert!(state.journal().is_none());
        assert_eq!(state.max_upload_bytes, config::DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn builders_install_clients() {
        let state = CoreState::new(
            Arc::new(MockOcr::text("Rx")),
            Arc::new(MockRemedyStore::new(vec![])),
        )
        .with_generator(Arc::new(MockGenerator::replying("hi")))
        .with_journal(Arc::new(MockJournalStore::new()))
        .with_max_upload_bytes(1024);
        assert_eq!(state.generator().unwrap().model_name(), "mock-model");
        assert!(state.journal().is_some());
        assert_eq!(state.max_upload_bytes, 1024);
    }
}
