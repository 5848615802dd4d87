use async_trait::async_trait;

use super::GenerationError;

/// Generative text model abstraction (allows mocking).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a single-turn prompt and return the model's text reply.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}
