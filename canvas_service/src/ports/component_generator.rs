use async_trait::async_trait;
use common::helper::error_chain_fmt;

use crate::domain::entities::artifact::GeneratedComponent;

/// Language model turning a prompt into a batch of UI components
#[async_trait]
pub trait ComponentGenerator: Send + Sync {
    /// `start_order` is the first order available in the room
    async fn generate_components(
        &self,
        prompt: &str,
        start_order: i64,
    ) -> Result<Vec<GeneratedComponent>, GenerationError>;
}

#[derive(thiserror::Error)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    RequestFailed(String),

    #[error("Generated output could not be parsed: {0}")]
    UnparseableOutput(String),
}

impl std::fmt::Debug for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
