// src/agents/generation.rs

use async_trait::async_trait;
use rig::completion::Prompt;
use rig::prelude::CompletionClient;
use rig::providers::ollama;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// GENERATION ERRORS
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("completion timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("completion failed: {0}")]
    Upstream(String),

    #[error("model returned an empty completion")]
    Empty,
}

// ============================================================================
// ANSWER GENERATOR TRAIT
// ============================================================================

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, preamble: &str, prompt: &str) -> Result<String, GenerationError>;
}

// ============================================================================
// RIG-BACKED GENERATOR
// ============================================================================

/// Synthesizes the final answer through the configured completion model.
/// The whole prompt round-trip is bounded by one timeout; there is no retry.
pub struct RigGenerator {
    client: ollama::Client,
    model: String,
    timeout: Duration,
}

impl RigGenerator {
    pub fn new(client: ollama::Client, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl AnswerGenerator for RigGenerator {
    async fn generate(&self, preamble: &str, prompt: &str) -> Result<String, GenerationError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(preamble)
            .build();

        let response = tokio::time::timeout(self.timeout, agent.prompt(prompt))
            .await
            .map_err(|_| GenerationError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| GenerationError::Upstream(e.to_string()))?;

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
