// src/models.rs

use serde::{Deserialize, Serialize};

use crate::sources::{SourceError, SourceKind};

// ============================================================================
// Ask Endpoint Wire Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

impl AskRequest {
    pub fn is_valid(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceReport>,
}

// ============================================================================
// Per-Source Outcome
// ============================================================================

/// What happened to one evidence lookup while answering, kept in the
/// response so degraded answers are visible to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: SourceKind,
    #[serde(flatten)]
    pub status: SourceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Fetched { results: usize },
    Failed { error: String },
}

impl SourceReport {
    pub fn fetched(source: SourceKind, results: usize) -> Self {
        Self {
            source,
            status: SourceStatus::Fetched { results },
        }
    }

    pub fn failed(source: SourceKind, error: &SourceError) -> Self {
        Self {
            source,
            status: SourceStatus::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, SourceStatus::Failed { .. })
    }
}

// ============================================================================
// Service Endpoints
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

impl WelcomeResponse {
    pub fn new() -> Self {
        Self {
            message: "Welcome to the Medical Assistant API!".to_string(),
        }
    }
}

impl Default for WelcomeResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub pubmed: bool,
    pub openfda: bool,
    pub model: bool,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                pubmed: true,
                openfda: true,
                model: true,
            },
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.services.pubmed && self.services.openfda && self.services.model
    }
}
