// src/sources/mod.rs

pub mod openfda;
pub mod pubmed;

pub use openfda::OpenFdaClient;
pub use pubmed::PubMedClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

// ============================================================================
// Source Identity
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SourceKind {
    #[strum(serialize = "PubMed")]
    #[serde(rename = "PubMed")]
    PubMed,
    #[strum(serialize = "openFDA")]
    #[serde(rename = "openFDA")]
    OpenFda,
}

// ============================================================================
// Source Errors
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("{kind} request timed out")]
    Timeout { kind: SourceKind },

    #[error("{kind} request failed: {message}")]
    Network { kind: SourceKind, message: String },

    #[error("{kind} returned HTTP {status}: {detail}")]
    Status {
        kind: SourceKind,
        status: u16,
        detail: String,
    },

    #[error("{kind} response could not be decoded: {message}")]
    Decode { kind: SourceKind, message: String },
}

impl SourceError {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Timeout { kind }
            | Self::Network { kind, .. }
            | Self::Status { kind, .. }
            | Self::Decode { kind, .. } => *kind,
        }
    }

    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// Evidence Source Trait
// ============================================================================

/// A remote evidence backend: one search term in, normalized text lines out.
/// Implementations make exactly one pass over the upstream API per call,
/// with no retries and no caching.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn lookup(&self, term: &str) -> Result<Vec<String>, SourceError>;
}

// ============================================================================
// Shared Request Pipeline
// ============================================================================

/// One GET with query parameters, decoded into `T`. Every upstream call in
/// this crate goes through here so the error contract stays uniform:
/// timeout and transport failures, non-2xx statuses, and undecodable bodies
/// all come back as `SourceError` tagged with the owning source.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    kind: SourceKind,
    url: &str,
    params: &[(&str, String)],
) -> Result<T, SourceError> {
    let response = http.get(url).query(params).send().await.map_err(|e| {
        if e.is_timeout() {
            SourceError::Timeout { kind }
        } else {
            SourceError::Network {
                kind,
                message: e.to_string(),
            }
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error response".to_string());
        return Err(SourceError::Status {
            kind,
            status: status.as_u16(),
            detail,
        });
    }

    response.json::<T>().await.map_err(|e| SourceError::Decode {
        kind,
        message: e.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
