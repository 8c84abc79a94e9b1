// src/sources/openfda.rs

use async_trait::async_trait;
use serde::Deserialize;

use super::{EvidenceSource, SourceError, SourceKind, get_json};

// ============================================================================
// openFDA Client (drug adverse events)
// ============================================================================

/// Drug-safety lookup against the openFDA adverse-event endpoint. One GET
/// per lookup, searching events by the drug's medicinal product name.
pub struct OpenFdaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    limit: u32,
}

impl OpenFdaClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        limit: u32,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            limit,
        }
    }
}

#[async_trait]
impl EvidenceSource for OpenFdaClient {
    fn kind(&self) -> SourceKind {
        SourceKind::OpenFda
    }

    async fn lookup(&self, term: &str) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/drug/event.json", self.base_url);
        let params = [
            (
                "search",
                format!("patient.drug.medicinalproduct:{}", term),
            ),
            ("limit", self.limit.to_string()),
            ("api_key", self.api_key.clone()),
        ];
        let response: DrugEventResponse =
            get_json(&self.http, SourceKind::OpenFda, &url, &params).await?;
        Ok(normalize_reactions(&response))
    }
}

// ============================================================================
// Response Shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct DrugEventResponse {
    #[serde(default)]
    results: Vec<DrugEvent>,
}

#[derive(Debug, Default, Deserialize)]
struct DrugEvent {
    #[serde(default)]
    patient: Patient,
}

#[derive(Debug, Default, Deserialize)]
struct Patient {
    #[serde(default)]
    reaction: Vec<Reaction>,
}

#[derive(Debug, Deserialize)]
struct Reaction {
    reactionmeddrapt: Option<String>,
}

// ============================================================================
// Normalization
// ============================================================================

/// Reported reaction terms from the first matching event. Reactions without
/// a MedDRA term are skipped; no matching events is an empty list, not an
/// error.
fn normalize_reactions(response: &DrugEventResponse) -> Vec<String> {
    let event = match response.results.first() {
        Some(event) => event,
        None => return Vec::new(),
    };
    event
        .patient
        .reaction
        .iter()
        .filter_map(|r| r.reactionmeddrapt.as_deref())
        .filter(|term| !term.trim().is_empty())
        .map(|term| term.trim().to_string())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
