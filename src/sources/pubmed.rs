// src/sources/pubmed.rs

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use super::{EvidenceSource, SourceError, SourceKind, get_json};

// ============================================================================
// PubMed Client (NCBI E-utilities)
// ============================================================================

/// Literature lookup against the NCBI E-utilities API. A lookup is two GETs:
/// `esearch.fcgi` for the article id list, then `esummary.fcgi` for the
/// summaries of those ids.
pub struct PubMedClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retmax: u32,
}

impl PubMedClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        retmax: u32,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            retmax,
        }
    }

    async fn search_ids(&self, term: &str) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/esearch.fcgi", self.base_url);
        let params = [
            ("db", "pubmed".to_string()),
            ("term", term.to_string()),
            ("retmax", self.retmax.to_string()),
            ("retmode", "json".to_string()),
            ("api_key", self.api_key.clone()),
        ];
        let response: EsearchResponse =
            get_json(&self.http, SourceKind::PubMed, &url, &params).await?;
        Ok(response.esearchresult.idlist)
    }

    async fn fetch_summaries(&self, ids: &[String]) -> Result<EsummaryResponse, SourceError> {
        let url = format!("{}/esummary.fcgi", self.base_url);
        let params = [
            ("db", "pubmed".to_string()),
            ("id", ids.join(",")),
            ("retmode", "json".to_string()),
            ("api_key", self.api_key.clone()),
        ];
        get_json(&self.http, SourceKind::PubMed, &url, &params).await
    }
}

#[async_trait]
impl EvidenceSource for PubMedClient {
    fn kind(&self) -> SourceKind {
        SourceKind::PubMed
    }

    async fn lookup(&self, term: &str) -> Result<Vec<String>, SourceError> {
        let ids = self.search_ids(term).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let summaries = self.fetch_summaries(&ids).await?;
        Ok(normalize_summaries(&ids, &summaries.result))
    }
}

// ============================================================================
// Response Shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    #[serde(default)]
    esearchresult: EsearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

// The esummary `result` object keys documents by their id, next to a `uids`
// array, so the values stay untyped until the normalizer picks fields out.
#[derive(Debug, Deserialize)]
struct EsummaryResponse {
    #[serde(default)]
    result: HashMap<String, serde_json::Value>,
}

// ============================================================================
// Normalization
// ============================================================================

/// One line per article, in search-rank order: `"{title} ({pubdate})"`, or
/// the title alone when no pubdate came back. Articles without a title are
/// skipped rather than reported as an error.
fn normalize_summaries(ids: &[String], result: &HashMap<String, serde_json::Value>) -> Vec<String> {
    let mut lines = Vec::new();
    for id in ids {
        let doc = match result.get(id) {
            Some(doc) => doc,
            None => continue,
        };
        let title = match doc.get("title").and_then(|v| v.as_str()) {
            Some(title) if !title.trim().is_empty() => title.trim(),
            _ => continue,
        };
        match doc.get("pubdate").and_then(|v| v.as_str()) {
            Some(pubdate) if !pubdate.trim().is_empty() => {
                lines.push(format!("{} ({})", title, pubdate.trim()));
            }
            _ => lines.push(title.to_string()),
        }
    }
    lines
}

// ============================================================================
// Tests
// ============================================================================
