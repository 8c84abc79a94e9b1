// src/agents/planner.rs

use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::prelude::CompletionClient;
use rig::providers::ollama;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::generation::GenerationError;

// ============================================================================
// QUERY PLAN
// ============================================================================

/// Which evidence lookups a query needs, with the search term for each.
/// Both `None` means the question goes straight to the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    #[serde(default)]
    pub literature: Option<String>,
    #[serde(default)]
    pub drug_safety: Option<String>,
}

impl QueryPlan {
    pub fn is_pass_through(&self) -> bool {
        self.literature.is_none() && self.drug_safety.is_none()
    }
}

#[async_trait]
pub trait QueryPlanner: Send + Sync {
    async fn plan(&self, query: &str) -> Result<QueryPlan, GenerationError>;
}

// ============================================================================
// KEYWORD PLANNER
// ============================================================================

const DRUG_SIGNALS: &[&str] = &[
    "side effect",
    "adverse reaction",
    "adverse event",
    "drug impact",
    "drug reaction",
    "drug interaction",
    "contraindication",
    "overdose",
];

// Stems, matched at word starts so that plurals and inflections count too.
const LITERATURE_SIGNALS: &[&str] = &[
    "symptom",
    "cause",
    "treat",
    "therap",
    "diagnos",
    "disease",
    "prognosis",
    "risk factor",
    "cure",
];

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "about", "are", "after", "before", "can", "do", "does", "drug",
    "drugs", "for", "from", "get", "has", "have", "how", "i", "if", "in", "is", "it", "its",
    "may", "me", "medication", "medications", "medicine", "my", "of", "on", "or", "pill",
    "pills", "please", "should", "tablet", "tablets", "take", "taking", "tell", "that", "the",
    "their", "them", "they", "this", "to", "use", "using", "was", "were", "what", "when",
    "which", "while", "will", "with", "you", "your",
];

/// Scriptable routing rule: scans the query for drug-safety and literature
/// signal phrases and derives a search term per matched lookup.
pub struct KeywordPlanner {
    drug_signals: AhoCorasick,
    literature_signals: AhoCorasick,
}

impl Default for KeywordPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordPlanner {
    pub fn new() -> Self {
        Self {
            drug_signals: build_matcher(DRUG_SIGNALS),
            literature_signals: build_matcher(LITERATURE_SIGNALS),
        }
    }

    pub fn classify(&self, query: &str) -> QueryPlan {
        let query = query.trim();
        let mut plan = QueryPlan::default();

        // Signals are independent: one question can need both lookups.
        if has_word_match(&self.literature_signals, query) {
            plan.literature = Some(query.to_string());
        }
        if has_word_match(&self.drug_signals, query) {
            plan.drug_safety = Some(self.extract_drug_term(query));
        }

        plan
    }

    /// Best-effort drug name: the query minus signal phrases and filler
    /// words, e.g. "side effects of paracetamol" becomes "paracetamol".
    fn extract_drug_term(&self, query: &str) -> String {
        let stripped = strip_word_matches(&self.drug_signals, query);
        let stripped = strip_word_matches(&self.literature_signals, &stripped);

        let term = stripped
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.len() > 1)
            .filter(|w| !STOPWORDS.contains(&w.to_lowercase().as_str()))
            .collect::<Vec<_>>()
            .join(" ");

        if term.is_empty() {
            query.to_string()
        } else {
            term
        }
    }
}

#[async_trait]
impl QueryPlanner for KeywordPlanner {
    async fn plan(&self, query: &str) -> Result<QueryPlan, GenerationError> {
        Ok(self.classify(query))
    }
}

fn build_matcher(patterns: &[&str]) -> AhoCorasick {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(patterns)
        .expect("fixed signal phrases")
}

fn is_word_start(bytes: &[u8], start: usize) -> bool {
    start == 0 || !bytes[start - 1].is_ascii_alphanumeric()
}

fn has_word_match(matcher: &AhoCorasick, text: &str) -> bool {
    matcher
        .find_iter(text)
        .any(|m| is_word_start(text.as_bytes(), m.start()))
}

// Removes every word-start match, extended through the rest of the word so
// "side effect" consumes all of "side effects".
fn strip_word_matches(matcher: &AhoCorasick, text: &str) -> String {
    let bytes = text.as_bytes();
    let mut keep = vec![true; bytes.len()];
    for m in matcher.find_iter(text) {
        if !is_word_start(bytes, m.start()) {
            continue;
        }
        let mut end = m.end();
        while end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
            end += 1;
        }
        for flag in &mut keep[m.start()..end] {
            *flag = false;
        }
    }
    text.char_indices()
        .filter(|(i, _)| keep[*i])
        .map(|(_, c)| c)
        .collect()
}

// ============================================================================
// LLM PLANNER
// ============================================================================

/// Routing through the completion model itself: the model emits a JSON plan,
/// and anything unparseable falls back to the keyword rule. Transport
/// failures propagate as generation errors.
pub struct LlmPlanner {
    client: ollama::Client,
    model: String,
    timeout: Duration,
    fallback: KeywordPlanner,
}

impl LlmPlanner {
    pub fn new(client: ollama::Client, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            model: model.into(),
            timeout,
            fallback: KeywordPlanner::new(),
        }
    }
}

#[async_trait]
impl QueryPlanner for LlmPlanner {
    async fn plan(&self, query: &str) -> Result<QueryPlan, GenerationError> {
        let prompt = format!(
            r#"You are a medical query router. Analyze the user's question and respond ONLY with a JSON object.

User question: {}

Decide which lookups the question needs:
1. "literature" - a PubMed search term, for questions about symptoms, causes of diseases, or treatment options
2. "drug_safety" - the drug name alone, for questions about side effects or adverse reactions of a drug
Use null for a lookup that is not needed. A greeting or non-medical question needs neither.

Response format (JSON only, no other text):
{{
  "literature": "<search term or null>",
  "drug_safety": "<drug name or null>"
}}
"#,
            query
        );

        let agent = self.client.agent(&self.model).build();

        let response = tokio::time::timeout(self.timeout, agent.prompt(prompt.as_str()))
            .await
            .map_err(|_| GenerationError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| GenerationError::Upstream(e.to_string()))?;

        match parse_plan(&response) {
            Some(plan) => Ok(plan),
            None => {
                log::warn!("⚠️ Routing plan was not valid JSON, falling back to keyword rules");
                self.fallback.plan(query).await
            }
        }
    }
}

fn parse_plan(response: &str) -> Option<QueryPlan> {
    let cleaned = response
        .trim()
        .trim_start_matches("```json")
        .trim_end_matches("```")
        .trim();
    let mut plan: QueryPlan = serde_json::from_str(cleaned).ok()?;
    plan.literature = plan.literature.filter(|t| !t.trim().is_empty());
    plan.drug_safety = plan.drug_safety.filter(|t| !t.trim().is_empty());
    Some(plan)
}

// ============================================================================
// TESTS
// ============================================================================
