// src/agents/assistant.rs

use std::sync::Arc;
use strum_macros::EnumString;
use uuid::Uuid;

use super::generation::{AnswerGenerator, GenerationError};
use super::planner::QueryPlanner;
use crate::error::{AppError, Result};
use crate::models::SourceReport;
use crate::sources::{EvidenceSource, SourceError, SourceKind};

// ============================================================================
// FAILURE POLICY
// ============================================================================

/// How a failed evidence lookup shows up in the generated answer. Either way
/// the failure is logged and recorded in the response's source reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString)]
pub enum FailurePolicy {
    /// Leave the source out of the prompt silently.
    #[strum(serialize = "omit")]
    Omit,
    /// Tell the model the source was unavailable so the answer can say so.
    #[default]
    #[strum(serialize = "notice", serialize = "degrade_with_notice")]
    DegradeWithNotice,
}

// ============================================================================
// ASSISTANT AGENT
// ============================================================================

#[derive(Debug, Clone)]
pub struct Assistance {
    pub answer: String,
    pub sources: Vec<SourceReport>,
}

pub struct AssistantAgent {
    planner: Arc<dyn QueryPlanner>,
    literature: Arc<dyn EvidenceSource>,
    drug_safety: Arc<dyn EvidenceSource>,
    generator: Arc<dyn AnswerGenerator>,
    failure_policy: FailurePolicy,
}

const PREAMBLE: &str = "You are a medical assistant AI. Provide factual, concise, and respectful \
answers to healthcare questions about symptoms, treatments, causes of diseases, and drug side \
effects. Base your answer on the evidence supplied with the question, and say so when that \
evidence is incomplete.";

impl AssistantAgent {
    pub fn new(
        planner: Arc<dyn QueryPlanner>,
        literature: Arc<dyn EvidenceSource>,
        drug_safety: Arc<dyn EvidenceSource>,
        generator: Arc<dyn AnswerGenerator>,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            planner,
            literature,
            drug_safety,
            generator,
            failure_policy,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<Assistance> {
        let request_id = Uuid::now_v7().to_string();
        let plan = self
            .planner
            .plan(query)
            .await
            .map_err(|e| AppError::from(e).with_request_id(&request_id))?;
        log::info!(
            "🩺 [{}] Plan: literature={:?} drug_safety={:?}",
            request_id,
            plan.literature,
            plan.drug_safety
        );

        let mut set = EvidenceSet::default();
        let mut planned = 0;

        // Lookups run one after another, literature first.
        if let Some(term) = plan.literature.as_deref() {
            planned += 1;
            self.consult(self.literature.as_ref(), term, &request_id, &mut set)
                .await;
        }
        if let Some(term) = plan.drug_safety.as_deref() {
            planned += 1;
            self.consult(self.drug_safety.as_ref(), term, &request_id, &mut set)
                .await;
        }

        if planned > 0 && set.failures.len() == planned {
            return Err(all_sources_failed(set.failures).with_request_id(&request_id));
        }

        let prompt = build_prompt(query, &set.sections, &set.notices);
        let answer = self
            .generator
            .generate(PREAMBLE, &prompt)
            .await
            .map_err(|e| AppError::from(e).with_request_id(&request_id))?;
        if answer.trim().is_empty() {
            return Err(AppError::from(GenerationError::Empty).with_request_id(&request_id));
        }

        log::info!("✅ [{}] Answer generated ({} chars)", request_id, answer.len());
        Ok(Assistance {
            answer,
            sources: set.reports,
        })
    }

    async fn consult(
        &self,
        source: &dyn EvidenceSource,
        term: &str,
        request_id: &str,
        set: &mut EvidenceSet,
    ) {
        let kind = source.kind();
        log::info!("🔎 [{}] {} lookup: {}", request_id, kind, term);
        match source.lookup(term).await {
            Ok(lines) => {
                log::info!(
                    "✅ [{}] {} returned {} result(s)",
                    request_id,
                    kind,
                    lines.len()
                );
                set.reports.push(SourceReport::fetched(kind, lines.len()));
                set.sections.push((kind, lines));
            }
            Err(err) => {
                log::warn!("⚠️ [{}] {} lookup failed: {}", request_id, kind, err);
                set.reports.push(SourceReport::failed(kind, &err));
                if self.failure_policy == FailurePolicy::DegradeWithNotice {
                    set.notices
                        .push(format!("{} was unavailable for this answer.", kind));
                }
                set.failures.push(err);
            }
        }
    }
}

// ============================================================================
// EVIDENCE ASSEMBLY
// ============================================================================

#[derive(Default)]
struct EvidenceSet {
    reports: Vec<SourceReport>,
    sections: Vec<(SourceKind, Vec<String>)>,
    notices: Vec<String>,
    failures: Vec<SourceError>,
}

fn all_sources_failed(mut failures: Vec<SourceError>) -> AppError {
    if failures.len() == 1 {
        return failures.remove(0).into();
    }
    let summary: Vec<String> = failures.iter().map(|e| e.to_string()).collect();
    AppError::service_unavailable("Every evidence source failed for this query")
        .with_details(serde_json::json!({ "failures": summary }))
}

fn build_prompt(query: &str, sections: &[(SourceKind, Vec<String>)], notices: &[String]) -> String {
    let mut prompt = String::new();
    for (kind, lines) in sections {
        if lines.is_empty() {
            prompt.push_str(&format!("{} returned no results for this question.\n\n", kind));
            continue;
        }
        prompt.push_str(&format!("Evidence from {}:\n", kind));
        for line in lines {
            prompt.push_str(&format!("- {}\n", line));
        }
        prompt.push('\n');
    }
    for notice in notices {
        prompt.push_str(&format!("Note: {}\n", notice));
    }
    if !notices.is_empty() {
        prompt.push('\n');
    }
    prompt.push_str(&format!("User question: {}", query));
    prompt
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::planner::QueryPlan;
    use crate::error::ErrorCode;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubPlanner {
        plan: QueryPlan,
    }

    #[async_trait]
    impl QueryPlanner for StubPlanner {
        async fn plan(&self, _query: &str) -> std::result::Result<QueryPlan, GenerationError> {
            Ok(self.plan.clone())
        }
    }

    struct StubSource {
        kind: SourceKind,
        response: std::result::Result<Vec<String>, SourceError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EvidenceSource for StubSource {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn lookup(&self, _term: &str) -> std::result::Result<Vec<String>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    struct StubGenerator {
        response: std::result::Result<String, GenerationError>,
        seen_prompt: Arc<Mutex<String>>,
    }

    #[async_trait]
    impl AnswerGenerator for StubGenerator {
        async fn generate(
            &self,
            _preamble: &str,
            prompt: &str,
        ) -> std::result::Result<String, GenerationError> {
            *self.seen_prompt.lock().unwrap() = prompt.to_string();
            self.response.clone()
        }
    }

    struct Harness {
        assistant: AssistantAgent,
        literature_calls: Arc<AtomicUsize>,
        drug_calls: Arc<AtomicUsize>,
        seen_prompt: Arc<Mutex<String>>,
    }

    fn harness(
        plan: QueryPlan,
        literature: std::result::Result<Vec<String>, SourceError>,
        drug: std::result::Result<Vec<String>, SourceError>,
        generated: std::result::Result<String, GenerationError>,
        policy: FailurePolicy,
    ) -> Harness {
        let literature_calls = Arc::new(AtomicUsize::new(0));
        let drug_calls = Arc::new(AtomicUsize::new(0));
        let seen_prompt = Arc::new(Mutex::new(String::new()));

        let assistant = AssistantAgent::new(
            Arc::new(StubPlanner { plan }),
            Arc::new(StubSource {
                kind: SourceKind::PubMed,
                response: literature,
                calls: literature_calls.clone(),
            }),
            Arc::new(StubSource {
                kind: SourceKind::OpenFda,
                response: drug,
                calls: drug_calls.clone(),
            }),
            Arc::new(StubGenerator {
                response: generated,
                seen_prompt: seen_prompt.clone(),
            }),
            policy,
        );

        Harness {
            assistant,
            literature_calls,
            drug_calls,
            seen_prompt,
        }
    }

    fn both_plan() -> QueryPlan {
        QueryPlan {
            literature: Some("aspirin headache".to_string()),
            drug_safety: Some("aspirin".to_string()),
        }
    }

    fn timeout_err() -> SourceError {
        SourceError::Timeout {
            kind: SourceKind::OpenFda,
        }
    }

    #[tokio::test]
    async fn test_degraded_answer_when_drug_source_fails() {
        let h = harness(
            both_plan(),
            Ok(vec!["Aspirin and headache relief (2020 Jan)".to_string()]),
            Err(timeout_err()),
            Ok("Aspirin generally relieves headaches.".to_string()),
            FailurePolicy::DegradeWithNotice,
        );

        let assistance = h.assistant.answer("does aspirin help headaches?").await.unwrap();

        assert_eq!(assistance.answer, "Aspirin generally relieves headaches.");
        assert_eq!(assistance.sources.len(), 2);
        assert!(!assistance.sources[0].is_failed());
        assert!(assistance.sources[1].is_failed());

        let prompt = h.seen_prompt.lock().unwrap().clone();
        assert!(prompt.contains("Evidence from PubMed:"));
        assert!(prompt.contains("- Aspirin and headache relief (2020 Jan)"));
        assert!(prompt.contains("Note: openFDA was unavailable for this answer."));
        assert!(prompt.ends_with("User question: does aspirin help headaches?"));
    }

    #[tokio::test]
    async fn test_omit_policy_leaves_failure_out_of_prompt() {
        let h = harness(
            both_plan(),
            Ok(vec!["Aspirin and headache relief".to_string()]),
            Err(timeout_err()),
            Ok("Answer.".to_string()),
            FailurePolicy::Omit,
        );

        let assistance = h.assistant.answer("does aspirin help headaches?").await.unwrap();

        // Still recorded in the reports, just not surfaced to the model.
        assert!(assistance.sources[1].is_failed());
        let prompt = h.seen_prompt.lock().unwrap().clone();
        assert!(!prompt.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_service_unavailable() {
        let h = harness(
            both_plan(),
            Err(SourceError::Network {
                kind: SourceKind::PubMed,
                message: "connection refused".to_string(),
            }),
            Err(timeout_err()),
            Ok("never reached".to_string()),
            FailurePolicy::DegradeWithNotice,
        );

        let err = h.assistant.answer("does aspirin help headaches?").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
        assert!(err.request_id.is_some());
    }

    #[tokio::test]
    async fn test_single_planned_failure_names_the_upstream() {
        let h = harness(
            QueryPlan {
                literature: None,
                drug_safety: Some("aspirin".to_string()),
            },
            Ok(vec![]),
            Err(SourceError::Status {
                kind: SourceKind::OpenFda,
                status: 500,
                detail: "upstream broke".to_string(),
            }),
            Ok("never reached".to_string()),
            FailurePolicy::DegradeWithNotice,
        );

        let err = h.assistant.answer("aspirin side effects").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
        assert!(err.request_id.is_some());
        assert_eq!(err.details.unwrap()["source"], "openFDA");
        assert_eq!(h.literature_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pass_through_query_skips_sources() {
        let h = harness(
            QueryPlan::default(),
            Ok(vec!["unused".to_string()]),
            Ok(vec!["unused".to_string()]),
            Ok("Hello! How can I help?".to_string()),
            FailurePolicy::DegradeWithNotice,
        );

        let assistance = h.assistant.answer("hello there").await.unwrap();

        assert_eq!(h.literature_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.drug_calls.load(Ordering::SeqCst), 0);
        assert!(assistance.sources.is_empty());
        assert_eq!(*h.seen_prompt.lock().unwrap(), "User question: hello there");
    }

    #[tokio::test]
    async fn test_empty_lookup_is_reported_to_model_not_an_error() {
        let h = harness(
            QueryPlan {
                literature: Some("rare disease".to_string()),
                drug_safety: None,
            },
            Ok(vec![]),
            Ok(vec![]),
            Ok("No studies found.".to_string()),
            FailurePolicy::DegradeWithNotice,
        );

        let assistance = h.assistant.answer("rare disease treatments").await.unwrap();

        assert!(!assistance.sources[0].is_failed());
        let prompt = h.seen_prompt.lock().unwrap().clone();
        assert!(prompt.contains("PubMed returned no results"));
    }

    #[tokio::test]
    async fn test_generator_failure_is_agent_error() {
        let h = harness(
            both_plan(),
            Ok(vec!["evidence".to_string()]),
            Ok(vec!["Nausea".to_string()]),
            Err(GenerationError::Upstream("model exploded".to_string())),
            FailurePolicy::DegradeWithNotice,
        );

        let err = h.assistant.answer("does aspirin help headaches?").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AgentError);
        assert!(err.request_id.is_some());
    }

    #[tokio::test]
    async fn test_blank_completion_is_agent_error() {
        let h = harness(
            both_plan(),
            Ok(vec!["evidence".to_string()]),
            Ok(vec!["Nausea".to_string()]),
            Ok("   ".to_string()),
            FailurePolicy::DegradeWithNotice,
        );

        let err = h.assistant.answer("does aspirin help headaches?").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AgentError);
        assert!(err.request_id.is_some());
    }

    #[test]
    fn test_failure_policy_parsing() {
        assert_eq!("omit".parse::<FailurePolicy>().unwrap(), FailurePolicy::Omit);
        assert_eq!(
            "notice".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::DegradeWithNotice
        );
        assert_eq!(
            "degrade_with_notice".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::DegradeWithNotice
        );
        assert!("everything_is_fine".parse::<FailurePolicy>().is_err());
    }
}
