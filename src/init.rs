// src/init.rs

use rig::client::Nothing;
use rig::providers::ollama;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use strum_macros::EnumString;

use crate::agents::{
    AssistantAgent, FailurePolicy, KeywordPlanner, LlmPlanner, QueryPlanner, RigGenerator,
};
use crate::sources::{OpenFdaClient, PubMedClient};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub pubmed: PubMedConfig,
    pub openfda: OpenFdaConfig,
    pub genai: GenAiConfig,
    pub failure_policy: FailurePolicy,
    pub planner: PlannerKind,
    pub source_timeout_secs: u64,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct PubMedConfig {
    pub base_url: String,
    pub api_key: String,
    pub retmax: u32,
}

#[derive(Debug, Clone)]
pub struct OpenFdaConfig {
    pub base_url: String,
    pub api_key: String,
    pub event_limit: u32,
}

#[derive(Debug, Clone)]
pub struct GenAiConfig {
    pub url: String,
    pub text_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PlannerKind {
    Keyword,
    #[default]
    Llm,
}

impl Config {
    /// Reads the whole configuration up front. The three credentials
    /// (NCBI_API_KEY, FDA_API_KEY, GENAI_URL) have no defaults, so a missing
    /// one fails startup here instead of failing the first request.
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            pubmed: PubMedConfig {
                base_url: std::env::var("PUBMED_BASE_URL").unwrap_or_else(|_| {
                    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string()
                }),
                api_key: std::env::var("NCBI_API_KEY")?,
                retmax: std::env::var("PUBMED_RETMAX")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
            },
            openfda: OpenFdaConfig {
                base_url: std::env::var("OPENFDA_BASE_URL")
                    .unwrap_or_else(|_| "https://api.fda.gov".to_string()),
                api_key: std::env::var("FDA_API_KEY")?,
                event_limit: std::env::var("FDA_EVENT_LIMIT")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()?,
            },
            genai: GenAiConfig {
                url: std::env::var("GENAI_URL")?,
                text_model: std::env::var("TEXT_MODEL")
                    .unwrap_or_else(|_| "llama3.2".to_string()),
                timeout_secs: std::env::var("AGENT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()?,
            },
            failure_policy: std::env::var("FAILURE_POLICY")
                .unwrap_or_else(|_| "notice".to_string())
                .parse()
                .map_err(|_| "FAILURE_POLICY must be one of: omit, notice")?,
            planner: std::env::var("PLANNER")
                .unwrap_or_else(|_| "llm".to_string())
                .parse()
                .map_err(|_| "PLANNER must be one of: keyword, llm")?,
            source_timeout_secs: std::env::var("SOURCE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8001".to_string())
                .parse()?,
        })
    }
}

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<AssistantAgent>,
}

pub async fn app_init() -> Result<(Config, Arc<AppState>), Box<dyn Error>> {
    let config = Config::from_env()?;
    log::info!("✅ Configuration loaded");

    // One HTTP client shared by both evidence sources, with the per-call
    // timeout baked in.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.source_timeout_secs))
        .build()?;

    let pubmed = Arc::new(PubMedClient::new(
        http.clone(),
        config.pubmed.base_url.clone(),
        config.pubmed.api_key.clone(),
        config.pubmed.retmax,
    ));
    let openfda = Arc::new(OpenFdaClient::new(
        http,
        config.openfda.base_url.clone(),
        config.openfda.api_key.clone(),
        config.openfda.event_limit,
    ));
    log::info!("✅ Evidence source clients ready");

    let client = ollama::Client::builder()
        .api_key(Nothing)
        .base_url(&config.genai.url)
        .build()
        .map_err(|e| format!("GenAI client setup failed: {}", e))?;
    log::info!("✅ GenAI client ready ({})", config.genai.url);

    let agent_timeout = Duration::from_secs(config.genai.timeout_secs);
    let planner: Arc<dyn QueryPlanner> = match config.planner {
        PlannerKind::Keyword => Arc::new(KeywordPlanner::new()),
        PlannerKind::Llm => Arc::new(LlmPlanner::new(
            client.clone(),
            config.genai.text_model.clone(),
            agent_timeout,
        )),
    };
    let generator = Arc::new(RigGenerator::new(
        client,
        config.genai.text_model.clone(),
        agent_timeout,
    ));

    let assistant = Arc::new(AssistantAgent::new(
        planner,
        pubmed,
        openfda,
        generator,
        config.failure_policy,
    ));

    let state = Arc::new(AppState { assistant });
    Ok((config, state))
}
