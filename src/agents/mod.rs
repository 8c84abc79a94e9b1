// Public module exports
pub mod assistant;
pub mod generation;
pub mod planner;

// Re-export main types for convenience
pub use assistant::{Assistance, AssistantAgent, FailurePolicy};
pub use generation::{AnswerGenerator, GenerationError, RigGenerator};
pub use planner::{KeywordPlanner, LlmPlanner, QueryPlan, QueryPlanner};
