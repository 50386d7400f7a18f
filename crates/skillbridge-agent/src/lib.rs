//! Model runtime and orchestration session.
//!
//! [`Orchestrator::ask`] resolves a remote agent's capability card, binds its
//! skills as tools and runs a [`ModelSession`] until the model answers.

pub mod backends;
pub mod config;
pub mod context;
pub mod llm;
pub mod orchestrator;
pub mod session;

pub use backends::LlmBackend;
pub use config::{LlmProvider, ModelConfig};
pub use context::ContextWindow;
pub use llm::{LlmClient, LlmResponse};
pub use orchestrator::{
    OrchestrationResult, Orchestrator, OrchestratorConfig, DEFAULT_SYSTEM_PROMPT,
};
pub use session::ModelSession;
