//! The orchestration session: resolve → bind → run the model → answer.

use crate::llm::LlmClient;
use crate::session::ModelSession;
use serde::{Deserialize, Serialize};
use skillbridge_a2a::{CapabilityCard, CardResolver, InvokeOptions, RemoteAgent, SkillBinder};
use skillbridge_core::{
    AskPhase, BridgeError, BridgeEvent, BridgeResult, CancellationToken, HookChain,
};
use skillbridge_tools::ToolSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an orchestrating assistant. \
    Answer the user's question. When one of your tools can answer part of it, \
    call the tool with the relevant text and base your answer on what it returns.";

/// Settings for [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Fail discovery when the card declares no skills.
    pub require_skills: bool,
    /// Bound on each remote invocation. `None` leaves it to the transport.
    pub invoke_timeout: Option<Duration>,
    pub system_prompt: String,
    pub max_turns: u32,
    /// Card location relative to the endpoint; `None` uses the well-known path.
    pub card_path: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            require_skills: false,
            invoke_timeout: Some(Duration::from_secs(120)),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_turns: 20,
            card_path: None,
        }
    }
}

/// The question and the final answer of one `ask` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub question: String,
    pub answer: String,
}

/// Answers questions with the skills of one remote agent as tools.
///
/// Stateless across calls: every [`Orchestrator::ask`] fetches the card
/// again, binds fresh tools and runs a new model session.
pub struct Orchestrator {
    resolver: CardResolver,
    http: reqwest::Client,
    llm: Arc<LlmClient>,
    hooks: HookChain,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Orchestrator for the agent at `endpoint`, reached through `http`.
    pub fn new(
        endpoint: &str,
        http: reqwest::Client,
        llm: LlmClient,
        config: OrchestratorConfig,
    ) -> BridgeResult<Self> {
        let mut resolver = CardResolver::new(endpoint, http.clone())?
            .require_skills(config.require_skills);
        if let Some(path) = &config.card_path {
            resolver = resolver.with_card_path(path.clone());
        }
        Ok(Self {
            resolver,
            http,
            llm: Arc::new(llm),
            hooks: HookChain::with_tracing(),
            config,
        })
    }

    /// Replace the default tracing hook chain.
    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &CardResolver {
        &self.resolver
    }

    pub async fn ask(&self, question: &str) -> BridgeResult<OrchestrationResult> {
        self.ask_with_cancel(question, &CancellationToken::new())
            .await
    }

    /// Answer `question`; cancelling `cancel` aborts any in-flight step.
    pub async fn ask_with_cancel(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> BridgeResult<OrchestrationResult> {
        let request_id = Uuid::new_v4();
        let start = Instant::now();
        info!(request_id = %request_id, "Orchestration started");
        self.hooks
            .emit(BridgeEvent::phase(request_id, AskPhase::Idle))
            .await;

        let result = self.run(request_id, question, cancel).await;

        let success = result.is_ok();
        let phase = if success {
            AskPhase::Completed
        } else {
            AskPhase::Failed
        };
        self.hooks.emit(BridgeEvent::phase(request_id, phase)).await;
        self.hooks
            .emit(BridgeEvent::ask_finished(
                request_id,
                start.elapsed().as_millis() as u64,
                success,
            ))
            .await;

        if let Err(e) = &result {
            warn!(request_id = %request_id, kind = ?e.kind(), error = %e, "Orchestration failed");
        }
        result
    }

    /// Resolve the card and bind its skills without running the model.
    pub async fn inspect(
        &self,
        cancel: &CancellationToken,
    ) -> BridgeResult<(CapabilityCard, ToolSet)> {
        let card = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
            card = self.resolver.resolve() => card?,
        };
        let tools = self.bind(&card)?;
        Ok((card, tools))
    }

    async fn run(
        &self,
        request_id: Uuid,
        question: &str,
        cancel: &CancellationToken,
    ) -> BridgeResult<OrchestrationResult> {
        self.hooks
            .emit(BridgeEvent::phase(request_id, AskPhase::Resolving))
            .await;
        let card = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
            card = self.resolver.resolve() => card?,
        };
        self.hooks
            .emit(BridgeEvent::card_resolved(
                request_id,
                self.resolver.endpoint().as_str(),
                &card.name,
                card.skills.len(),
            ))
            .await;

        self.hooks
            .emit(BridgeEvent::phase(request_id, AskPhase::Binding))
            .await;
        let tools = self.bind(&card)?;
        self.hooks
            .emit(BridgeEvent::tools_bound(request_id, tools.names()))
            .await;

        self.hooks
            .emit(BridgeEvent::phase(request_id, AskPhase::SessionActive))
            .await;
        let mut session = ModelSession::new(self.llm.clone(), tools)
            .with_system_prompt(self.config.system_prompt.clone())
            .with_max_turns(self.config.max_turns)
            .with_hooks(self.hooks.clone(), request_id);
        let answer = session.run(question, cancel).await?;

        Ok(OrchestrationResult {
            question: question.to_string(),
            answer,
        })
    }

    fn bind(&self, card: &CapabilityCard) -> BridgeResult<ToolSet> {
        let agent = RemoteAgent::from_card(card, self.http.clone())?;
        let options = InvokeOptions {
            timeout: self.config.invoke_timeout,
        };
        SkillBinder::bind_with_options(card, Arc::new(agent), options)
    }
}
