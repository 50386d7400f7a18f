use crate::context::ContextWindow;
use crate::llm::{LlmClient, LlmResponse};
use futures_util::future::join_all;
use skillbridge_core::{
    BridgeError, BridgeEvent, BridgeResult, CancellationToken, HookChain, InvocationOutcome,
    Message, ToolCall, ToolResult,
};
use skillbridge_tools::ToolSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

const DEFAULT_MAX_TURNS: u32 = 20;
const CONTEXT_MESSAGES: usize = 100;

/// The tool-calling loop: prompt → model → tool calls → results → repeat,
/// until the model produces a final answer.
///
/// The session owns its [`ToolSet`], so every tool it offers stays
/// invokable until the session is dropped.
pub struct ModelSession {
    llm: Arc<LlmClient>,
    tools: ToolSet,
    hooks: HookChain,
    request_id: Uuid,
    session_id: Uuid,
    max_turns: u32,
    context: ContextWindow,
}

impl ModelSession {
    pub fn new(llm: Arc<LlmClient>, tools: ToolSet) -> Self {
        Self {
            llm,
            tools,
            hooks: HookChain::new(),
            request_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            max_turns: DEFAULT_MAX_TURNS,
            context: ContextWindow::new(CONTEXT_MESSAGES),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.context.set_system_prompt(prompt);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Report tool invocations to `hooks` under `request_id`.
    pub fn with_hooks(mut self, hooks: HookChain, request_id: Uuid) -> Self {
        self.hooks = hooks;
        self.request_id = request_id;
        self
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub fn messages(&self) -> &[Message] {
        self.context.messages()
    }

    /// Submit `question` and drive the loop to a final answer.
    ///
    /// Tool failures are reported back to the model; cancellation aborts
    /// the whole session with [`BridgeError::Cancelled`]. Backend failures
    /// and running out of turns are [`BridgeError::Orchestration`].
    pub async fn run(&mut self, question: &str, cancel: &CancellationToken) -> BridgeResult<String> {
        self.context.push(Message::user(question, self.session_id));
        let descriptors = self.tools.descriptors();

        info!(
            request_id = %self.request_id,
            session_id = %self.session_id,
            tools = descriptors.len(),
            "Starting model session"
        );

        for turn in 0..self.max_turns {
            if cancel.is_cancelled() {
                return Err(BridgeError::Cancelled);
            }
            info!(request_id = %self.request_id, turn, "Model session turn");

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
                response = self.llm.chat(
                    self.context.system_prompt(),
                    self.context.messages(),
                    &descriptors,
                ) => response.map_err(into_orchestration)?,
            };

            match response {
                LlmResponse::Done(text) => {
                    self.context
                        .push(Message::assistant(&text, self.session_id));
                    info!(
                        request_id = %self.request_id,
                        turns = turn + 1,
                        "Model session completed"
                    );
                    return Ok(text);
                }

                LlmResponse::Text(text) => {
                    self.context
                        .push(Message::assistant(text, self.session_id));
                }

                LlmResponse::ToolUse {
                    content,
                    tool_calls,
                } => {
                    self.context.push(Message::assistant_tool_calls(
                        content.unwrap_or_default(),
                        &tool_calls,
                        self.session_id,
                    ));

                    let results = join_all(tool_calls.into_iter().map(|call| self.run_tool(call, cancel)))
                        .await;
                    for result in results {
                        self.context.push(result?);
                    }
                }
            }
        }

        warn!(
            request_id = %self.request_id,
            max_turns = self.max_turns,
            "Model session reached max turns"
        );
        Err(BridgeError::Orchestration(format!(
            "model session exceeded maximum of {} turns",
            self.max_turns
        )))
    }

    /// Run one tool call and turn its outcome into a tool message.
    async fn run_tool(&self, call: ToolCall, cancel: &CancellationToken) -> BridgeResult<Message> {
        let start = Instant::now();
        let tool = call.name.clone();
        let call_id = call.id.clone();
        info!(request_id = %self.request_id, tool = %tool, call_id = %call_id, "Executing tool call");

        let (result, outcome) = match self.tools.invoke(call, cancel).await {
            Ok(result) if result.is_error => (result, InvocationOutcome::Error),
            Ok(result) => (result, InvocationOutcome::Success),
            Err(BridgeError::Cancelled) => {
                self.report(&tool, &call_id, start, InvocationOutcome::Cancelled)
                    .await;
                return Err(BridgeError::Cancelled);
            }
            Err(e) => {
                error!(error = %e, tool = %tool, "Tool execution failed");
                (ToolResult::error(&call_id, e.to_string()), InvocationOutcome::Error)
            }
        };
        self.report(&tool, &call_id, start, outcome).await;

        Ok(Message::tool(
            &call_id,
            result.content,
            result.is_error,
            self.session_id,
        ))
    }

    async fn report(&self, tool: &str, call_id: &str, start: Instant, outcome: InvocationOutcome) {
        self.hooks
            .emit(BridgeEvent::tool_invoked(
                self.request_id,
                tool,
                call_id,
                start.elapsed().as_millis() as u64,
                outcome,
            ))
            .await;
    }
}

fn into_orchestration(err: BridgeError) -> BridgeError {
    match err {
        BridgeError::Cancelled | BridgeError::Orchestration(_) => err,
        other => BridgeError::Orchestration(format!("model backend failed: {other}")),
    }
}
