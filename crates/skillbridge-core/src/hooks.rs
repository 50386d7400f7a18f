//! Observability hooks around the orchestration pipeline.
//!
//! Components never branch on hook results: a hook is told what happened
//! and returns nothing. [`TracingHook`] is the default sink; tests install
//! recording hooks to assert on the sequence of phases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Phases of a single `ask` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AskPhase {
    /// Nothing has happened yet.
    Idle,
    /// Fetching the capability card.
    Resolving,
    /// Turning skills into tools.
    Binding,
    /// The model session is running with the bound tools.
    SessionActive,
    /// An answer was produced.
    Completed,
    /// The call failed; no answer was produced.
    Failed,
}

impl AskPhase {
    /// Returns true for [`AskPhase::Completed`] and [`AskPhase::Failed`].
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for AskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Binding => "binding",
            Self::SessionActive => "session_active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a single tool invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationOutcome {
    /// The remote skill returned text.
    Success,
    /// The call failed and the failure was reported to the model.
    Error,
    /// The call was cancelled.
    Cancelled,
}

/// Events emitted while an `ask` call runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// The `ask` state machine moved to a new phase.
    PhaseChanged {
        request_id: Uuid,
        phase: AskPhase,
        timestamp: DateTime<Utc>,
    },
    /// A capability card was fetched and parsed.
    CardResolved {
        request_id: Uuid,
        endpoint: String,
        agent: String,
        skills: usize,
        timestamp: DateTime<Utc>,
    },
    /// Tools were generated from the card, in manifest order.
    ToolsBound {
        request_id: Uuid,
        tools: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    /// The model invoked a tool.
    ToolInvoked {
        request_id: Uuid,
        tool: String,
        call_id: String,
        duration_ms: u64,
        outcome: InvocationOutcome,
        timestamp: DateTime<Utc>,
    },
    /// The `ask` call reached a terminal phase.
    AskFinished {
        request_id: Uuid,
        duration_ms: u64,
        success: bool,
        timestamp: DateTime<Utc>,
    },
}

impl BridgeEvent {
    /// Build a [`BridgeEvent::PhaseChanged`] stamped with the current time.
    pub fn phase(request_id: Uuid, phase: AskPhase) -> Self {
        Self::PhaseChanged {
            request_id,
            phase,
            timestamp: Utc::now(),
        }
    }

    pub fn card_resolved(
        request_id: Uuid,
        endpoint: impl Into<String>,
        agent: impl Into<String>,
        skills: usize,
    ) -> Self {
        Self::CardResolved {
            request_id,
            endpoint: endpoint.into(),
            agent: agent.into(),
            skills,
            timestamp: Utc::now(),
        }
    }

    pub fn tools_bound(request_id: Uuid, tools: Vec<String>) -> Self {
        Self::ToolsBound {
            request_id,
            tools,
            timestamp: Utc::now(),
        }
    }

    pub fn tool_invoked(
        request_id: Uuid,
        tool: impl Into<String>,
        call_id: impl Into<String>,
        duration_ms: u64,
        outcome: InvocationOutcome,
    ) -> Self {
        Self::ToolInvoked {
            request_id,
            tool: tool.into(),
            call_id: call_id.into(),
            duration_ms,
            outcome,
            timestamp: Utc::now(),
        }
    }

    pub fn ask_finished(request_id: Uuid, duration_ms: u64, success: bool) -> Self {
        Self::AskFinished {
            request_id,
            duration_ms,
            success,
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of [`BridgeEvent`]s.
#[async_trait]
pub trait BridgeHook: Send + Sync {
    /// Called once per event, in emission order.
    async fn on_event(&self, event: &BridgeEvent);
}

/// Composite hook that dispatches events to multiple hooks.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn BridgeHook>>,
}

impl HookChain {
    /// An empty chain.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// A chain holding only a [`TracingHook`].
    pub fn with_tracing() -> Self {
        let mut chain = Self::new();
        chain.add(Arc::new(TracingHook));
        chain
    }

    /// Add a hook to the chain.
    pub fn add(&mut self, hook: Arc<dyn BridgeHook>) {
        self.hooks.push(hook);
    }

    /// Emit an event to all hooks in the chain.
    pub async fn emit(&self, event: BridgeEvent) {
        for hook in &self.hooks {
            hook.on_event(&event).await;
        }
    }
}

/// Hook that writes every event to `tracing`.
pub struct TracingHook;

#[async_trait]
impl BridgeHook for TracingHook {
    async fn on_event(&self, event: &BridgeEvent) {
        match event {
            BridgeEvent::PhaseChanged {
                request_id, phase, ..
            } => {
                if phase.is_terminal() {
                    info!(request_id = %request_id, phase = %phase, "ask phase changed");
                } else {
                    debug!(request_id = %request_id, phase = %phase, "ask phase changed");
                }
            }
            BridgeEvent::CardResolved {
                request_id,
                endpoint,
                agent,
                skills,
                ..
            } => {
                info!(
                    request_id = %request_id,
                    endpoint = %endpoint,
                    agent = %agent,
                    skills,
                    "Capability card resolved"
                );
            }
            BridgeEvent::ToolsBound {
                request_id, tools, ..
            } => {
                info!(request_id = %request_id, tools = ?tools, "Tools bound");
            }
            BridgeEvent::ToolInvoked {
                request_id,
                tool,
                call_id,
                duration_ms,
                outcome,
                ..
            } => match outcome {
                InvocationOutcome::Success => info!(
                    request_id = %request_id,
                    tool = %tool,
                    call_id = %call_id,
                    duration_ms,
                    "Remote skill invoked"
                ),
                _ => warn!(
                    request_id = %request_id,
                    tool = %tool,
                    call_id = %call_id,
                    duration_ms,
                    outcome = ?outcome,
                    "Remote skill invocation did not succeed"
                ),
            },
            BridgeEvent::AskFinished {
                request_id,
                duration_ms,
                success,
                ..
            } => {
                info!(request_id = %request_id, duration_ms, success, "ask finished");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<BridgeEvent>>,
    }

    #[async_trait]
    impl BridgeHook for Recorder {
        async fn on_event(&self, event: &BridgeEvent) {
            self.seen.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn test_chain_dispatches_to_every_hook() {
        let a = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let b = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let mut chain = HookChain::with_tracing();
        chain.add(a.clone());
        chain.add(b.clone());

        let id = Uuid::new_v4();
        chain.emit(BridgeEvent::phase(id, AskPhase::Resolving)).await;
        chain.emit(BridgeEvent::phase(id, AskPhase::Failed)).await;

        for recorder in [&a, &b] {
            let seen = recorder.seen.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert!(seen.iter().all(|e| matches!(
                e,
                BridgeEvent::PhaseChanged { request_id, .. } if *request_id == id
            )));
        }
    }

    #[test]
    fn test_phase_terminality() {
        assert!(!AskPhase::Idle.is_terminal());
        assert!(!AskPhase::SessionActive.is_terminal());
        assert!(AskPhase::Completed.is_terminal());
        assert!(AskPhase::Failed.is_terminal());
        assert_eq!(AskPhase::SessionActive.to_string(), "session_active");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = BridgeEvent::phase(Uuid::nil(), AskPhase::Binding);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase_changed");
        assert_eq!(json["phase"], "binding");
    }
}
