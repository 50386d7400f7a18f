//! Core types and error definitions for skillbridge.
//!
//! This crate provides the foundational types shared across all skillbridge
//! crates: the error taxonomy, message and tool-call records, and the
//! observability hooks that wrap the orchestration pipeline.
//!
//! # Main types
//!
//! - [`BridgeError`]: Unified error enum; its kinds are what `ask` callers see.
//! - [`BridgeResult`]: Convenience alias for `Result<T, BridgeError>`.
//! - [`Message`] / [`Role`]: A single message within a model session.
//! - [`ToolCall`] / [`ToolResult`]: A model-initiated tool invocation and its result.
//! - [`HookChain`] / [`BridgeEvent`]: Observability around each component.
//! - [`CancellationToken`]: Top-down cancellation shared by every layer.

pub mod error;
pub mod hooks;
pub mod message;
pub mod tool;

pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use hooks::{AskPhase, BridgeEvent, BridgeHook, HookChain, InvocationOutcome, TracingHook};
pub use message::{Message, Role};
pub use tokio_util::sync::CancellationToken;
pub use tool::{ToolCall, ToolResult};
