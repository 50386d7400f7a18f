use crate::tool::ToolCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

const CALL_ID_KEY: &str = "call_id";
const IS_ERROR_KEY: &str = "is_error";
const TOOL_CALLS_KEY: &str = "tool_calls";

/// The role of the participant that authored a [`Message`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The caller asking the question.
    User,
    /// The orchestrating model.
    Assistant,
    /// A system-level instruction or prompt.
    System,
    /// Output produced by a tool invocation.
    Tool,
}

/// A single message exchanged within one orchestration session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message.
    pub id: Uuid,
    /// The role of the message author.
    pub role: Role,
    /// The textual content of the message.
    pub content: String,
    /// The session this message belongs to.
    pub session_id: Uuid,
    /// UTC timestamp of when the message was created.
    pub timestamp: DateTime<Utc>,
    /// Arbitrary key-value metadata attached to the message.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Message {
    /// Creates a new message with the given role, content, and session ID.
    pub fn new(role: Role, content: impl Into<String>, session_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            session_id,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Creates a new message with [`Role::User`].
    pub fn user(content: impl Into<String>, session_id: Uuid) -> Self {
        Self::new(Role::User, content, session_id)
    }

    /// Creates a new message with [`Role::Assistant`].
    pub fn assistant(content: impl Into<String>, session_id: Uuid) -> Self {
        Self::new(Role::Assistant, content, session_id)
    }

    /// Creates a new message with [`Role::System`].
    pub fn system(content: impl Into<String>, session_id: Uuid) -> Self {
        Self::new(Role::System, content, session_id)
    }

    /// Creates an assistant turn that requests `tool_calls`, with any
    /// accompanying text as content.
    pub fn assistant_tool_calls(
        content: impl Into<String>,
        tool_calls: &[ToolCall],
        session_id: Uuid,
    ) -> Self {
        let mut msg = Self::assistant(content, session_id);
        msg.metadata.insert(
            TOOL_CALLS_KEY.to_string(),
            serde_json::to_value(tool_calls).unwrap_or_default(),
        );
        msg
    }

    /// Creates a [`Role::Tool`] message tagged with the originating call ID.
    ///
    /// `content` is the tool output exactly as the tool produced it.
    pub fn tool(
        call_id: &str,
        content: impl Into<String>,
        is_error: bool,
        session_id: Uuid,
    ) -> Self {
        let mut msg = Self::new(Role::Tool, content, session_id);
        msg.metadata.insert(
            CALL_ID_KEY.to_string(),
            serde_json::Value::String(call_id.to_string()),
        );
        msg.metadata
            .insert(IS_ERROR_KEY.to_string(), serde_json::Value::Bool(is_error));
        msg
    }

    /// The tool call ID this message answers, if it is a tool message.
    pub fn call_id(&self) -> Option<&str> {
        self.metadata.get(CALL_ID_KEY).and_then(|v| v.as_str())
    }

    /// Whether this tool message reports a failed invocation.
    pub fn is_tool_error(&self) -> bool {
        self.metadata
            .get(IS_ERROR_KEY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Tool calls requested by this assistant turn; empty for any other message.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.metadata
            .get(TOOL_CALLS_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}
