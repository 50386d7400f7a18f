//! A2A JSON-RPC 2.0 message types.

use serde::{Deserialize, Serialize};
use skillbridge_core::{BridgeError, BridgeResult};

/// Method name for a synchronous agent request.
pub const MESSAGE_SEND: &str = "message/send";

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(
        id: impl Into<String>,
        method: impl Into<String>,
        params: Option<serde_json::Value>,
    ) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// A `message/send` request carrying `text` as a single user text part.
    pub fn message_send(text: &str) -> Self {
        let message = AgentMessage::user_text(text);
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            MESSAGE_SEND,
            Some(serde_json::json!({ "message": message })),
        )
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// Echo of the request id; agents may send a number or a string.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Whether this response answers the request with `request_id`.
    /// A missing or null id is accepted.
    pub fn answers(&self, request_id: &str) -> bool {
        match &self.id {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::String(id)) => id == request_id,
            Some(other) => other.to_string() == request_id,
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)?;
        match &self.data {
            Some(data) if !data.is_null() => write!(f, " ({data})"),
            _ => Ok(()),
        }
    }
}

/// A content part inside a message or artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text {
        text: String,
    },
    Data {
        data: serde_json::Value,
    },
    File {
        file: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

/// Concatenate the text parts, skipping everything else.
fn text_of(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn message_kind() -> String {
    "message".to_string()
}

/// A single A2A message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessage {
    #[serde(default = "message_kind")]
    pub kind: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl AgentMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            kind: message_kind(),
            role: "user".to_string(),
            parts: vec![Part::Text { text: text.into() }],
            message_id: Some(uuid::Uuid::new_v4().to_string()),
            task_id: None,
            context_id: None,
        }
    }

    pub fn text(&self) -> String {
        text_of(&self.parts)
    }
}

/// Lifecycle state of a remote task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
    Rejected,
    AuthRequired,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// True for the states that mean the remote agent did not do the work.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Canceled | Self::Failed | Self::Rejected)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default)]
    pub message: Option<AgentMessage>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A remote task, returned when the agent tracks the request as work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub context_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl Task {
    /// Artifact text, falling back to the status message.
    pub fn text(&self) -> String {
        let artifacts: String = self.artifacts.iter().map(|a| text_of(&a.parts)).collect();
        if !artifacts.is_empty() {
            return artifacts;
        }
        self.status
            .message
            .as_ref()
            .map(AgentMessage::text)
            .unwrap_or_default()
    }
}

/// The `result` member of a `message/send` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SendMessageResult {
    Message(AgentMessage),
    Task(Task),
}

impl SendMessageResult {
    /// Reduce the result to the text the caller sees.
    pub fn into_text(self) -> BridgeResult<String> {
        match self {
            Self::Message(message) => Ok(message.text()),
            Self::Task(task) if task.status.state.is_failure() => {
                Err(BridgeError::remote(format!(
                    "remote task '{}' ended in state {:?}: {}",
                    task.id,
                    task.status.state,
                    task.text()
                )))
            }
            Self::Task(task) => Ok(task.text()),
        }
    }
}
