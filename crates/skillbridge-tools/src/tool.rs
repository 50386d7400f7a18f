use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skillbridge_core::{BridgeResult, CancellationToken, ToolCall, ToolResult};

/// Metadata describing a tool as the orchestrating model sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Addressing key the model uses to select this tool.
    pub name: String,
    /// Prompt-level contract for the tool.
    pub description: String,
    /// JSON schema of the tool's arguments.
    pub parameters_schema: serde_json::Value,
}

/// A callable the orchestrating model can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's descriptor; stable for the tool's lifetime.
    fn descriptor(&self) -> &ToolDescriptor;

    /// Run the tool. Implementations must stop promptly and return
    /// [`skillbridge_core::BridgeError::Cancelled`] once `cancel` fires.
    async fn invoke(&self, call: ToolCall, cancel: &CancellationToken) -> BridgeResult<ToolResult>;
}
