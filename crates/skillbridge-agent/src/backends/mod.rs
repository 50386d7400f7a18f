pub mod claude;
pub mod openai;

use crate::llm::LlmResponse;
use async_trait::async_trait;
use skillbridge_core::{BridgeResult, Message};
use skillbridge_tools::ToolDescriptor;

/// Trait for LLM provider backends.
///
/// To add a new provider:
/// 1. Create a new module in `backends/`
/// 2. Implement `LlmBackend` for your struct
/// 3. Add the variant to `LlmProvider` in `config.rs`
/// 4. Wire it up in `LlmClient::new()` in `llm.rs`
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// One chat completion over the full history, offering `tools`.
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> BridgeResult<LlmResponse>;
}
