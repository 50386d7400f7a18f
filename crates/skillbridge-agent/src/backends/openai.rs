use super::LlmBackend;
use crate::config::{LlmProvider, ModelConfig};
use crate::llm::LlmResponse;
use async_trait::async_trait;
use skillbridge_core::{BridgeError, BridgeResult, Message, Role, ToolCall};
use skillbridge_tools::ToolDescriptor;

/// OpenAI-compatible chat completions backend.
///
/// Works with OpenAI, OpenRouter, Groq, Azure-hosted deployments and any
/// other provider that implements the OpenAI chat completions API.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn build_messages(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
    ) -> Vec<serde_json::Value> {
        let mut api_messages: Vec<serde_json::Value> = Vec::new();

        if let Some(sys) = system_prompt {
            api_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }

        api_messages.extend(messages.iter().filter_map(wire_message));
        api_messages
    }

    fn build_tools(&self, tools: &[ToolDescriptor]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters_schema,
                    }
                })
            })
            .collect()
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.bearer_auth(&self.config.api_key);

        // OpenRouter requires extra headers
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request.header("X-Title", "skillbridge")
        } else {
            request
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> BridgeResult<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let mut body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": self.build_messages(system_prompt, messages),
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(self.build_tools(tools));
        }

        let resp = self
            .add_provider_headers(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| BridgeError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BridgeError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(BridgeError::Http(format!(
                "OpenAI API error {status}: {resp_body}"
            )));
        }

        parse_openai_response(&resp_body)
    }
}

/// One history message in chat completions form. Tool requests travel as
/// `tool_calls`, results as `role: "tool"` keyed by `tool_call_id`.
fn wire_message(message: &Message) -> Option<serde_json::Value> {
    match message.role {
        Role::System => None,
        Role::User => Some(serde_json::json!({"role": "user", "content": message.content})),
        Role::Assistant => {
            let calls = message.tool_calls();
            if calls.is_empty() {
                return Some(serde_json::json!({"role": "assistant", "content": message.content}));
            }
            let tool_calls: Vec<serde_json::Value> = calls
                .iter()
                .map(|call| {
                    serde_json::json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments.to_string(),
                        }
                    })
                })
                .collect();
            let content = (!message.content.is_empty()).then_some(message.content.as_str());
            Some(serde_json::json!({
                "role": "assistant",
                "content": content,
                "tool_calls": tool_calls,
            }))
        }
        Role::Tool => Some(serde_json::json!({
            "role": "tool",
            "tool_call_id": message.call_id().unwrap_or_default(),
            "content": message.content,
        })),
    }
}

pub fn parse_openai_response(body: &serde_json::Value) -> BridgeResult<LlmResponse> {
    let choice = &body["choices"][0];
    if choice.is_null() {
        return Err(BridgeError::Orchestration(
            "Missing choices in OpenAI response".into(),
        ));
    }
    let message = &choice["message"];
    let content = message["content"].as_str().unwrap_or_default().to_string();

    if let Some(tool_calls_json) = message["tool_calls"].as_array() {
        let tool_calls: Vec<ToolCall> = tool_calls_json
            .iter()
            .filter_map(|tc| {
                let id = tc["id"].as_str()?.to_string();
                let name = tc["function"]["name"].as_str()?.to_string();
                let arguments: serde_json::Value =
                    serde_json::from_str(tc["function"]["arguments"].as_str()?).unwrap_or_default();
                Some(ToolCall {
                    id,
                    name,
                    arguments,
                })
            })
            .collect();

        if !tool_calls.is_empty() {
            return Ok(LlmResponse::ToolUse {
                content: (!content.is_empty()).then_some(content),
                tool_calls,
            });
        }
    }

    if choice["finish_reason"].as_str().unwrap_or("stop") == "stop" {
        Ok(LlmResponse::Done(content))
    } else {
        Ok(LlmResponse::Text(content))
    }
}
