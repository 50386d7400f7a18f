use super::LlmBackend;
use crate::config::ModelConfig;
use crate::llm::LlmResponse;
use async_trait::async_trait;
use serde::Serialize;
use skillbridge_core::{BridgeError, BridgeResult, Message, Role, ToolCall};
use skillbridge_tools::ToolDescriptor;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude (Anthropic Messages API) backend.
pub struct ClaudeBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl ClaudeBackend {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn build_body(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> BridgeResult<serde_json::Value> {
        let api_messages = wire_messages(messages);

        let mut body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": api_messages,
        });

        if let Some(sys) = system_prompt {
            body["system"] = serde_json::json!(sys);
        }

        if !tools.is_empty() {
            let claude_tools: Vec<ClaudeTool> = tools
                .iter()
                .map(|t| ClaudeTool {
                    name: &t.name,
                    description: &t.description,
                    input_schema: &t.parameters_schema,
                })
                .collect();
            body["tools"] = serde_json::to_value(&claude_tools)?;
        }
        Ok(body)
    }
}

#[async_trait]
impl LlmBackend for ClaudeBackend {
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> BridgeResult<LlmResponse> {
        let url = format!("{}/v1/messages", self.config.base_url());
        let body = self.build_body(system_prompt, messages, tools)?;

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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
                "Claude API error {status}: {resp_body}"
            )));
        }

        parse_claude_response(&resp_body)
    }
}

// -- Claude wire types --

#[derive(Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: serde_json::Value,
}

/// History in Messages API form. Tool requests become `tool_use` blocks on
/// the assistant turn; consecutive results share one user turn of
/// `tool_result` blocks.
fn wire_messages(messages: &[Message]) -> Vec<ClaudeMessage> {
    let mut out: Vec<ClaudeMessage> = Vec::new();
    let mut results: Vec<serde_json::Value> = Vec::new();

    for message in messages {
        if message.role == Role::Tool {
            results.push(serde_json::json!({
                "type": "tool_result",
                "tool_use_id": message.call_id().unwrap_or_default(),
                "content": message.content,
                "is_error": message.is_tool_error(),
            }));
            continue;
        }
        if !results.is_empty() {
            out.push(ClaudeMessage {
                role: "user",
                content: serde_json::Value::Array(std::mem::take(&mut results)),
            });
        }
        match message.role {
            Role::User => out.push(ClaudeMessage {
                role: "user",
                content: serde_json::json!(message.content),
            }),
            Role::Assistant => {
                let calls = message.tool_calls();
                let content = if calls.is_empty() {
                    serde_json::json!(message.content)
                } else {
                    let mut blocks = Vec::with_capacity(calls.len() + 1);
                    if !message.content.is_empty() {
                        blocks.push(serde_json::json!({"type": "text", "text": message.content}));
                    }
                    blocks.extend(calls.iter().map(|call| {
                        serde_json::json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments,
                        })
                    }));
                    serde_json::Value::Array(blocks)
                };
                out.push(ClaudeMessage {
                    role: "assistant",
                    content,
                });
            }
            Role::System | Role::Tool => {}
        }
    }
    if !results.is_empty() {
        out.push(ClaudeMessage {
            role: "user",
            content: serde_json::Value::Array(results),
        });
    }
    out
}

#[derive(Serialize)]
struct ClaudeTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

pub fn parse_claude_response(body: &serde_json::Value) -> BridgeResult<LlmResponse> {
    let content = body["content"].as_array().ok_or_else(|| {
        BridgeError::Orchestration("Missing content in Claude response".into())
    })?;

    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in content {
        match block["type"].as_str() {
            Some("text") => {
                if let Some(t) = block["text"].as_str() {
                    text_parts.push(t.to_string());
                }
            }
            Some("tool_use") => {
                let id = block["id"].as_str().unwrap_or_default().to_string();
                let name = block["name"].as_str().unwrap_or_default().to_string();
                tool_calls.push(ToolCall {
                    id,
                    name,
                    arguments: block["input"].clone(),
                });
            }
            _ => {}
        }
    }

    let text = text_parts.join("\n");
    if !tool_calls.is_empty() {
        Ok(LlmResponse::ToolUse {
            content: (!text.is_empty()).then_some(text),
            tool_calls,
        })
    } else if body["stop_reason"].as_str().unwrap_or("end_turn") == "end_turn" {
        Ok(LlmResponse::Done(text))
    } else {
        Ok(LlmResponse::Text(text))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_tool_use() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Let me count."},
                {"type": "tool_use", "id": "toolu_1", "name": "count-letters",
                 "input": {"input": "strawberry"}}
            ],
            "stop_reason": "tool_use"
        });
        match parse_claude_response(&body).unwrap() {
            LlmResponse::ToolUse {
                content,
                tool_calls,
            } => {
                assert_eq!(content.as_deref(), Some("Let me count."));
                assert_eq!(tool_calls[0].name, "count-letters");
                assert_eq!(tool_calls[0].arguments["input"], "strawberry");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_final_and_partial_text() {
        let done = json!({"content": [{"type": "text", "text": "3"}], "stop_reason": "end_turn"});
        assert!(matches!(parse_claude_response(&done).unwrap(), LlmResponse::Done(t) if t == "3"));

        let cut = json!({"content": [{"type": "text", "text": "The"}], "stop_reason": "max_tokens"});
        assert!(matches!(parse_claude_response(&cut).unwrap(), LlmResponse::Text(_)));
    }

    #[test]
    fn test_tool_exchange_uses_tool_use_and_tool_result_blocks() {
        let backend = ClaudeBackend::new(ModelConfig {
            provider: crate::config::LlmProvider::Claude,
            model_id: "claude-sonnet-4".to_string(),
            api_key: String::new(),
            api_base_url: None,
            temperature: 0.0,
            max_tokens: 256,
            max_turns: 5,
        });
        let session = uuid::Uuid::new_v4();
        let calls = [
            ToolCall {
                id: "toolu_a".to_string(),
                name: "count-letters".to_string(),
                arguments: json!({"input": "apple"}),
            },
            ToolCall {
                id: "toolu_b".to_string(),
                name: "count-letters".to_string(),
                arguments: json!({"input": "banana"}),
            },
        ];
        let history = vec![
            Message::user("lengths?", session),
            Message::assistant_tool_calls("Counting.", &calls, session),
            Message::tool("toolu_a", "5", false, session),
            Message::tool("toolu_b", "remote agent unavailable", true, session),
        ];

        let body = backend.build_body(Some("sys"), &history, &[]).unwrap();
        assert_eq!(body["system"], "sys");
        let wire = body["messages"].as_array().unwrap();
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0], json!({"role": "user", "content": "lengths?"}));

        assert_eq!(wire[1]["role"], "assistant");
        let blocks = wire[1]["content"].as_array().unwrap();
        assert_eq!(blocks[0], json!({"type": "text", "text": "Counting."}));
        assert_eq!(
            blocks[1],
            json!({"type": "tool_use", "id": "toolu_a", "name": "count-letters", "input": {"input": "apple"}})
        );
        assert_eq!(blocks[2]["id"], "toolu_b");

        assert_eq!(wire[2]["role"], "user");
        assert_eq!(
            wire[2]["content"],
            json!([
                {"type": "tool_result", "tool_use_id": "toolu_a", "content": "5", "is_error": false},
                {"type": "tool_result", "tool_use_id": "toolu_b", "content": "remote agent unavailable", "is_error": true}
            ])
        );
    }

    #[test]
    fn test_missing_content_is_orchestration_error() {
        let err = parse_claude_response(&json!({"type": "error"})).unwrap_err();
        assert!(matches!(err, BridgeError::Orchestration(_)));
    }
}
