//! Turns the skills of a capability card into model-visible tools.

use crate::card::{CapabilityCard, Skill};
use crate::remote::{AgentInvoker, InvokeOptions};
use async_trait::async_trait;
use serde::Serialize;
use skillbridge_core::{BridgeError, BridgeResult, CancellationToken, ToolCall, ToolResult};
use skillbridge_tools::{Tool, ToolDescriptor, ToolSet};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Argument schema shared by every remote skill tool: a single text input.
pub fn input_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "input": {"type": "string"}
        },
        "required": ["input"]
    })
}

/// The prompt-level contract rendered for each skill, in key order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SkillContract<'a> {
    description: &'a str,
    tags: String,
    examples: String,
    input_modes: String,
    output_modes: String,
}

fn bracketed(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

/// Binds card skills to tools.
pub struct SkillBinder;

impl SkillBinder {
    /// Deterministic description for `skill`: a pretty-printed JSON object
    /// with description, tags, examples, input and output modes.
    pub fn describe(skill: &Skill) -> String {
        let contract = SkillContract {
            description: &skill.description,
            tags: bracketed(&skill.tags),
            examples: bracketed(&skill.examples),
            input_modes: bracketed(&skill.input_modes),
            output_modes: bracketed(&skill.output_modes),
        };
        serde_json::to_string_pretty(&contract).unwrap_or_else(|_| skill.description.clone())
    }

    /// One tool per skill, in card order, all routed to `agent`.
    ///
    /// Fails with [`BridgeError::Binding`] when two skills share a name.
    pub fn bind(card: &CapabilityCard, agent: Arc<dyn AgentInvoker>) -> BridgeResult<ToolSet> {
        Self::bind_with_options(card, agent, InvokeOptions::default())
    }

    /// Like [`SkillBinder::bind`], with `options` applied to every call the
    /// generated tools make.
    pub fn bind_with_options(
        card: &CapabilityCard,
        agent: Arc<dyn AgentInvoker>,
        options: InvokeOptions,
    ) -> BridgeResult<ToolSet> {
        let mut seen = HashSet::new();
        let mut duplicates: Vec<&str> = Vec::new();
        for skill in &card.skills {
            if !seen.insert(skill.name.as_str()) && !duplicates.contains(&skill.name.as_str()) {
                duplicates.push(&skill.name);
            }
        }
        if !duplicates.is_empty() {
            return Err(BridgeError::Binding(format!(
                "capability card '{}' declares duplicate skill names: {}",
                card.name,
                duplicates.join(", ")
            )));
        }

        let tools = card
            .skills
            .iter()
            .map(|skill| {
                Arc::new(RemoteSkillTool::new(skill, agent.clone()).with_options(options.clone()))
                    as Arc<dyn Tool>
            });
        let set = ToolSet::from_tools(tools)?;
        debug!(agent = %card.name, tools = ?set.names(), "Bound card skills");
        Ok(set)
    }
}

/// A card skill exposed as a tool. Invocation forwards the text input to the
/// agent handle captured at binding time.
pub struct RemoteSkillTool {
    descriptor: ToolDescriptor,
    agent: Arc<dyn AgentInvoker>,
    options: InvokeOptions,
}

impl RemoteSkillTool {
    pub fn new(skill: &Skill, agent: Arc<dyn AgentInvoker>) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: skill.name.clone(),
                description: SkillBinder::describe(skill),
                parameters_schema: input_schema(),
            },
            agent,
            options: InvokeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InvokeOptions) -> Self {
        self.options = options;
        self
    }
}

/// Text input from the model's arguments: `{"input": "..."}` or a bare string.
fn text_input(arguments: &serde_json::Value) -> Option<&str> {
    match arguments {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Object(map) => map.get("input").and_then(|v| v.as_str()),
        _ => None,
    }
}

#[async_trait]
impl Tool for RemoteSkillTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, call: ToolCall, cancel: &CancellationToken) -> BridgeResult<ToolResult> {
        let input = text_input(&call.arguments).ok_or_else(|| {
            BridgeError::Tool(format!(
                "tool '{}' expects a string argument 'input'",
                self.descriptor.name
            ))
        })?;
        debug!(
            tool = %self.descriptor.name,
            agent = %self.agent.name(),
            call_id = %call.id,
            "Forwarding tool call to remote agent"
        );
        let text = self.agent.invoke(input, &self.options, cancel).await?;
        Ok(ToolResult::success(&call.id, text))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct Recorder {
        name: String,
        seen: Mutex<Vec<String>>,
        timeouts: Mutex<Vec<Option<Duration>>>,
    }

    impl Recorder {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                seen: Mutex::new(Vec::new()),
                timeouts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AgentInvoker for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        async fn invoke(
            &self,
            input: &str,
            options: &InvokeOptions,
            _cancel: &CancellationToken,
        ) -> BridgeResult<String> {
            self.timeouts.lock().await.push(options.timeout);
            self.seen.lock().await.push(input.to_string());
            Ok(format!("{} handled {input}", self.name))
        }
    }

    fn card(skills: Vec<Skill>) -> CapabilityCard {
        CapabilityCard {
            name: "letters".into(),
            description: String::new(),
            url: "http://agent/".into(),
            version: String::new(),
            protocol_version: None,
            capabilities: Default::default(),
            default_input_modes: vec![],
            default_output_modes: vec![],
            skills,
        }
    }

    fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn test_describe_format() {
        let mut skill = Skill::new("count-letters", "Counts letters");
        skill.tags = vec!["letters".into(), "count".into()];
        skill.input_modes = vec!["text".into()];

        let expected = "{\n  \"description\": \"Counts letters\",\n  \"tags\": \"[letters, count]\",\n  \"examples\": \"[]\",\n  \"inputModes\": \"[text]\",\n  \"outputModes\": \"[]\"\n}";
        assert_eq!(SkillBinder::describe(&skill), expected);
        assert_eq!(SkillBinder::describe(&skill), SkillBinder::describe(&skill.clone()));
    }

    #[test]
    fn test_bind_preserves_card_order() {
        let card = card(vec![
            Skill::new("zeta", "z"),
            Skill::new("alpha", "a"),
            Skill::new("mid", "m"),
        ]);
        let tools = SkillBinder::bind(&card, Recorder::new("letters")).unwrap();

        assert_eq!(tools.names(), vec!["zeta", "alpha", "mid"]);
        for (descriptor, skill) in tools.descriptors().iter().zip(&card.skills) {
            assert_eq!(descriptor.description, SkillBinder::describe(skill));
            assert_eq!(descriptor.parameters_schema, input_schema());
        }
    }

    #[test]
    fn test_bind_zero_skills() {
        let tools = SkillBinder::bind(&card(vec![]), Recorder::new("letters")).unwrap();
        assert!(tools.is_empty());
    }

    #[test]
    fn test_duplicate_skill_names_fail_binding() {
        let card = card(vec![
            Skill::new("echo", "one"),
            Skill::new("other", "two"),
            Skill::new("echo", "three"),
        ]);
        let err = SkillBinder::bind(&card, Recorder::new("letters")).unwrap_err();
        assert!(matches!(err, BridgeError::Binding(ref m) if m.contains("echo")));
    }

    #[tokio::test]
    async fn test_tool_routes_to_captured_agent() {
        let first = Recorder::new("first");
        let second = Recorder::new("second");
        let a = SkillBinder::bind(&card(vec![Skill::new("count-letters", "")]), first.clone())
            .unwrap();
        let b = SkillBinder::bind(&card(vec![Skill::new("count-letters", "")]), second.clone())
            .unwrap();
        let cancel = CancellationToken::new();

        let result = a
            .invoke(
                call("count-letters", serde_json::json!({"input": "strawberry"})),
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(result.content, "first handled strawberry");
        assert_eq!(result.call_id, "call_1");

        b.invoke(call("count-letters", serde_json::json!("banana")), &cancel)
            .await
            .unwrap();
        assert_eq!(*first.seen.lock().await, vec!["strawberry"]);
        assert_eq!(*second.seen.lock().await, vec!["banana"]);
    }

    #[tokio::test]
    async fn test_missing_input_is_tool_error() {
        let recorder = Recorder::new("letters");
        let tools = SkillBinder::bind(&card(vec![Skill::new("s", "")]), recorder.clone()).unwrap();
        let err = tools
            .invoke(
                call("s", serde_json::json!({"text": 1})),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Tool(_)));
        assert!(recorder.seen.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_bound_tools_pass_invoke_options() {
        let agent = Recorder::new("letters");
        let card = card(vec![Skill::new("count-letters", "")]);
        let cancel = CancellationToken::new();

        let bounded = SkillBinder::bind_with_options(
            &card,
            agent.clone(),
            InvokeOptions {
                timeout: Some(Duration::from_secs(7)),
            },
        )
        .unwrap();
        bounded
            .invoke(call("count-letters", serde_json::json!("apple")), &cancel)
            .await
            .unwrap();

        let unbounded = SkillBinder::bind(&card, agent.clone()).unwrap();
        unbounded
            .invoke(call("count-letters", serde_json::json!("pear")), &cancel)
            .await
            .unwrap();

        assert_eq!(
            *agent.timeouts.lock().await,
            vec![Some(Duration::from_secs(7)), None]
        );
    }
}
