#![allow(clippy::unwrap_used, clippy::expect_used)]

use skillbridge_core::*;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// 1. Message serialization roundtrip
// ---------------------------------------------------------------------------

#[test]
fn message_serialization_roundtrip() {
    let session_id = Uuid::new_v4();
    let mut msg = Message::user("How many r's in strawberry?", session_id);
    msg.metadata.insert(
        "source".to_string(),
        serde_json::Value::String("test".to_string()),
    );

    let json = serde_json::to_string(&msg).unwrap();
    let deserialized: Message = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized.id, msg.id);
    assert_eq!(deserialized.role, Role::User);
    assert_eq!(deserialized.content, "How many r's in strawberry?");
    assert_eq!(deserialized.session_id, session_id);
    assert_eq!(deserialized.timestamp, msg.timestamp);
    assert_eq!(
        deserialized.metadata.get("source"),
        Some(&serde_json::Value::String("test".to_string()))
    );
}

// ---------------------------------------------------------------------------
// 2. ToolCall -> ToolResult flow
// ---------------------------------------------------------------------------

#[test]
fn tool_call_to_tool_result_flow() {
    let tool_call = ToolCall {
        id: "call_abc123".to_string(),
        name: "count-letters".to_string(),
        arguments: serde_json::json!({"input": "strawberry"}),
    };

    let success_result = ToolResult::success(&tool_call.id, "3");
    assert_eq!(success_result.call_id, tool_call.id);
    assert_eq!(success_result.content, "3");
    assert!(!success_result.is_error);

    let error_result = ToolResult::error(&tool_call.id, "Network timeout");
    assert_eq!(error_result.call_id, tool_call.id);
    assert!(error_result.is_error);
}

// ---------------------------------------------------------------------------
// 3. Error taxonomy: display, kinds and From impls
// ---------------------------------------------------------------------------

#[test]
fn error_display_and_from_impls() {
    let discovery = BridgeError::Discovery("connection refused".to_string());
    assert_eq!(discovery.to_string(), "Discovery error: connection refused");

    let binding = BridgeError::Binding("duplicate skill 'echo'".to_string());
    assert_eq!(binding.to_string(), "Binding error: duplicate skill 'echo'");

    let orchestration = BridgeError::Orchestration("model unavailable".to_string());
    assert_eq!(
        orchestration.to_string(),
        "Orchestration error: model unavailable"
    );

    assert_eq!(BridgeError::Cancelled.to_string(), "Operation cancelled");

    let bad_json = serde_json::from_str::<serde_json::Value>("not json");
    let err: BridgeError = bad_json.unwrap_err().into();
    assert!(err.to_string().starts_with("JSON error:"));
    assert_eq!(err.kind(), ErrorKind::Internal);

    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err: BridgeError = io_err.into();
    assert!(err.to_string().starts_with("IO error:"));
}

#[test]
fn each_failure_kind_is_distinct() {
    let kinds = [
        BridgeError::Discovery(String::new()).kind(),
        BridgeError::Binding(String::new()).kind(),
        BridgeError::remote("").kind(),
        BridgeError::Orchestration(String::new()).kind(),
        BridgeError::Cancelled.kind(),
    ];
    for (i, a) in kinds.iter().enumerate() {
        for b in &kinds[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Role serialization
// ---------------------------------------------------------------------------

#[test]
fn role_serialization() {
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");

    let assistant: Role = serde_json::from_str("\"assistant\"").unwrap();
    assert_eq!(assistant, Role::Assistant);

    let bad: Result<Role, _> = serde_json::from_str("\"unknown\"");
    assert!(bad.is_err());
}

// ---------------------------------------------------------------------------
// 5. Cancellation token is shared by clones
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancellation_propagates_to_children() {
    let parent = CancellationToken::new();
    let child = parent.child_token();
    assert!(!child.is_cancelled());
    parent.cancel();
    child.cancelled().await;
    assert!(child.is_cancelled());
}
