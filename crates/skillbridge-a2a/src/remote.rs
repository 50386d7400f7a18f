//! Invocation of a remote agent over A2A `message/send`.

use crate::card::CapabilityCard;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, SendMessageResult};
use async_trait::async_trait;
use reqwest::Url;
use skillbridge_core::{BridgeError, BridgeResult, CancellationToken};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Something that can run a text request against a remote agent.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Name of the agent behind this handle.
    fn name(&self) -> &str;

    /// Send `input` and return the agent's text response unaltered.
    async fn invoke(
        &self,
        input: &str,
        options: &InvokeOptions,
        cancel: &CancellationToken,
    ) -> BridgeResult<String>;
}

/// Per-call invocation options.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Bound on a single round trip. `None` leaves it to the HTTP client.
    pub timeout: Option<Duration>,
}

/// Handle to a remote agent, obtained from its capability card.
#[derive(Debug, Clone)]
pub struct RemoteAgent {
    name: String,
    url: Url,
    http: reqwest::Client,
}

impl RemoteAgent {
    pub fn new(name: impl Into<String>, url: Url, http: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            url,
            http,
        }
    }

    /// Handle for the agent a resolved card describes.
    pub fn from_card(card: &CapabilityCard, http: reqwest::Client) -> BridgeResult<Self> {
        let url = Url::parse(&card.url).map_err(|e| {
            BridgeError::Discovery(format!(
                "capability card '{}' has an invalid url '{}': {e}",
                card.name, card.url
            ))
        })?;
        Ok(Self::new(card.name.clone(), url, http))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn send(&self, input: &str, timeout: Option<Duration>) -> BridgeResult<String> {
        let request = JsonRpcRequest::message_send(input);
        let start = Instant::now();
        debug!(agent = %self.name, url = %self.url, id = %request.id, "Sending message/send");

        let mut builder = self.http.post(self.url.clone()).json(&request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "timed out".to_string()
            } else {
                e.to_string()
            };
            warn!(agent = %self.name, error = %reason, "Remote agent unreachable");
            BridgeError::RemoteInvocation {
                status: e.status().map(|s| s.as_u16()),
                message: format!("remote agent '{}' request failed: {reason}", self.name),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(agent = %self.name, status = %status, "Remote agent returned an error status");
            return Err(BridgeError::RemoteInvocation {
                status: Some(status.as_u16()),
                message: format!("remote agent '{}' returned HTTP {status}: {body}", self.name),
            });
        }

        let rpc: JsonRpcResponse = response.json().await.map_err(|e| {
            BridgeError::remote(format!(
                "remote agent '{}' sent an invalid JSON-RPC response: {e}",
                self.name
            ))
        })?;
        if !rpc.answers(&request.id) {
            warn!(
                agent = %self.name,
                expected = %request.id,
                received = ?rpc.id,
                "Remote agent answered with a different JSON-RPC id"
            );
        }
        if let Some(err) = rpc.error {
            return Err(BridgeError::remote(format!(
                "remote agent '{}' returned {err}",
                self.name
            )));
        }
        let result = rpc.result.ok_or_else(|| {
            BridgeError::remote(format!(
                "remote agent '{}' response carried neither result nor error",
                self.name
            ))
        })?;
        let result: SendMessageResult = serde_json::from_value(result).map_err(|e| {
            BridgeError::remote(format!(
                "remote agent '{}' returned an unrecognised result: {e}",
                self.name
            ))
        })?;

        let text = result.into_text()?;
        debug!(
            agent = %self.name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Remote agent responded"
        );
        Ok(text)
    }
}

#[async_trait]
impl AgentInvoker for RemoteAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        input: &str,
        options: &InvokeOptions,
        cancel: &CancellationToken,
    ) -> BridgeResult<String> {
        if cancel.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(agent = %self.name, "Remote invocation cancelled");
                Err(BridgeError::Cancelled)
            }
            result = self.send(input, options.timeout) => result,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::card::Skill;

    fn card(url: &str) -> CapabilityCard {
        CapabilityCard {
            name: "letters".into(),
            description: String::new(),
            url: url.into(),
            version: "1".into(),
            protocol_version: None,
            capabilities: Default::default(),
            default_input_modes: vec![],
            default_output_modes: vec![],
            skills: vec![Skill::new("count-letters", "count")],
        }
    }

    #[test]
    fn test_from_card_uses_card_url() {
        let agent = RemoteAgent::from_card(&card("http://agent:8000/rpc"), reqwest::Client::new())
            .unwrap();
        assert_eq!(agent.name(), "letters");
        assert_eq!(agent.url().as_str(), "http://agent:8000/rpc");
    }

    #[test]
    fn test_from_card_rejects_relative_url() {
        let err = RemoteAgent::from_card(&card("/rpc"), reqwest::Client::new()).unwrap_err();
        assert!(matches!(err, BridgeError::Discovery(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_call_sends_nothing() {
        // Port 9 on loopback would fail to connect; cancellation must win first.
        let agent = RemoteAgent::new(
            "letters",
            Url::parse("http://127.0.0.1:9/").unwrap(),
            reqwest::Client::new(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = agent.invoke("x", &InvokeOptions::default(), &cancel).await.unwrap_err();
        assert!(matches!(err, BridgeError::Cancelled));
    }
}
