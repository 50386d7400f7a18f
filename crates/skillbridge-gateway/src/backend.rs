//! Client for the downstream backend service.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use skillbridge_core::{BridgeError, BridgeResult};
use std::time::Duration;
use tracing::debug;

/// Default location of the letter-counting agent, relative to the backend.
pub const DEFAULT_AGENT_CARD_PATH: &str = "agents/count-letters/";

/// Body of the backend's `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRootResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountLettersRequest {
    pub question: String,
}

/// The backend's structured answer to a counting question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountLettersResponse {
    #[serde(default, alias = "final_number")]
    pub final_number: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, alias = "chain_of_thought")]
    pub chain_of_thought: String,
    #[serde(default)]
    pub answer: String,
}

/// HTTP client for the backend service.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: Url,
    agent_card_path: String,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> BridgeResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build backend HTTP client: {e}")))?;
        Self::with_client(base_url, http)
    }

    /// Client reusing an existing `reqwest::Client`.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> BridgeResult<Self> {
        let mut base_url = Url::parse(base_url.trim()).map_err(|e| {
            BridgeError::Config(format!("invalid backend base url '{base_url}': {e}"))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            agent_card_path: DEFAULT_AGENT_CARD_PATH.to_string(),
            http,
        })
    }

    pub fn with_agent_card_path(mut self, path: impl Into<String>) -> Self {
        self.agent_card_path = path.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> BridgeResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BridgeError::Config(format!("invalid backend path '{path}': {e}")))
    }

    /// `GET /`
    pub async fn root(&self) -> BridgeResult<BackendRootResponse> {
        let url = self.url("")?;
        debug!(url = %url, "Fetching backend root");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BridgeError::Http(format!("backend unreachable: {e}")))?;
        let resp = error_for_status(resp).await?;
        resp.json()
            .await
            .map_err(|e| BridgeError::Http(format!("invalid backend root response: {e}")))
    }

    /// `POST /agents/count-letters`. An empty or null body yields the
    /// default response.
    pub async fn count_letters(&self, question: &str) -> BridgeResult<CountLettersResponse> {
        let url = self.url("agents/count-letters")?;
        debug!(url = %url, "Asking backend to count letters");
        let resp = self
            .http
            .post(url)
            .json(&CountLettersRequest {
                question: question.to_string(),
            })
            .send()
            .await
            .map_err(|e| BridgeError::Http(format!("backend unreachable: {e}")))?;
        let resp = error_for_status(resp).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| BridgeError::Http(format!("failed to read backend response: {e}")))?;
        parse_count_letters(&bytes)
    }

    /// The letter-counting agent's endpoint paired with the transport to
    /// reach it.
    pub fn agent_card_endpoint(&self) -> (String, reqwest::Client) {
        let endpoint = format!("{}{}", self.base_url, self.agent_card_path.trim_start_matches('/'));
        (endpoint, self.http.clone())
    }
}

async fn error_for_status(resp: reqwest::Response) -> BridgeResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(BridgeError::Http(format!("backend returned HTTP {status}: {body}")))
}

/// The backend answers either flat or wrapped as `{"count": {...}}`.
fn parse_count_letters(bytes: &[u8]) -> BridgeResult<CountLettersResponse> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(CountLettersResponse::default());
    }
    let invalid = |e: serde_json::Error| BridgeError::Http(format!("invalid count-letters response: {e}"));
    let body: serde_json::Value = serde_json::from_slice(bytes).map_err(invalid)?;
    let body = match body {
        serde_json::Value::Object(mut map) if map.contains_key("count") => {
            map.remove("count").unwrap_or_default()
        }
        other => other,
    };
    if body.is_null() {
        return Ok(CountLettersResponse::default());
    }
    serde_json::from_value(body).map_err(invalid)
}
