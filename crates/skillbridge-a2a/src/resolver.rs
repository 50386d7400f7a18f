//! Capability card discovery.

use crate::card::CapabilityCard;
use reqwest::Url;
use skillbridge_core::{BridgeError, BridgeResult};
use tracing::{debug, warn};

/// Path of the capability card relative to an agent's base endpoint.
pub const WELL_KNOWN_CARD_PATH: &str = ".well-known/agent-card.json";

/// Fetches and validates a remote agent's capability card.
///
/// Resolution is stateless: every call to [`CardResolver::resolve`] performs
/// a fresh fetch.
#[derive(Debug, Clone)]
pub struct CardResolver {
    endpoint: Url,
    card_path: String,
    require_skills: bool,
    http: reqwest::Client,
}

impl CardResolver {
    /// Resolver for the agent at `endpoint`.
    ///
    /// `endpoint` is either the agent's base URL or, when it ends in
    /// `.json`, the card document itself.
    pub fn new(endpoint: &str, http: reqwest::Client) -> BridgeResult<Self> {
        let endpoint = Url::parse(endpoint.trim()).map_err(|e| {
            BridgeError::Config(format!("invalid agent card endpoint '{endpoint}': {e}"))
        })?;
        Ok(Self {
            endpoint,
            card_path: WELL_KNOWN_CARD_PATH.to_string(),
            require_skills: false,
            http,
        })
    }

    /// Override the well-known card path.
    pub fn with_card_path(mut self, path: impl Into<String>) -> Self {
        self.card_path = path.into();
        self
    }

    /// Treat a card with zero skills as a discovery failure.
    pub fn require_skills(mut self, require: bool) -> Self {
        self.require_skills = require;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The URL the card document is fetched from.
    pub fn card_url(&self) -> BridgeResult<Url> {
        if self.endpoint.path().ends_with(".json") {
            return Ok(self.endpoint.clone());
        }
        let mut base = self.endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(self.card_path.trim_start_matches('/'))
            .map_err(|e| BridgeError::Config(format!("invalid card path '{}': {e}", self.card_path)))
    }

    /// Fetch, parse and validate the card.
    ///
    /// Any failure to reach the endpoint or to read a card from it is a
    /// [`BridgeError::Discovery`].
    pub async fn resolve(&self) -> BridgeResult<CapabilityCard> {
        let url = self.card_url()?;
        debug!(url = %url, "Fetching capability card");

        let response = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| BridgeError::Discovery(format!("card endpoint {url} unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Discovery(format!(
                "card endpoint {url} returned HTTP {status}"
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            BridgeError::Discovery(format!("failed to read card from {url}: {e}"))
        })?;
        let mut card = CapabilityCard::from_slice(&body).map_err(|e| match e {
            BridgeError::Discovery(msg) => BridgeError::Discovery(format!("{url}: {msg}")),
            other => other,
        })?;

        card.url = invocation_url(&self.endpoint, &url, &card.url)?.to_string();

        if card.skills.is_empty() {
            if self.require_skills {
                return Err(BridgeError::Discovery(format!(
                    "capability card '{}' at {url} declares no skills",
                    card.name
                )));
            }
            warn!(agent = %card.name, url = %url, "Capability card declares no skills");
        }

        debug!(
            agent = %card.name,
            skills = ?card.skill_names(),
            invoke_url = %card.url,
            "Capability card fetched"
        );
        Ok(card)
    }
}

/// Absolute invocation URL for a card's `url` field.
///
/// Empty means the agent's own endpoint (the origin root when the endpoint
/// was the card document); relative values are joined onto the card's
/// location.
fn invocation_url(endpoint: &Url, card_url: &Url, declared: &str) -> BridgeResult<Url> {
    let declared = declared.trim();
    if declared.is_empty() && !endpoint.path().ends_with(".json") {
        return Ok(endpoint.clone());
    }
    let declared = if declared.is_empty() { "/" } else { declared };
    card_url
        .join(declared)
        .map_err(|e| BridgeError::Discovery(format!("invalid invocation url '{declared}': {e}")))
}
