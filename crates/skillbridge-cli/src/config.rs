//! `skillbridge.toml` loading, environment overrides and validation.

use reqwest::Url;
use serde::Deserialize;
use skillbridge_agent::{ModelConfig, OrchestratorConfig, DEFAULT_SYSTEM_PROMPT};
use skillbridge_core::{BridgeError, BridgeResult};
use skillbridge_gateway::backend::DEFAULT_AGENT_CARD_PATH;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the model provider key.
pub const API_KEY_ENV: &str = "SKILLBRIDGE_API_KEY";
/// Backend URL injected by service-discovery style hosts.
pub const SERVICE_DISCOVERY_ENV: &str = "services__backend__http__0";
/// Plain backend URL override.
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default = "default_agent_card_path")]
    pub agent_card_path: String,
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            agent_card_path: default_agent_card_path(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrchestratorSection {
    #[serde(default)]
    pub require_skills: bool,
    /// Zero disables the bridge-level bound.
    #[serde(default = "default_invoke_timeout")]
    pub invoke_timeout_secs: u64,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            require_skills: false,
            invoke_timeout_secs: default_invoke_timeout(),
            system_prompt: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_agent_card_path() -> String {
    DEFAULT_AGENT_CARD_PATH.to_string()
}
fn default_backend_timeout() -> u64 {
    30
}
fn default_invoke_timeout() -> u64 {
    120
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}

impl AppConfig {
    /// Read, override from the process environment and validate.
    pub async fn load(path: &Path) -> BridgeResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            BridgeError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::parse(&raw)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(raw: &str) -> BridgeResult<Self> {
        toml::from_str(raw).map_err(|e| BridgeError::Config(format!("invalid config: {e}")))
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` for variable access. Empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(API_KEY_ENV) {
            self.model.api_key = key;
        }
        if let Some(url) = get(SERVICE_DISCOVERY_ENV).or_else(|| get(BACKEND_URL_ENV)) {
            self.backend.base_url = url;
        }
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.model.model_id.trim().is_empty() {
            return Err(BridgeError::Config("model.model_id must not be empty".into()));
        }
        if let Some(base) = &self.model.api_base_url {
            Url::parse(base).map_err(|e| {
                BridgeError::Config(format!("model.api_base_url '{base}' is not a URL: {e}"))
            })?;
        }
        Url::parse(&self.backend.base_url).map_err(|e| {
            BridgeError::Config(format!(
                "backend.base_url '{}' is not a URL: {e}",
                self.backend.base_url
            ))
        })?;
        if self.model.max_turns == 0 {
            return Err(BridgeError::Config("model.max_turns must be at least 1".into()));
        }
        Ok(())
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let section = &self.orchestrator;
        OrchestratorConfig {
            require_skills: section.require_skills,
            invoke_timeout: (section.invoke_timeout_secs > 0)
                .then(|| Duration::from_secs(section.invoke_timeout_secs)),
            system_prompt: section
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_turns: self.model.max_turns,
            card_path: None,
        }
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use skillbridge_agent::LlmProvider;
    use std::collections::HashMap;
    use std::io::Write;

    const MINIMAL: &str = r#"
[model]
provider = "openai"
model_id = "gpt-4o-mini"
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.model.provider, LlmProvider::OpenAi);
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.agent_card_path, "agents/count-letters/");
        assert_eq!(config.server.port, 5000);
        assert!(!config.orchestrator.require_skills);
        config.validate().unwrap();

        let orchestrator = config.orchestrator_config();
        assert_eq!(orchestrator.invoke_timeout, Some(Duration::from_secs(120)));
        assert_eq!(orchestrator.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(orchestrator.max_turns, 20);
    }

    #[test]
    fn test_zero_invoke_timeout_disables_bound() {
        let raw = format!("{MINIMAL}\n[orchestrator]\ninvoke_timeout_secs = 0\nrequire_skills = true\n");
        let config = AppConfig::parse(&raw).unwrap();
        let orchestrator = config.orchestrator_config();
        assert!(orchestrator.invoke_timeout.is_none());
        assert!(orchestrator.require_skills);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::parse(MINIMAL).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            (API_KEY_ENV, "sk-test"),
            (SERVICE_DISCOVERY_ENV, "http://backend:8080"),
            (BACKEND_URL_ENV, "http://ignored:1"),
        ]);
        config.apply_env_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.model.api_key, "sk-test");
        assert_eq!(config.backend.base_url, "http://backend:8080");
    }

    #[test]
    fn test_backend_url_fallback_and_empty_values() {
        let mut config = AppConfig::parse(MINIMAL).unwrap();
        let env: HashMap<&str, &str> =
            HashMap::from([(SERVICE_DISCOVERY_ENV, " "), (BACKEND_URL_ENV, "http://b:9")]);
        config.apply_env_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.backend.base_url, "http://b:9");
        assert!(config.model.api_key.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let empty_model = "[model]\nprovider = \"claude\"\nmodel_id = \"\"\n";
        let err = AppConfig::parse(empty_model).unwrap().validate().unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));

        let bad_endpoint = format!("{MINIMAL}api_base_url = \"not a url\"\n");
        assert!(AppConfig::parse(&bad_endpoint).unwrap().validate().is_err());

        let bad_backend = format!("{MINIMAL}\n[backend]\nbase_url = \"backend\"\n");
        assert!(AppConfig::parse(&bad_backend).unwrap().validate().is_err());

        let zero_turns = format!("{MINIMAL}max_turns = 0\n");
        assert!(AppConfig::parse(&zero_turns).unwrap().validate().is_err());
    }

    #[test]
    fn test_missing_model_section_is_config_error() {
        let err = AppConfig::parse("[server]\nport = 1\n").unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{MINIMAL}\n[server]\nhost = \"127.0.0.1\"\nport = 5050\n\n[backend]\nbase_url = \"http://127.0.0.1:8000\"\ntimeout_secs = 5\n"
        )
        .unwrap();

        let config = AppConfig::load(file.path()).await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5050);
        assert_eq!(config.backend_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("absent.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }
}
