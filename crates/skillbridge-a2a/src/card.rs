//! Capability card documents published by remote agents.

use serde::{Deserialize, Deserializer, Serialize};
use skillbridge_core::{BridgeError, BridgeResult};

/// Self-description a remote agent publishes at its well-known location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityCard {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Invocation address. Normalised to an absolute URL after resolution.
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capabilities: AgentCapabilities,
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_input_modes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_output_modes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<Skill>,
}

/// Optional protocol features the remote agent advertises.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_transition_history: Option<bool>,
}

/// One advertised unit of functionality. `name` doubles as the tool name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub examples: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_modes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_modes: Vec<String>,
}

impl Skill {
    /// A skill with only a name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            description: description.into(),
            tags: Vec::new(),
            examples: Vec::new(),
            input_modes: Vec::new(),
            output_modes: Vec::new(),
        }
    }
}

impl CapabilityCard {
    /// Parse and validate a card document.
    pub fn from_slice(bytes: &[u8]) -> BridgeResult<Self> {
        let card: Self = serde_json::from_slice(bytes)
            .map_err(|e| BridgeError::Discovery(format!("invalid capability card: {e}")))?;
        card.validate()?;
        Ok(card)
    }

    /// Structural checks serde cannot express.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.name.trim().is_empty() {
            return Err(BridgeError::Discovery(
                "capability card has an empty name".into(),
            ));
        }
        if let Some(i) = self.skills.iter().position(|s| s.name.trim().is_empty()) {
            return Err(BridgeError::Discovery(format!(
                "skill #{i} of capability card '{}' has an empty name",
                self.name
            )));
        }
        Ok(())
    }

    /// Skill names in card order.
    pub fn skill_names(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.name.clone()).collect()
    }
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
