//! Agent-to-agent capability bridge.
//!
//! [`CardResolver`] fetches a remote agent's [`CapabilityCard`],
//! [`SkillBinder`] turns its skills into a [`skillbridge_tools::ToolSet`],
//! and [`RemoteAgent`] carries each tool invocation to the agent over
//! JSON-RPC `message/send`.

pub mod binding;
pub mod card;
pub mod protocol;
pub mod remote;
pub mod resolver;

pub use binding::{input_schema, RemoteSkillTool, SkillBinder};
pub use card::{AgentCapabilities, CapabilityCard, Skill};
pub use remote::{AgentInvoker, InvokeOptions, RemoteAgent};
pub use resolver::{CardResolver, WELL_KNOWN_CARD_PATH};
