use crate::tool::{Tool, ToolDescriptor};
use skillbridge_core::{BridgeError, BridgeResult, CancellationToken, ToolCall, ToolResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Ordered, name-addressed collection of tools handed to one model session.
///
/// Insertion order is preserved; names are unique.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolSet {
    /// An empty set.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a set from `tools`, failing on the first repeated name.
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> BridgeResult<Self> {
        let mut set = Self::new();
        for tool in tools {
            set.register(tool)?;
        }
        Ok(set)
    }

    /// Append a tool. Fails with [`BridgeError::Binding`] if the name is taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> BridgeResult<()> {
        let name = tool.descriptor().name.clone();
        if self.index.contains_key(&name) {
            return Err(BridgeError::Binding(format!(
                "duplicate tool name '{name}'"
            )));
        }
        debug!(tool = %name, "Registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look a tool up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Descriptors in insertion order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor().clone()).collect()
    }

    /// Tool names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.tools
            .iter()
            .map(|t| t.descriptor().name.clone())
            .collect()
    }

    /// Dispatch a model tool call to the tool it names.
    pub async fn invoke(
        &self,
        call: ToolCall,
        cancel: &CancellationToken,
    ) -> BridgeResult<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| BridgeError::Tool(format!("Unknown tool: {}", call.name)))?;
        tool.invoke(call, cancel).await
    }

    /// Number of tools in the set.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if the set holds no tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .finish()
    }
}
