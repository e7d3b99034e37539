use async_trait::async_trait;
use mailpilot_llm::Tool;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ToolError;

/// A single callable tool exposed to the model
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Schema sent to the model when tools are bound
    fn definition(&self) -> Tool;

    async fn call(&self, arguments: Value) -> Result<String, ToolError>;
}

/// Dispatches tool invocations by name.
///
/// This is the seam the graph's tool node talks to.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run `tool_name` with the raw JSON argument string emitted by the model
    async fn execute(&self, tool_name: &str, arguments: &str) -> Result<String, ToolError>;

    /// Definitions of every registered tool, in registration order
    fn llm_tools(&self) -> Vec<Tool>;
}

/// Ordered set of tool handlers
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one with the same name
    pub fn register(&mut self, tool: Arc<dyn ToolHandler>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            tracing::debug!(tool = %tool.name(), "Replacing registered tool");
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn ToolHandler>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, tool_name: &str, arguments: &str) -> Result<String, ToolError> {
        let tool = self
            .get(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        // Tools without parameters sometimes arrive with an empty argument string
        let arguments = if arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(arguments)
                .map_err(|e| ToolError::invalid_arguments(tool_name, e))?
        };

        tracing::debug!(tool = %tool_name, "Executing tool");
        tool.call(arguments).await
    }

    fn llm_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.definition()).collect()
    }
}

/// Deserialize a tool's arguments into its typed parameter struct
pub(crate) fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid_arguments(tool, e))
}
