use crate::node::{EventSender, Node, NodeType};
use crate::types::{GraphState, StreamEvent, ToolErrorPolicy};
use anyhow::Result;
use async_trait::async_trait;
use mailpilot_tools::ToolExecutor;
use std::sync::Arc;
use std::time::Instant;

pub struct ToolNode {
    tools: Arc<dyn ToolExecutor>,
    error_policy: ToolErrorPolicy,
}

impl ToolNode {
    pub fn new(tools: Arc<dyn ToolExecutor>) -> Self {
        Self {
            tools,
            error_policy: ToolErrorPolicy::default(),
        }
    }

    pub fn with_error_policy(mut self, policy: ToolErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}

#[async_trait]
impl Node for ToolNode {
    async fn execute(&self, state: &mut GraphState, event_tx: EventSender) -> Result<()> {
        let tool_calls = state.get_pending_tool_calls();

        // Each call runs once, in the order the model declared them
        for tool_call in tool_calls {
            let start = Instant::now();
            let name = tool_call.name();

            tracing::info!(tool = %name, tool_call_id = %tool_call.id, "TOOL_NODE: executing");

            match self.tools.execute(name, tool_call.arguments()).await {
                Ok(result) => {
                    event_tx
                        .send(StreamEvent::ToolResult {
                            tool_call_id: tool_call.id.clone(),
                            result: result.clone(),
                            is_error: false,
                            duration_ms: start.elapsed().as_millis() as u64,
                        })
                        .await?;

                    state.add_tool_result(tool_call.id, result);
                }
                Err(e) => {
                    let error_msg = format!("Tool execution failed: {}", e);

                    event_tx
                        .send(StreamEvent::ToolResult {
                            tool_call_id: tool_call.id.clone(),
                            result: error_msg.clone(),
                            is_error: true,
                            duration_ms: start.elapsed().as_millis() as u64,
                        })
                        .await?;

                    match self.error_policy {
                        ToolErrorPolicy::Propagate => {
                            tracing::error!(tool = %name, error = %e, "TOOL_NODE: tool failed");
                            return Err(anyhow::Error::new(e).context(format!("Tool '{}' failed", name)));
                        }
                        ToolErrorPolicy::ReportToModel => {
                            tracing::warn!(tool = %name, error = %e, "TOOL_NODE: reporting failure to model");
                            state.add_tool_result(tool_call.id, error_msg);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::Tool
    }
}
