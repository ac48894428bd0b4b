use std::sync::Arc;

use lg_domain::error::Result;
use lg_domain::tool::Message;
use lg_graph::Node;
use lg_tools::ToolRegistry;

use crate::state::{State, StatePatch};

/// Runs the tool calls of the last assistant turn, one result turn per
/// call in request order. Failures become error results, never node errors.
pub struct ToolsNode {
    registry: Arc<ToolRegistry>,
}

impl ToolsNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait::async_trait]
impl Node<State> for ToolsNode {
    async fn run(&self, state: &State) -> Result<StatePatch> {
        let Some(last) = state.last_message().filter(|m| m.has_tool_calls()) else {
            tracing::debug!("tools node reached without pending calls");
            return Ok(StatePatch::default());
        };

        let mut results = Vec::with_capacity(last.tool_calls.len());
        for call in &last.tool_calls {
            let outcome = self.registry.dispatch(call).await;
            results.push(Message::tool_result(
                call.call_id.clone(),
                outcome.content,
                outcome.is_error,
            ));
        }

        Ok(StatePatch {
            messages: results,
            ..Default::default()
        })
    }
}
