//! Workspace tools discovered from MCP servers.

use lg_domain::error::{Error, Result};
use lg_mcp_client::CatalogTool;
use serde_json::Value;

/// Adapts one discovered catalog entry to the [`Tool`](crate::Tool) trait.
pub struct WorkspaceTool {
    inner: CatalogTool,
}

impl WorkspaceTool {
    pub fn new(inner: CatalogTool) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl crate::registry::Tool for WorkspaceTool {
    fn name(&self) -> &str {
        &self.inner.def.name
    }

    fn description(&self) -> &str {
        &self.inner.def.description
    }

    fn parameters(&self) -> Value {
        self.inner.def.input_schema.clone()
    }

    async fn invoke(&self, arguments: &Value) -> Result<String> {
        let result = self
            .inner
            .catalog
            .call(&self.inner.def.name, arguments.clone())
            .await?;
        let text = result.text();
        if result.is_error {
            return Err(Error::ToolInvocation {
                tool: self.inner.def.name.clone(),
                message: text,
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Tool;
    use lg_mcp_client::{McpError, McpToolDef, ToolCallResult, ToolCatalog};
    use lg_mcp_client::protocol::ToolCallContent;
    use std::sync::Arc;

    struct Sheets {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl ToolCatalog for Sheets {
        async fn discover(&self) -> std::result::Result<Vec<McpToolDef>, McpError> {
            Ok(vec![])
        }

        async fn call(
            &self,
            tool_name: &str,
            _arguments: Value,
        ) -> std::result::Result<ToolCallResult, McpError> {
            Ok(ToolCallResult {
                content: vec![ToolCallContent {
                    content_type: "text".into(),
                    text: format!("{tool_name}: Q3 pipeline"),
                }],
                is_error: self.fail,
            })
        }
    }

    fn tool(fail: bool) -> WorkspaceTool {
        WorkspaceTool::new(CatalogTool {
            def: McpToolDef {
                name: "list_spreadsheets".into(),
                description: "List spreadsheets".into(),
                input_schema: serde_json::json!({"type": "object"}),
            },
            catalog: Arc::new(Sheets { fail }),
        })
    }

    #[tokio::test]
    async fn forwards_call_and_returns_text() {
        let out = tool(false).invoke(&serde_json::json!({})).await.unwrap();
        assert_eq!(out, "list_spreadsheets: Q3 pipeline");
    }

    #[tokio::test]
    async fn server_reported_error_becomes_tool_error() {
        let err = tool(true).invoke(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, Error::ToolInvocation { .. }));
    }

    #[test]
    fn definition_uses_discovered_schema() {
        let def = tool(false).definition();
        assert_eq!(def.name, "list_spreadsheets");
        assert_eq!(def.parameters["type"], "object");
    }
}
