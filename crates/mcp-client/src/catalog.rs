//! The seam between dynamically discovered tools and the tool layer.

use std::sync::Arc;

use async_trait::async_trait;
use lg_domain::trace::TraceEvent;
use serde_json::Value;

use crate::manager::{McpError, McpManager};
use crate::protocol::{McpToolDef, ToolCallResult};

/// A source of externally hosted tools.
#[async_trait]
pub trait ToolCatalog: Send + Sync {
    /// Every tool the catalog can currently serve.
    async fn discover(&self) -> Result<Vec<McpToolDef>, McpError>;

    async fn call(&self, tool_name: &str, arguments: Value) -> Result<ToolCallResult, McpError>;
}

#[async_trait]
impl ToolCatalog for McpManager {
    async fn discover(&self) -> Result<Vec<McpToolDef>, McpError> {
        Ok(self.list_tools().into_iter().map(|(_, t)| t.clone()).collect())
    }

    async fn call(&self, tool_name: &str, arguments: Value) -> Result<ToolCallResult, McpError> {
        self.call_tool(tool_name, arguments).await
    }
}

/// A discovered tool bound to the catalog that serves it.
#[derive(Clone)]
pub struct CatalogTool {
    pub def: McpToolDef,
    pub catalog: Arc<dyn ToolCatalog>,
}

impl std::fmt::Debug for CatalogTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogTool").field("def", &self.def).finish()
    }
}

/// Discover tools and keep only those named in `allowed`.
///
/// A catalog that cannot be reached yields an empty list; the failure is
/// logged, never propagated.
pub async fn load_allowed(catalog: Arc<dyn ToolCatalog>, allowed: &[String]) -> Vec<CatalogTool> {
    let discovered = match catalog.discover().await {
        Ok(tools) => tools,
        Err(e) => {
            tracing::warn!(error = %e, "workspace tools unavailable");
            Vec::new()
        }
    };

    let total = discovered.len();
    let kept: Vec<CatalogTool> = discovered
        .into_iter()
        .filter(|t| allowed.iter().any(|a| a == &t.name))
        .map(|def| CatalogTool {
            def,
            catalog: catalog.clone(),
        })
        .collect();

    TraceEvent::WorkspaceToolsLoaded {
        discovered: total,
        allowed: kept.len(),
    }
    .emit();

    kept
}
