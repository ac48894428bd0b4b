//! Connections to the configured MCP servers.

use std::collections::BTreeMap;
use std::time::Duration;

use lg_domain::config::McpConfig;
use serde_json::Value;

use crate::protocol::{self, McpToolDef, ToolCallResult, ToolsListResult};
use crate::transport::{McpTransport, StdioTransport, TransportError};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// McpServer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct McpServer {
    pub id: String,
    /// Tools reported by `tools/list` during the handshake.
    pub tools: Vec<McpToolDef>,
    transport: Box<dyn McpTransport>,
}

impl McpServer {
    /// Run the MCP handshake over an established transport and discover
    /// the server's tools.
    pub async fn connect(
        id: impl Into<String>,
        transport: Box<dyn McpTransport>,
    ) -> Result<Self, McpError> {
        let id = id.into();

        transport
            .send_request("initialize", Some(protocol::initialize_params()))
            .await?
            .into_result()
            .map_err(|e| McpError::Protocol(format!("initialize failed: {e}")))?;

        transport.send_notification("notifications/initialized").await?;

        let tools = match transport.send_request("tools/list", None).await?.into_result() {
            Ok(value) => match serde_json::from_value::<ToolsListResult>(value) {
                Ok(list) => list.tools,
                Err(e) => {
                    tracing::warn!(server_id = %id, error = %e, "unparseable tools/list result");
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!(server_id = %id, error = %e, "tools/list failed, server has no tools");
                Vec::new()
            }
        };

        tracing::info!(server_id = %id, tool_count = tools.len(), "MCP server initialized");
        Ok(Self {
            id,
            tools,
            transport,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.transport.is_alive()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<ToolCallResult, McpError> {
        if !self.is_alive() {
            return Err(McpError::ServerDown(self.id.clone()));
        }
        let params = serde_json::json!({ "name": tool_name, "arguments": arguments });
        let value = self
            .transport
            .send_request("tools/call", Some(params))
            .await?
            .into_result()
            .map_err(|e| McpError::Protocol(format!("tools/call failed: {e}")))?;

        serde_json::from_value(value)
            .map_err(|e| McpError::Protocol(format!("failed to parse tools/call result: {e}")))
    }

    async fn shutdown(&self) {
        tracing::info!(server_id = %self.id, "shutting down MCP server");
        self.transport.shutdown().await;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// McpManager
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// All live server connections, keyed by server id.
#[derive(Default)]
pub struct McpManager {
    servers: BTreeMap<String, McpServer>,
}

impl McpManager {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Spawn and initialize every configured server. Servers that fail are
    /// logged and skipped.
    pub async fn from_config(config: &McpConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let mut manager = Self::empty();

        for server_cfg in &config.servers {
            tracing::info!(server_id = %server_cfg.id, command = %server_cfg.command, "starting MCP server");
            let connected = match StdioTransport::spawn(server_cfg, timeout) {
                Ok(t) => McpServer::connect(server_cfg.id.clone(), Box::new(t)).await,
                Err(e) => Err(McpError::Transport(e)),
            };
            match connected {
                Ok(server) => manager.insert(server),
                Err(e) => {
                    tracing::warn!(server_id = %server_cfg.id, error = %e, "MCP server unavailable, skipping");
                }
            }
        }
        manager
    }

    pub fn insert(&mut self, server: McpServer) {
        self.servers.insert(server.id.clone(), server);
    }

    /// `(server_id, tool)` for every tool on a live server.
    pub fn list_tools(&self) -> Vec<(&str, &McpToolDef)> {
        self.servers
            .values()
            .filter(|s| s.is_alive())
            .flat_map(|s| s.tools.iter().map(move |t| (s.id.as_str(), t)))
            .collect()
    }

    /// Call a tool on whichever live server exposes it.
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<ToolCallResult, McpError> {
        let server = self
            .servers
            .values()
            .find(|s| s.is_alive() && s.has_tool(tool_name))
            .ok_or_else(|| McpError::ToolNotFound(tool_name.to_owned()))?;
        server.call_tool(tool_name, arguments).await
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub async fn shutdown(&self) {
        let futs: Vec<_> = self.servers.values().map(|s| s.shutdown()).collect();
        futures_util::future::join_all(futs).await;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("MCP transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("no MCP server exposes tool '{0}'")]
    ToolNotFound(String),

    #[error("MCP server is down: {0}")]
    ServerDown(String),
}

impl From<McpError> for lg_domain::error::Error {
    fn from(e: McpError) -> Self {
        lg_domain::error::Error::Other(e.to_string())
    }
}
