//! MCP (Model Context Protocol) configuration types for the domain layer.
//!
//! These are lightweight config structs used to deserialize the `[mcp]`
//! section. The actual MCP client logic lives in the `lg-mcp-client` crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level MCP configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// List of MCP server definitions.
    #[serde(default)]
    pub servers: Vec<McpServerConfig>,

    /// Only tools named here are declared to the reasoning step.
    #[serde(default = "d_allowed_tools")]
    pub allowed_tools: Vec<String>,

    /// Per-request deadline when talking to a server.
    #[serde(default = "d_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            allowed_tools: d_allowed_tools(),
            request_timeout_secs: d_request_timeout(),
        }
    }
}

/// Configuration for a single MCP server connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Unique identifier for this server.
    pub id: String,

    /// The command to spawn (e.g. `"uvx"`).
    #[serde(default)]
    pub command: String,

    /// Arguments to pass to the command.
    #[serde(default)]
    pub args: Vec<String>,

    /// Optional environment variables to set on the spawned process.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn d_allowed_tools() -> Vec<String> {
    [
        "list_spreadsheets",
        "read_sheet_values",
        "get_drive_file_content",
        "list_drive_items",
        "search_drive_files",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn d_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_defaults() {
        let cfg: McpConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.servers.is_empty());
        assert_eq!(cfg.allowed_tools.len(), 5);
        assert!(cfg.allowed_tools.iter().any(|t| t == "read_sheet_values"));
    }

    #[test]
    fn deserialize_server_config() {
        let raw = r#"{
            "id": "google_workspace",
            "command": "uvx",
            "args": ["workspace-mcp", "--tools", "sheets", "drive"],
            "env": { "GOOGLE_OAUTH_CLIENT_ID": "abc" }
        }"#;
        let cfg: McpServerConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.id, "google_workspace");
        assert_eq!(cfg.args.len(), 4);
        assert_eq!(cfg.env.get("GOOGLE_OAUTH_CLIENT_ID").unwrap(), "abc");
    }
}
