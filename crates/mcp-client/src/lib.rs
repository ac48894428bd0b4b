//! `lg-mcp-client`: discovery and invocation of workspace tools exposed by
//! MCP (Model Context Protocol) servers.
//!
//! - [`protocol`]: JSON-RPC 2.0 message types and MCP payloads.
//! - [`transport`]: newline-delimited JSON-RPC over a child process's stdio.
//! - [`manager`]: one connection per configured server, handshake and tool
//!   discovery.
//! - [`catalog`]: the [`ToolCatalog`] seam the tool layer depends on, plus
//!   allow-list filtering.
//!
//! ```rust,ignore
//! let manager = McpManager::from_config(&config.mcp).await;
//! let tools = load_allowed(&manager, &config.mcp.allowed_tools).await;
//! ```

pub mod catalog;
pub mod manager;
pub mod protocol;
pub mod transport;

pub use catalog::{load_allowed, CatalogTool, ToolCatalog};
pub use lg_domain::config::{McpConfig, McpServerConfig};
pub use manager::{McpError, McpManager};
pub use protocol::{McpToolDef, ToolCallResult};
