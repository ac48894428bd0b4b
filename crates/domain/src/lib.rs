//! Shared types for the leadgraph workspace: the error taxonomy, transcript
//! messages, lead records, the criteria profile, structured trace events and
//! the TOML configuration tree.

pub mod config;
pub mod error;
pub mod lead;
pub mod profile;
pub mod tool;
pub mod trace;

pub use error::{Error, Result};
pub use lead::{Contact, Lead};
pub use profile::CriteriaProfile;
pub use tool::{Message, Role, ToolCall, ToolDefinition};
