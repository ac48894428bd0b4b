//! Tools the reasoning nodes may call.
//!
//! Every tool implements [`Tool`]; the [`ToolRegistry`] declares subsets of
//! them to the model and turns each requested call into a [`ToolOutcome`],
//! never an error.

pub mod leads;
pub mod memory;
pub mod profile;
pub mod registry;
pub mod search;
pub mod workspace;

pub use leads::SearchLeadsTool;
pub use memory::{SearchMemoriesTool, UpdateMemoriesTool};
pub use profile::RetrieveIcpTool;
pub use registry::{Tool, ToolOutcome, ToolRegistry};
pub use search::SearchCompanyInfoTool;
pub use workspace::WorkspaceTool;
