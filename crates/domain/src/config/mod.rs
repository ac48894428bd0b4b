mod checkpoint;
mod graph;
mod llm;
mod mcp;
mod observability;
mod pipeline;
mod vector;

pub use checkpoint::*;
pub use graph::*;
pub use llm::*;
pub use mcp::*;
pub use observability::*;
pub use pipeline::*;
pub use vector::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub vector: VectorConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub mcp: McpConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut error = |field: &str, message: &str| {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: field.into(),
                message: message.into(),
            })
        };

        if self.llm.base_url.is_empty() {
            error("llm.base_url", "base_url must not be empty");
        }
        if self.llm.model.is_empty() {
            error("llm.model", "model must not be empty");
        }
        if self.vector.dimension == 0 {
            error("vector.dimension", "dimension must be greater than 0");
        }
        if self.vector.lead_collection.is_empty() {
            error("vector.lead_collection", "collection name must not be empty");
        }
        if self.vector.lead_collection == self.vector.memory_collection {
            error(
                "vector.memory_collection",
                "memory and lead collections must differ",
            );
        }
        if self.vector.backend == VectorBackend::Qdrant && self.vector.url.is_empty() {
            error("vector.url", "url is required for the qdrant backend");
        }
        if self.graph.max_steps == 0 {
            error("graph.max_steps", "max_steps must be greater than 0");
        }
        if self.pipeline.similar_limit == 0 {
            error("pipeline.similar_limit", "limit must be at least 1");
        }
        if self.chat.max_input_chars == 0 {
            error("chat.max_input_chars", "max_input_chars must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            error(
                "observability.sample_rate",
                "sample_rate must be between 0.0 and 1.0",
            );
        }
        for (i, server) in self.mcp.servers.iter().enumerate() {
            if server.id.is_empty() {
                error(&format!("mcp.servers[{i}].id"), "server id must not be empty");
            }
            if server.command.is_empty() {
                error(
                    &format!("mcp.servers[{i}].command"),
                    "server command must not be empty",
                );
            }
        }

        // Warnings.
        let one_lead = self.graph.steps_for_leads(1);
        if self.graph.max_steps > 0 && self.graph.max_steps < one_lead {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "graph.max_steps".into(),
                message: format!(
                    "{} steps cannot finish a discovery of even one lead \
                     ({one_lead} needed with max_enrichment_rounds = {})",
                    self.graph.max_steps, self.graph.max_enrichment_rounds
                ),
            });
        }
        if self.graph.max_enrichment_rounds == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "graph.max_enrichment_rounds".into(),
                message: "0 disables enrichment; leads reach the summary unenriched".into(),
            });
        }
        if self.graph.tool_timeout_secs == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "graph.tool_timeout_secs".into(),
                message: "0 makes every tool call time out immediately".into(),
            });
        }
        if !self.profile.path.exists() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "profile.path".into(),
                message: format!(
                    "{} not found; retrieve_icp will report an error",
                    self.profile.path.display()
                ),
            });
        }

        errors
    }
}
