//! Tool trait, registry and dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lg_domain::error::{Error, Result};
use lg_domain::tool::{ToolCall, ToolDefinition};
use lg_domain::trace::TraceEvent;
use serde_json::Value;

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn parameters(&self) -> Value;

    async fn invoke(&self, arguments: &Value) -> Result<String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            parameters: self.parameters(),
        }
    }
}

/// Schema for the common single `query` string argument.
pub fn query_schema(description: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": description }
        },
        "required": ["query"]
    })
}

/// Read a required string argument.
///
/// A bare JSON string stands in for the sole argument, which is how models
/// sometimes call single-input tools.
pub fn required_str(tool: &str, arguments: &Value, key: &str) -> Result<String> {
    let value = match arguments {
        Value::String(s) => Some(s.as_str()),
        other => other.get(key).and_then(|v| v.as_str()),
    };
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| Error::ToolInvocation {
            tool: tool.to_owned(),
            message: format!("missing required argument '{key}'"),
        })
}

/// Result of one tool call as it is written back into the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    timeout: Duration,
}

impl ToolRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            tools: BTreeMap::new(),
            timeout,
        }
    }

    /// Add a tool. A later registration under the same name replaces the
    /// earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_owned();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "tool registered twice, keeping the latest");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Definitions for the named tools, in the order given. Unknown names
    /// are skipped.
    pub fn definitions(&self, names: &[&str]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|n| self.tools.get(*n))
            .map(|t| t.definition())
            .collect()
    }

    /// Run one call. Every failure mode becomes error text.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutcome {
        let start = Instant::now();

        let outcome = match self.tools.get(&call.tool_name) {
            None => ToolOutcome::error(format!("unknown tool '{}'", call.tool_name)),
            Some(tool) => match tokio::time::timeout(self.timeout, tool.invoke(&call.arguments)).await {
                Ok(Ok(content)) => ToolOutcome::ok(content),
                Ok(Err(e)) => ToolOutcome::error(format!("tool '{}' failed: {e}", call.tool_name)),
                Err(_) => ToolOutcome::error(format!(
                    "tool '{}' timed out after {}s",
                    call.tool_name,
                    self.timeout.as_secs()
                )),
            },
        };

        if outcome.is_error {
            tracing::warn!(tool = %call.tool_name, call_id = %call.call_id, error = %outcome.content, "tool call failed");
        }
        TraceEvent::ToolDispatched {
            tool_name: call.tool_name.clone(),
            call_id: call.call_id.clone(),
            is_error: outcome.is_error,
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        outcome
    }
}
