use serde::Serialize;

/// Structured trace events emitted across all leadgraph crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    NodeCompleted {
        session_id: String,
        node: String,
        step: usize,
        next: Option<String>,
        duration_ms: u64,
    },
    NodeFailed {
        session_id: String,
        node: String,
        step: usize,
        error: String,
    },
    CheckpointWritten {
        session_id: String,
        step: usize,
        next: Option<String>,
    },
    ToolDispatched {
        tool_name: String,
        call_id: String,
        is_error: bool,
        duration_ms: u64,
    },
    VectorStoreCall {
        collection: String,
        operation: String,
        status: u16,
        duration_ms: u64,
    },
    CollectionBootstrapped {
        collection: String,
        created: bool,
    },
    LlmRequest {
        provider: String,
        model: String,
        tools: usize,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    SessionResolved {
        session_id: String,
        is_new: bool,
    },
    WorkspaceToolsLoaded {
        discovered: usize,
        allowed: usize,
    },
    LeadsStored {
        collection: String,
        stored: usize,
        updated: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "lg_event");
    }
}
