//! `search_memories` and `update_memories`: long-term memory access for the
//! conversational node.

use std::sync::Arc;

use lg_domain::error::{Error, Result};
use lg_vector::MemoryStore;
use serde_json::Value;

use crate::registry::{query_schema, required_str, Tool};

const NO_MEMORIES: &str = "No relevant memories found.";

pub struct SearchMemoriesTool {
    memory: Arc<MemoryStore>,
    user_id: String,
    limit: usize,
}

impl SearchMemoriesTool {
    pub fn new(memory: Arc<MemoryStore>, user_id: impl Into<String>, limit: usize) -> Self {
        Self {
            memory,
            user_id: user_id.into(),
            limit,
        }
    }
}

#[async_trait::async_trait]
impl Tool for SearchMemoriesTool {
    fn name(&self) -> &str {
        "search_memories"
    }

    fn description(&self) -> &str {
        "Search long-term memory for relevant past interactions, user preferences, \
         and historical context. Use this when you need to recall information from \
         previous conversations."
    }

    fn parameters(&self) -> Value {
        query_schema("What to look for in past conversations")
    }

    async fn invoke(&self, arguments: &Value) -> Result<String> {
        let query = required_str(self.name(), arguments, "query")?;
        let hits = self.memory.search(&self.user_id, &query, self.limit).await?;
        if hits.is_empty() {
            return Ok(NO_MEMORIES.to_owned());
        }
        let results: Vec<Value> = hits
            .into_iter()
            .map(|h| serde_json::json!({ "id": h.id, "memory": h.payload.text }))
            .collect();
        Ok(serde_json::to_string_pretty(&results)?)
    }
}

pub struct UpdateMemoriesTool {
    memory: Arc<MemoryStore>,
}

impl UpdateMemoriesTool {
    pub fn new(memory: Arc<MemoryStore>) -> Self {
        Self { memory }
    }
}

#[async_trait::async_trait]
impl Tool for UpdateMemoriesTool {
    fn name(&self) -> &str {
        "update_memories"
    }

    fn description(&self) -> &str {
        "Update a specific memory in long-term storage. Get the memory_id from \
         search_memories results."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "memory_id": { "type": "string", "description": "ID of the memory to update" },
                "new_memory": { "type": "string", "description": "Replacement content" }
            },
            "required": ["memory_id", "new_memory"]
        })
    }

    async fn invoke(&self, arguments: &Value) -> Result<String> {
        let id = required_str(self.name(), arguments, "memory_id")?;
        let text = required_str(self.name(), arguments, "new_memory")?;
        if self.memory.update(&id, &text).await {
            Ok("Memory updated successfully.".to_owned())
        } else {
            Err(Error::ToolInvocation {
                tool: self.name().to_owned(),
                message: format!("no memory with id '{id}'"),
            })
        }
    }
}
