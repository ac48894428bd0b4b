//! Session entry point: one user message in, one reply out.

use std::sync::Arc;

use lg_domain::config::ChatConfig;
use lg_domain::error::Result;
use lg_domain::tool::Role;
use lg_domain::trace::TraceEvent;
use lg_graph::CompiledGraph;
use lg_sessions::SessionLockMap;
use lg_vector::MemoryStore;
use serde::Serialize;

use crate::state::{State, StatePatch};
use crate::validator::InputValidator;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    /// The final transcript entry of the turn.
    pub response: String,
    /// Earlier assistant messages produced during the same turn.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub progress: Vec<String>,
}

pub struct ChatService {
    graph: Arc<CompiledGraph<State>>,
    memory: Option<Arc<MemoryStore>>,
    user_id: String,
    locks: SessionLockMap,
    validator: InputValidator,
    apology: String,
}

impl ChatService {
    /// `memory` is `None` when exchanges should not be remembered.
    pub fn new(
        graph: Arc<CompiledGraph<State>>,
        memory: Option<Arc<MemoryStore>>,
        user_id: impl Into<String>,
        chat: &ChatConfig,
    ) -> Self {
        Self {
            graph,
            memory,
            user_id: user_id.into(),
            locks: SessionLockMap::new(),
            validator: InputValidator::new(chat.max_input_chars),
            apology: chat.apology.clone(),
        }
    }

    pub fn graph(&self) -> &Arc<CompiledGraph<State>> {
        &self.graph
    }

    /// Run one turn. A missing or blank `session_id` starts a new session.
    ///
    /// Never fails: rejected input is answered with the reason, and any
    /// internal failure with the configured apology.
    pub async fn chat(&self, message: &str, session_id: Option<&str>) -> ChatReply {
        let session_id = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let reply = |response: String, progress: Vec<String>| ChatReply {
            session_id: session_id.clone(),
            response,
            progress,
        };

        let message = match self.validator.validate(message) {
            Ok(m) => m,
            Err(rejected) => {
                tracing::warn!(session_id = %session_id, reason = %rejected, "input rejected");
                return reply(rejected.to_string(), Vec::new());
            }
        };

        let _permit = match self.locks.acquire(&session_id).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "session lock unavailable");
                return reply(self.apology.clone(), Vec::new());
            }
        };

        match self.turn(&session_id, &message).await {
            Ok((response, progress)) => {
                self.remember(&message, &response).await;
                reply(response, progress)
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "chat turn failed");
                reply(self.apology.clone(), Vec::new())
            }
        }
    }

    async fn turn(&self, session_id: &str, message: &str) -> Result<(String, Vec<String>)> {
        let before = self.graph.state(session_id).await?;
        TraceEvent::SessionResolved {
            session_id: session_id.to_owned(),
            is_new: before.is_none(),
        }
        .emit();
        let seen = before.map(|s| s.transcript.len()).unwrap_or(0);

        let state = self.graph.run(session_id, StatePatch::user(message)).await?;

        let mut said: Vec<String> = state
            .transcript
            .get(seen..)
            .unwrap_or_default()
            .iter()
            .filter(|m| m.role == Role::Assistant && !m.has_tool_calls() && !m.content.is_empty())
            .map(|m| m.content.clone())
            .collect();
        let response = match state.last_message() {
            Some(m) if m.role == Role::Assistant => m.content.clone(),
            _ => said.last().cloned().unwrap_or_default(),
        };
        if said.last() == Some(&response) {
            said.pop();
        }
        Ok((response, said))
    }

    async fn remember(&self, message: &str, response: &str) {
        let Some(memory) = &self.memory else {
            return;
        };
        if let Err(e) = memory.add_exchange(&self.user_id, message, response).await {
            tracing::warn!(error = %e, "failed to record exchange in long-term memory");
        }
    }
}
