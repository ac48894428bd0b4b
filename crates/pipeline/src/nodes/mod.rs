//! Graph nodes of the lead pipeline.
//!
//! Reasoning nodes share one [`Reasoner`]; deterministic nodes only see
//! the state and their own settings.

mod chatbot;
mod enricher;
mod lead_finder;
mod screener;
mod store_leads;
mod summary;
mod tools;
mod update_lead;

pub use chatbot::{ChatbotNode, FIND_LEADS_MARKER, SUMMARIZE_MARKER};
pub use enricher::EnricherNode;
pub use lead_finder::{parse_leads, LeadFinderNode};
pub use screener::{qualifies, ScreenerNode};
pub use store_leads::StoreLeadsNode;
pub use summary::SummaryNode;
pub use tools::ToolsNode;
pub use update_lead::{latest_tool_output, UpdateLeadNode};

use std::sync::Arc;

use lg_domain::error::Result;
use lg_domain::tool::{Message, ToolDefinition};
use lg_providers::{ChatRequest, ChatResponse, LlmProvider};
use lg_tools::ToolRegistry;

use crate::state::StatePatch;

/// The reasoning capability plus the tools it may be offered.
#[derive(Clone)]
pub struct Reasoner {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    /// Names of the workspace tools discovered at startup.
    workspace_tools: Vec<String>,
}

impl Reasoner {
    pub fn new(llm: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, workspace_tools: Vec<String>) -> Self {
        Self {
            llm,
            tools,
            workspace_tools,
        }
    }

    /// Definitions for `names` followed by every workspace tool.
    fn with_workspace(&self, names: &[&str]) -> Vec<ToolDefinition> {
        let mut all: Vec<&str> = names.to_vec();
        all.extend(self.workspace_tools.iter().map(String::as_str));
        self.tools.definitions(&all)
    }

    fn only(&self, names: &[&str]) -> Vec<ToolDefinition> {
        self.tools.definitions(names)
    }

    async fn ask(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.llm.chat(request).await
    }
}

/// `[system, ..transcript]`.
fn with_system(system: String, transcript: &[Message]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.push(Message::system(system));
    messages.extend(transcript.iter().cloned());
    messages
}

/// Record a tool-calling response and remember who asked.
fn tool_request(caller: &str, response: ChatResponse) -> StatePatch {
    StatePatch {
        last_tool_caller: Some(caller.to_owned()),
        ..StatePatch::message(Message::assistant_with_calls(
            response.content,
            response.tool_calls,
        ))
    }
}

/// Strip a Markdown code fence some models wrap JSON answers in.
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fence("  [1,2] "), "[1,2]");
    }
}
