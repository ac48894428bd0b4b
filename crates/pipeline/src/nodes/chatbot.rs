use lg_domain::error::Result;
use lg_graph::Node;
use lg_providers::ChatRequest;

use super::{tool_request, with_system, Reasoner};
use crate::routing::CHATBOT;
use crate::state::{NextAction, State, StatePatch};

pub const FIND_LEADS_MARKER: &str = "FIND_LEADS";
pub const SUMMARIZE_MARKER: &str = "SUMMARIZE";

const FIND_LEADS_REPLY: &str = "Great! Let me find some qualified leads for you...";
const SUMMARIZE_REPLY: &str = "Let me summarize the leads found so far...";

const CONVERSATION_TOOLS: [&str; 3] = ["search_memories", "update_memories", "search_leads"];

fn system_prompt() -> String {
    format!(
        "You are a B2B sales assistant.\n\
         If the user wants to find new leads, respond with EXACTLY '{FIND_LEADS_MARKER}'.\n\
         If the user asks for a summary of the leads already found, respond with EXACTLY \
         '{SUMMARIZE_MARKER}'.\n\
         Otherwise chat normally. Use search_memories to recall what you know about the user, \
         update_memories to correct it, search_leads to look up stored leads, and the \
         workspace tools to read the user's spreadsheets and drive files."
    )
}

/// Conversational entry point: chats, calls tools, or hands off to the
/// lead workflow through a routing hint.
pub struct ChatbotNode {
    reasoner: Reasoner,
}

impl ChatbotNode {
    pub fn new(reasoner: Reasoner) -> Self {
        Self { reasoner }
    }
}

#[async_trait::async_trait]
impl Node<State> for ChatbotNode {
    async fn run(&self, state: &State) -> Result<StatePatch> {
        let request = ChatRequest::new(with_system(system_prompt(), &state.transcript))
            .with_tools(self.reasoner.with_workspace(&CONVERSATION_TOOLS));
        let response = self.reasoner.ask(request).await?;

        if response.wants_tools() {
            return Ok(tool_request(CHATBOT, response));
        }

        let hinted = |hint: NextAction, reply: &str| StatePatch {
            routing_hint: Some(hint),
            ..StatePatch::say(reply)
        };
        if response.content.contains(FIND_LEADS_MARKER) {
            tracing::debug!("chatbot requested lead discovery");
            return Ok(hinted(NextAction::FindLeads, FIND_LEADS_REPLY));
        }
        if response.content.contains(SUMMARIZE_MARKER) {
            return Ok(hinted(NextAction::Summarize, SUMMARIZE_REPLY));
        }
        Ok(StatePatch::say(response.content))
    }
}
