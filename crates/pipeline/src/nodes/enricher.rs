use lg_domain::error::Result;
use lg_domain::tool::{Message, Role};
use lg_graph::Node;
use lg_providers::ChatRequest;

use super::{tool_request, Reasoner};
use crate::routing::ENRICHER;
use crate::state::{State, StatePatch};

pub(crate) const PROCESSING_PREFIX: &str = "Processing results for ";

/// Drives one enrichment round at a time: asks the model to search for the
/// next incomplete lead, then hands the results to `update_lead`.
pub struct EnricherNode {
    reasoner: Reasoner,
    max_rounds: u32,
}

impl EnricherNode {
    pub fn new(reasoner: Reasoner, max_rounds: u32) -> Self {
        Self {
            reasoner,
            max_rounds,
        }
    }
}

#[async_trait::async_trait]
impl Node<State> for EnricherNode {
    async fn run(&self, state: &State) -> Result<StatePatch> {
        if state.filtered_leads.is_empty() {
            return Ok(StatePatch::default());
        }

        if state.last_message().map(|m| m.role) == Some(Role::Tool) {
            let company = state
                .enrichment_target
                .clone()
                .or_else(|| state.next_lead_to_enrich(self.max_rounds).map(|l| l.company.clone()))
                .unwrap_or_default();
            tracing::debug!(company = %company, "search results received");
            return Ok(StatePatch::say(format!("{PROCESSING_PREFIX}{company}")));
        }

        let Some(lead) = state.next_lead_to_enrich(self.max_rounds) else {
            return Ok(StatePatch::say("All leads have been enriched!"));
        };

        let current = serde_json::to_string(lead)?;
        let system = format!(
            "You are enriching lead data for {company}.\n\
             Current data: {current}\n\
             Use search_company_info to find ONLY the missing fields (website, last year \
             profit, last quarter EBITDA, 3-month stock variation, contacts). Be specific in \
             your search query. After getting results, extract the relevant information clearly.",
            company = lead.company
        );

        let mut messages = state.transcript.clone();
        messages.push(Message::system(system));
        messages.push(Message::user(format!(
            "Find missing information for {}",
            lead.company
        )));

        let request = ChatRequest::new(messages)
            .with_tools(self.reasoner.only(&["search_company_info"]));
        let response = self.reasoner.ask(request).await?;

        tracing::info!(
            company = %lead.company,
            round = state.rounds_for(&lead.company) + 1,
            "enrichment round"
        );
        let mut patch = if !response.wants_tools() {
            StatePatch::say(response.content)
        } else {
            tool_request(ENRICHER, response)
        };
        patch.enrichment_round = Some(lead.company.clone());
        Ok(patch)
    }
}
