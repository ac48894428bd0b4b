use lg_domain::error::Result;
use lg_graph::Node;
use lg_providers::ChatRequest;

use super::{with_system, Reasoner};
use crate::state::{State, StatePatch};

pub struct SummaryNode {
    reasoner: Reasoner,
}

impl SummaryNode {
    pub fn new(reasoner: Reasoner) -> Self {
        Self { reasoner }
    }
}

#[async_trait::async_trait]
impl Node<State> for SummaryNode {
    async fn run(&self, state: &State) -> Result<StatePatch> {
        let leads = serde_json::to_string_pretty(&state.filtered_leads)?;
        let system = format!(
            "Summarize these {count} B2B leads in a friendly way.\n\
             Leads:\n{leads}\n\n\
             # Instructions\n\
             - Use markdown to format the summary\n\
             - Mention every lead exactly once",
            count = state.filtered_leads.len(),
        );
        let response = self
            .reasoner
            .ask(ChatRequest::new(with_system(system, &state.transcript)))
            .await?;
        Ok(StatePatch::say(response.content))
    }
}
