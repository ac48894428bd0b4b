use std::sync::Arc;

use lg_domain::error::Result;
use lg_domain::trace::TraceEvent;
use lg_domain::Lead;
use lg_graph::Node;
use lg_vector::VectorStore;

use crate::state::{State, StatePatch};

/// Writes qualified leads to the lead repository, updating the stored
/// record when the nearest neighbour is the same company.
pub struct StoreLeadsNode {
    leads: Arc<VectorStore<Lead>>,
    similar_limit: usize,
}

impl StoreLeadsNode {
    pub fn new(leads: Arc<VectorStore<Lead>>, similar_limit: usize) -> Self {
        Self {
            leads,
            similar_limit: similar_limit.max(1),
        }
    }

    /// Store or update one lead; returns its report line.
    async fn persist(&self, lead: &Lead) -> Result<(String, bool)> {
        let hits = self.leads.search(lead, self.similar_limit, None).await?;

        let existing = hits
            .first()
            .filter(|h| h.payload.same_company(&lead.company))
            .map(|h| h.id.clone());
        let updated = match existing {
            Some(id) if self.leads.update(&id, lead).await => true,
            _ => {
                self.leads.store(lead).await?;
                false
            }
        };

        let similar: Vec<&str> = hits
            .iter()
            .filter(|h| !h.payload.same_company(&lead.company))
            .map(|h| h.payload.company.as_str())
            .collect();
        let line = if similar.is_empty() {
            format!("- {}", lead.company)
        } else {
            format!("- {} (Similar to: {})", lead.company, similar.join(", "))
        };
        Ok((line, updated))
    }
}

#[async_trait::async_trait]
impl Node<State> for StoreLeadsNode {
    async fn run(&self, state: &State) -> Result<StatePatch> {
        if state.filtered_leads.is_empty() {
            return Ok(StatePatch::say("No leads to process"));
        }

        let mut lines = Vec::with_capacity(state.filtered_leads.len());
        let (mut stored, mut updated) = (0usize, 0usize);
        for lead in &state.filtered_leads {
            match self.persist(lead).await {
                Ok((line, true)) => {
                    updated += 1;
                    lines.push(line);
                }
                Ok((line, false)) => {
                    stored += 1;
                    lines.push(line);
                }
                Err(e) => {
                    tracing::error!(company = %lead.company, error = %e, "storing lead failed");
                    lines.push(format!("- {} (not stored)", lead.company));
                }
            }
        }

        TraceEvent::LeadsStored {
            collection: self.leads.collection().to_owned(),
            stored,
            updated,
        }
        .emit();

        Ok(StatePatch::say(format!("Processed leads:\n{}", lines.join("\n"))))
    }
}
