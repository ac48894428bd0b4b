use lg_domain::error::Result;
use lg_domain::tool::{Message, Role};
use lg_domain::Lead;
use lg_graph::Node;
use lg_providers::ChatRequest;
use serde_json::Value;

use super::enricher::PROCESSING_PREFIX;
use super::{strip_fence, Reasoner};
use crate::state::{State, StatePatch};

const CONTACT_RULES: &str = "CRITICAL RULES FOR CONTACTS:\n\
    1. ONLY include contacts EXPLICITLY mentioned in the search results with their actual \
    name, email, phone number and position.\n\
    2. If the search results do not contain all four for a person, leave that person out.\n\
    3. DO NOT create, guess or infer names, email addresses or phone numbers.\n\
    4. If no real contact information is present, contacts must be [].";

/// Text the enricher's last round produced: the tool results that answered
/// its latest calls, or its plain answer when it called no tool.
pub fn latest_tool_output(transcript: &[Message]) -> String {
    let mut tail = transcript.iter().rev().peekable();
    if tail.peek().is_some_and(|m| {
        m.role == Role::Assistant && !m.has_tool_calls() && m.content.starts_with(PROCESSING_PREFIX)
    }) {
        tail.next();
    }

    let mut outputs: Vec<&str> = Vec::new();
    for m in tail {
        match m.role {
            Role::Tool => outputs.push(&m.content),
            Role::Assistant if outputs.is_empty() && !m.has_tool_calls() => {
                return m.content.clone();
            }
            _ => break,
        }
    }
    outputs.reverse();
    outputs.join("\n\n")
}

/// Combine a model-produced lead with the one it enriches. Identity stays
/// with `existing`; unset or empty enriched values never erase known ones.
fn merge_lead(existing: &Lead, enriched: Lead) -> Lead {
    Lead {
        company: existing.company.clone(),
        industry: if enriched.industry.trim().is_empty() {
            existing.industry.clone()
        } else {
            enriched.industry
        },
        employee_count: if enriched.employee_count > 0 {
            enriched.employee_count
        } else {
            existing.employee_count
        },
        revenue_musd: if enriched.revenue_musd > 0.0 {
            enriched.revenue_musd
        } else {
            existing.revenue_musd
        },
        website: enriched.website.or_else(|| existing.website.clone()),
        last_year_profit: enriched.last_year_profit.or(existing.last_year_profit),
        last_quarter_ebitda: enriched.last_quarter_ebitda.or(existing.last_quarter_ebitda),
        stock_variation_3m: enriched.stock_variation_3m.or(existing.stock_variation_3m),
        contacts: if enriched.contacts.is_empty() {
            existing.contacts.clone()
        } else {
            enriched.contacts
        },
    }
}

fn parse_enriched(text: &str) -> Option<Lead> {
    let value: Value = serde_json::from_str(strip_fence(text)).ok()?;
    let obj = value.get("lead").unwrap_or(&value);
    Lead::from_loose_json(obj)
}

/// Folds the latest search output into the lead being enriched.
pub struct UpdateLeadNode {
    reasoner: Reasoner,
}

impl UpdateLeadNode {
    pub fn new(reasoner: Reasoner) -> Self {
        Self { reasoner }
    }
}

#[async_trait::async_trait]
impl Node<State> for UpdateLeadNode {
    async fn run(&self, state: &State) -> Result<StatePatch> {
        let Some(target) = state.enrichment_target.as_deref() else {
            return Ok(StatePatch::default());
        };
        let Some(lead) = state
            .filtered_leads
            .iter()
            .find(|l| l.same_company(target) && l.needs_enrichment())
        else {
            return Ok(StatePatch::default());
        };

        let prompt = format!(
            "Combine the existing lead and the search results into one complete lead. \
             Answer with a JSON object with the fields company, industry, employee_count, \
             revenue_musd, website, last_year_profit, last_quarter_ebitda, \
             stock_variation_3m and contacts (name, email, phone, position). Use null for \
             anything the results do not state.\n\n\
             Existing lead: {existing}\n\
             Search results: {results}\n\n{CONTACT_RULES}",
            existing = serde_json::to_string(lead)?,
            results = latest_tool_output(&state.transcript),
        );

        let response = self
            .reasoner
            .ask(ChatRequest::new(vec![Message::user(prompt)]).json())
            .await?;

        let Some(enriched) = parse_enriched(&response.content) else {
            tracing::warn!(company = %lead.company, "enrichment answer was not a lead, keeping it unchanged");
            return Ok(StatePatch::default());
        };
        if !enriched.same_company(&lead.company) {
            tracing::warn!(
                expected = %lead.company,
                got = %enriched.company,
                "enrichment answer names another company, ignoring it"
            );
            return Ok(StatePatch::default());
        }

        let merged = merge_lead(lead, enriched);
        let updated = state
            .filtered_leads
            .iter()
            .map(|l| {
                if l.same_company(&merged.company) {
                    merged.clone()
                } else {
                    l.clone()
                }
            })
            .collect();

        Ok(StatePatch {
            filtered_leads: Some(updated),
            ..Default::default()
        })
    }
}
