use lg_domain::error::{Error, Result};
use lg_domain::tool::{Message, Role};
use lg_domain::{CriteriaProfile, Lead};
use lg_graph::Node;
use lg_providers::ChatRequest;
use serde_json::Value;

use super::{strip_fence, tool_request, with_system, Reasoner};
use crate::routing::LEAD_FINDER;
use crate::state::{State, StatePatch};

const SYSTEM_PROMPT: &str = "You are a B2B lead researcher.\n\
    Call retrieve_icp to load the ideal customer profile, search_leads to check leads we \
    already know, and the workspace tools to read the user's spreadsheets.\n\
    When you are done, answer with JSON only, in the form \
    {\"leads\": [{\"company\": str, \"industry\": str, \"employee_count\": int, \"revenue_musd\": float}]}.";

const DISCOVERY_TOOLS: [&str; 2] = ["retrieve_icp", "search_leads"];

/// Parse a discovery answer: `{"leads": [...]}` or a bare array. Items
/// without a company name are skipped.
pub fn parse_leads(text: &str) -> std::result::Result<Vec<Lead>, String> {
    let value: Value =
        serde_json::from_str(strip_fence(text)).map_err(|e| format!("answer is not JSON: {e}"))?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("leads") {
            Some(Value::Array(items)) => items,
            _ => return Err("expected a \"leads\" array".into()),
        },
        _ => return Err("expected a JSON array or object".into()),
    };
    Ok(items.iter().filter_map(Lead::from_loose_json).collect())
}

/// The newest successful `retrieve_icp` result in the transcript.
fn profile_from_transcript(transcript: &[Message]) -> Option<CriteriaProfile> {
    let icp_calls: Vec<&str> = transcript
        .iter()
        .flat_map(|m| m.tool_calls.iter())
        .filter(|c| c.tool_name == "retrieve_icp")
        .map(|c| c.call_id.as_str())
        .collect();

    transcript
        .iter()
        .rev()
        .filter(|m| m.role == Role::Tool && !m.is_error)
        .filter(|m| {
            m.tool_call_id
                .as_deref()
                .is_some_and(|id| icp_calls.contains(&id))
        })
        .find_map(|m| serde_json::from_str(&m.content).ok())
}

pub struct LeadFinderNode {
    reasoner: Reasoner,
}

impl LeadFinderNode {
    pub fn new(reasoner: Reasoner) -> Self {
        Self { reasoner }
    }
}

#[async_trait::async_trait]
impl Node<State> for LeadFinderNode {
    async fn run(&self, state: &State) -> Result<StatePatch> {
        let request = ChatRequest::new(with_system(SYSTEM_PROMPT.into(), &state.transcript))
            .with_tools(self.reasoner.with_workspace(&DISCOVERY_TOOLS))
            .json();
        let response = self.reasoner.ask(request).await?;

        if response.wants_tools() {
            return Ok(tool_request(LEAD_FINDER, response));
        }

        let leads = parse_leads(&response.content).map_err(|e| Error::node(LEAD_FINDER, e))?;
        let count = leads.len();
        tracing::info!(count, "leads discovered");

        Ok(StatePatch {
            leads: Some(leads),
            criteria_profile: profile_from_transcript(&state.transcript),
            ..StatePatch::say(format!("Found {count} leads"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_domain::tool::ToolCall;

    #[test]
    fn accepts_wrapped_and_bare_lists() {
        let wrapped = r#"{"leads": [{"company": "Acme", "industry": "tech", "employee_count": 50, "revenue_musd": 2.5}]}"#;
        let bare = r#"[{"company": "Globex", "industry": "energy", "employee_count": 900, "revenue_musd": 40}]"#;
        assert_eq!(parse_leads(wrapped).unwrap()[0].company, "Acme");
        assert_eq!(parse_leads(bare).unwrap()[0].employee_count, 900);
    }

    #[test]
    fn skips_items_without_company() {
        let leads = parse_leads(r#"[{"industry": "tech"}, {"company": "Acme"}]"#).unwrap();
        assert_eq!(leads.len(), 1);
    }

    #[test]
    fn prose_is_rejected() {
        assert!(parse_leads("Here are some leads: Acme, Globex").is_err());
        assert!(parse_leads(r#"{"companies": []}"#).is_err());
    }

    #[test]
    fn profile_comes_from_icp_result_only() {
        let transcript = vec![
            Message::assistant_with_calls(
                "",
                vec![
                    ToolCall {
                        call_id: "a".into(),
                        tool_name: "retrieve_icp".into(),
                        arguments: serde_json::json!({}),
                    },
                    ToolCall {
                        call_id: "b".into(),
                        tool_name: "search_leads".into(),
                        arguments: serde_json::json!({"query": "x"}),
                    },
                ],
            ),
            Message::tool_result("a", r#"{"industries_blocked": ["Gambling"]}"#, false),
            Message::tool_result("b", r#"{"status": "success"}"#, false),
        ];
        let profile = profile_from_transcript(&transcript).unwrap();
        assert_eq!(profile.industries_blocked, vec!["Gambling"]);
        assert!(profile_from_transcript(&transcript[2..]).is_none());
    }
}
