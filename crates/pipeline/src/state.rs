//! Session state of the lead pipeline and the patches nodes return.

use std::collections::BTreeMap;

use lg_domain::tool::{Message, Role};
use lg_domain::{CriteriaProfile, Lead};
use lg_graph::GraphState;
use serde::{Deserialize, Serialize};

/// A transition a node asks the next router to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    FindLeads,
    Summarize,
}

impl NextAction {
    pub const ALL: [NextAction; 2] = [NextAction::FindLeads, NextAction::Summarize];

    /// Label looked up in the chatbot edge table.
    pub fn label(self) -> &'static str {
        match self {
            NextAction::FindLeads => "lead_finder",
            NextAction::Summarize => "summary",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub transcript: Vec<Message>,
    #[serde(default)]
    pub leads: Vec<Lead>,
    #[serde(default)]
    pub filtered_leads: Vec<Lead>,
    #[serde(default)]
    pub criteria_profile: Option<CriteriaProfile>,
    #[serde(default)]
    pub routing_hint: Option<NextAction>,
    #[serde(default)]
    pub last_tool_caller: Option<String>,
    /// Company → enrichment rounds spent on it in the current discovery pass.
    #[serde(default)]
    pub enrichment_rounds: BTreeMap<String, u32>,
    /// Company whose enrichment round is in flight.
    #[serde(default)]
    pub enrichment_target: Option<String>,
}

impl State {
    pub fn last_message(&self) -> Option<&Message> {
        self.transcript.last()
    }

    pub fn rounds_for(&self, company: &str) -> u32 {
        self.enrichment_rounds
            .get(&company.trim().to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// First qualified lead that still needs enrichment and has rounds left.
    pub fn next_lead_to_enrich(&self, max_rounds: u32) -> Option<&Lead> {
        self.filtered_leads
            .iter()
            .find(|l| l.needs_enrichment() && self.rounds_for(&l.company) < max_rounds)
    }

    /// Content of the most recent assistant turn.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && !m.content.is_empty())
            .map(|m| m.content.as_str())
    }
}

/// Partial update returned by a node.
///
/// Messages are appended; every other `Some` field replaces the current
/// value. Replacing `leads` starts a new discovery pass, which resets the
/// enrichment bookkeeping.
#[derive(Debug, Default)]
pub struct StatePatch {
    pub messages: Vec<Message>,
    pub leads: Option<Vec<Lead>>,
    pub filtered_leads: Option<Vec<Lead>>,
    pub criteria_profile: Option<CriteriaProfile>,
    pub routing_hint: Option<NextAction>,
    pub last_tool_caller: Option<String>,
    /// Count one enrichment round against this company.
    pub enrichment_round: Option<String>,
}

impl StatePatch {
    pub fn message(message: Message) -> Self {
        Self {
            messages: vec![message],
            ..Default::default()
        }
    }

    /// An assistant turn with plain text.
    pub fn say(text: impl Into<String>) -> Self {
        Self::message(Message::assistant(text))
    }

    /// Input patch for one user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::message(Message::user(text))
    }
}

impl GraphState for State {
    type Patch = StatePatch;

    fn merge(&mut self, patch: StatePatch) {
        self.transcript.extend(patch.messages);

        if let Some(leads) = patch.leads {
            self.leads = leads;
            self.enrichment_rounds.clear();
            self.enrichment_target = None;
        }
        if let Some(filtered) = patch.filtered_leads {
            self.filtered_leads = filtered;
        }
        if let Some(profile) = patch.criteria_profile {
            self.criteria_profile = Some(profile);
        }
        if let Some(hint) = patch.routing_hint {
            self.routing_hint = Some(hint);
        }
        if let Some(caller) = patch.last_tool_caller {
            self.last_tool_caller = Some(caller);
        }
        if let Some(company) = patch.enrichment_round {
            let key = company.trim().to_lowercase();
            *self.enrichment_rounds.entry(key).or_insert(0) += 1;
            self.enrichment_target = Some(company);
        }
    }

    /// Answer every call of the trailing tool-requesting turn that has no
    /// result yet, so the transcript stays acceptable to the provider.
    fn settle(&mut self) {
        let Some(at) = self
            .transcript
            .iter()
            .rposition(|m| m.role == Role::Assistant && m.has_tool_calls())
        else {
            return;
        };
        if self.transcript[at + 1..].iter().any(|m| m.role != Role::Tool) {
            return;
        }
        let answered: Vec<&str> = self.transcript[at + 1..]
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        let open: Vec<Message> = self.transcript[at]
            .tool_calls
            .iter()
            .filter(|c| !answered.contains(&c.call_id.as_str()))
            .map(|c| {
                Message::tool_result(
                    c.call_id.clone(),
                    format!("Tool '{}' was not run: the turn stopped early.", c.tool_name),
                    true,
                )
            })
            .collect();
        if !open.is_empty() {
            tracing::debug!(count = open.len(), "closing unanswered tool calls");
        }
        self.transcript.extend(open);
        self.last_tool_caller = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_append_and_leads_replace() {
        let mut state = State::default();
        state.merge(StatePatch::user("find me leads"));
        state.merge(StatePatch {
            leads: Some(vec![Lead::new("Acme", "tech", 10, 1.0)]),
            ..StatePatch::say("Found 1 leads")
        });
        state.merge(StatePatch {
            leads: Some(vec![Lead::new("Globex", "energy", 20, 2.0)]),
            ..Default::default()
        });

        assert_eq!(state.transcript.len(), 2);
        assert_eq!(state.leads.len(), 1);
        assert_eq!(state.leads[0].company, "Globex");
    }

    #[test]
    fn enrichment_rounds_count_per_company_case_insensitively() {
        let mut state = State {
            filtered_leads: vec![Lead::new("Acme", "tech", 10, 1.0), Lead::new("Globex", "energy", 5, 1.0)],
            ..Default::default()
        };
        for _ in 0..2 {
            state.merge(StatePatch {
                enrichment_round: Some("ACME ".into()),
                ..Default::default()
            });
        }
        assert_eq!(state.rounds_for("acme"), 2);
        assert_eq!(state.next_lead_to_enrich(3).map(|l| l.company.as_str()), Some("Acme"));
        assert_eq!(state.next_lead_to_enrich(2).map(|l| l.company.as_str()), Some("Globex"));
    }

    #[test]
    fn new_discovery_pass_resets_rounds() {
        let mut state = State::default();
        state.merge(StatePatch {
            enrichment_round: Some("Acme".into()),
            ..Default::default()
        });
        state.merge(StatePatch {
            leads: Some(vec![]),
            ..Default::default()
        });
        assert!(state.enrichment_rounds.is_empty());
        assert!(state.enrichment_target.is_none());
    }

    #[test]
    fn settle_answers_only_the_open_calls() {
        use lg_domain::tool::ToolCall;

        let call = |id: &str| ToolCall {
            call_id: id.into(),
            tool_name: "search_leads".into(),
            arguments: serde_json::json!({"query": "acme"}),
        };
        let mut state = State::default();
        state.merge(StatePatch::user("hi"));
        state.merge(StatePatch::message(Message::assistant_with_calls(
            "",
            vec![call("c1"), call("c2")],
        )));
        state.merge(StatePatch::message(Message::tool_result("c1", "[]", false)));

        state.settle();
        assert_eq!(state.transcript.len(), 4);
        let last = &state.transcript[3];
        assert_eq!(last.tool_call_id.as_deref(), Some("c2"));
        assert!(last.is_error);

        // Nothing left to close.
        state.settle();
        assert_eq!(state.transcript.len(), 4);
    }

    #[test]
    fn state_roundtrips_through_json() {
        let mut state = State::default();
        state.merge(StatePatch {
            routing_hint: Some(NextAction::FindLeads),
            ..StatePatch::user("hi")
        });
        let back: State = serde_json::from_value(serde_json::to_value(&state).unwrap()).unwrap();
        assert_eq!(back, state);
    }
}
