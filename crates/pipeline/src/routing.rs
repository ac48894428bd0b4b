//! Node names and the routers wired between them.

use crate::state::State;

pub const CHATBOT: &str = "chatbot";
pub const TOOLS: &str = "tools";
pub const LEAD_FINDER: &str = "lead_finder";
pub const SCREENER: &str = "screener";
pub const ENRICHER: &str = "enricher";
pub const UPDATE_LEAD: &str = "update_lead";
pub const SUMMARY: &str = "summary";
pub const STORE_LEADS: &str = "store_leads";

/// Label for "this turn is over".
pub const DONE: &str = "end";

fn wants_tools(state: &State) -> bool {
    state
        .last_message()
        .map(|m| m.has_tool_calls())
        .unwrap_or(false)
}

/// Tool calls first, then a pending routing hint (consumed), else done.
pub fn chatbot_route(state: &mut State) -> String {
    if wants_tools(state) {
        return TOOLS.into();
    }
    match state.routing_hint.take() {
        Some(hint) => hint.label().into(),
        None => DONE.into(),
    }
}

/// Back to whichever node asked for the tools.
pub fn tools_route(state: &mut State) -> String {
    state
        .last_tool_caller
        .clone()
        .unwrap_or_else(|| LEAD_FINDER.into())
}

/// `"tools"` while the last turn requests tool calls, else `otherwise`.
pub fn tool_condition(otherwise: &'static str) -> impl Fn(&mut State) -> String + Send + Sync {
    move |state: &mut State| {
        if wants_tools(state) {
            TOOLS.into()
        } else {
            otherwise.into()
        }
    }
}

/// Keep enriching while some lead is incomplete and still has rounds left,
/// then store what was found.
pub fn enrichment_route(max_rounds: u32) -> impl Fn(&mut State) -> String + Send + Sync {
    move |state: &mut State| {
        if state.next_lead_to_enrich(max_rounds).is_some() {
            ENRICHER.into()
        } else {
            STORE_LEADS.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{NextAction, StatePatch};
    use lg_domain::tool::{Message, ToolCall};
    use lg_domain::Lead;
    use lg_graph::GraphState;

    fn with_calls() -> Message {
        Message::assistant_with_calls(
            "",
            vec![ToolCall {
                call_id: "c1".into(),
                tool_name: "search_leads".into(),
                arguments: serde_json::json!({"query": "fintech"}),
            }],
        )
    }

    #[test]
    fn chatbot_prefers_tool_calls_over_hint() {
        let mut state = State::default();
        state.merge(StatePatch {
            routing_hint: Some(NextAction::FindLeads),
            ..StatePatch::message(with_calls())
        });
        assert_eq!(chatbot_route(&mut state), TOOLS);
        assert_eq!(state.routing_hint, Some(NextAction::FindLeads));
    }

    #[test]
    fn chatbot_consumes_hint() {
        let mut state = State::default();
        state.merge(StatePatch {
            routing_hint: Some(NextAction::Summarize),
            ..StatePatch::say("Let me summarize")
        });
        assert_eq!(chatbot_route(&mut state), SUMMARY);
        assert_eq!(state.routing_hint, None);
        assert_eq!(chatbot_route(&mut state), DONE);
    }

    #[test]
    fn tools_return_to_caller_or_lead_finder() {
        let mut state = State::default();
        assert_eq!(tools_route(&mut state), LEAD_FINDER);
        state.last_tool_caller = Some(ENRICHER.into());
        assert_eq!(tools_route(&mut state), ENRICHER);
    }

    #[test]
    fn enrichment_stops_when_rounds_are_spent() {
        let mut state = State {
            filtered_leads: vec![Lead::new("Acme", "tech", 10, 1.0)],
            ..Default::default()
        };
        let route = enrichment_route(2);
        assert_eq!(route(&mut state), ENRICHER);
        for _ in 0..2 {
            state.merge(StatePatch {
                enrichment_round: Some("Acme".into()),
                ..Default::default()
            });
        }
        assert_eq!(route(&mut state), STORE_LEADS);
    }

    #[test]
    fn tool_condition_falls_through_without_calls() {
        let mut state = State::default();
        state.merge(StatePatch::say("[]"));
        assert_eq!(tool_condition(SCREENER)(&mut state), SCREENER);
        state.merge(StatePatch::message(with_calls()));
        assert_eq!(tool_condition(SCREENER)(&mut state), TOOLS);
    }
}
