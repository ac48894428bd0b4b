use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Graph execution limits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Node executions allowed per `run()` before `GraphExhausted`.
    ///
    /// The default covers ten qualified leads that each spend every
    /// enrichment round on a tool search (see [`GraphConfig::steps_for_leads`]).
    #[serde(default = "d_max_steps")]
    pub max_steps: usize,
    /// Enrichment attempts per lead before it is handed to the summary as-is.
    #[serde(default = "d_max_enrichment_rounds")]
    pub max_enrichment_rounds: u32,
    /// Deadline for a single tool invocation.
    #[serde(default = "d_tool_timeout")]
    pub tool_timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_steps: d_max_steps(),
            max_enrichment_rounds: d_max_enrichment_rounds(),
            tool_timeout_secs: d_tool_timeout(),
        }
    }
}

/// Steps one discovery turn needs outside the enrichment loop: chatbot,
/// lead_finder with one tool round trip, screener, the closing enricher
/// pass, store_leads and summary.
const DISCOVERY_OVERHEAD: usize = 8;

/// enricher, tools, enricher, update_lead.
const STEPS_PER_ROUND: usize = 4;

impl GraphConfig {
    /// Worst-case steps of a discovery turn over `leads` qualified leads.
    pub fn steps_for_leads(&self, leads: usize) -> usize {
        DISCOVERY_OVERHEAD + leads * self.max_enrichment_rounds as usize * STEPS_PER_ROUND
    }
}

fn d_max_steps() -> usize {
    200
}
fn d_max_enrichment_rounds() -> u32 {
    3
}
fn d_tool_timeout() -> u64 {
    30
}
