use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::AuthConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Lead pipeline
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Industries always rejected by the screener, on top of the profile.
    #[serde(default = "d_blocked_industries")]
    pub blocked_industries: Vec<String>,
    /// How many neighbours `store_leads` inspects per lead.
    #[serde(default = "d_similar_limit")]
    pub similar_limit: usize,
    /// Results returned by the `search_leads` tool.
    #[serde(default = "d_search_limit")]
    pub lead_search_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            blocked_industries: d_blocked_industries(),
            similar_limit: d_similar_limit(),
            lead_search_limit: d_search_limit(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Web search (Serper-compatible)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "d_search_url")]
    pub base_url: String,
    #[serde(default = "d_search_auth")]
    pub auth: AuthConfig,
    /// Organic results folded into the tool output.
    #[serde(default = "d_results")]
    pub max_results: usize,
    #[serde(default = "d_search_timeout")]
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: d_search_url(),
            auth: d_search_auth(),
            max_results: d_results(),
            timeout_ms: d_search_timeout(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Criteria profile source
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// TOML file holding the ideal-customer profile.
    #[serde(default = "d_profile_path")]
    pub path: PathBuf,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            path: d_profile_path(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Long-term memory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Record each chat exchange as a memory fact.
    #[serde(default = "d_true")]
    pub enabled: bool,
    #[serde(default = "d_user")]
    pub user_id: String,
    #[serde(default = "d_memory_limit")]
    pub search_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user_id: d_user(),
            search_limit: d_memory_limit(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "d_max_input")]
    pub max_input_chars: usize,
    /// Reply sent when a turn fails for any internal reason.
    #[serde(default = "d_apology")]
    pub apology: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_input_chars: d_max_input(),
            apology: d_apology(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_blocked_industries() -> Vec<String> {
    vec!["logistics".into()]
}
fn d_similar_limit() -> usize {
    2
}
fn d_search_limit() -> usize {
    10
}
fn d_search_url() -> String {
    "https://google.serper.dev".into()
}
fn d_search_auth() -> AuthConfig {
    AuthConfig {
        header: Some("X-API-KEY".into()),
        prefix: Some(String::new()),
        ..AuthConfig::from_env("SERPER_API_KEY")
    }
}
fn d_results() -> usize {
    5
}
fn d_search_timeout() -> u64 {
    15_000
}
fn d_profile_path() -> PathBuf {
    PathBuf::from("icp.toml")
}
fn d_true() -> bool {
    true
}
fn d_user() -> String {
    "default_user".into()
}
fn d_memory_limit() -> usize {
    5
}
fn d_max_input() -> usize {
    5000
}
fn d_apology() -> String {
    "Sorry, something went wrong while processing your request. Please try again.".into()
}
