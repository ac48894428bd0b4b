use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Identifier used in logs and error messages.
    #[serde(default = "d_provider_id")]
    pub id: String,
    /// OpenAI-compatible API root (`.../v1`).
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_embedding_model")]
    pub embedding_model: String,
    /// Sampling temperature. `None` lets the provider choose.
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "d_60000u")]
    pub timeout_ms: u64,
    #[serde(default = "d_2")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            id: d_provider_id(),
            base_url: d_base_url(),
            auth: AuthConfig::default(),
            model: d_model(),
            embedding_model: d_embedding_model(),
            temperature: None,
            timeout_ms: 60_000,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header name (e.g. "Authorization", "api-key").
    #[serde(default)]
    pub header: Option<String>,
    /// Header value prefix (e.g. "Bearer ").
    #[serde(default)]
    pub prefix: Option<String>,
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env or the keychain).
    #[serde(default)]
    pub key: Option<String>,
    /// Keychain service name (e.g., "leadgraph").
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name (e.g., "openai-api-key").
    #[serde(default)]
    pub account: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: None,
            prefix: None,
            env: Some("OPENAI_API_KEY".into()),
            key: None,
            service: None,
            account: None,
        }
    }
}

impl AuthConfig {
    /// Auth read from a single environment variable.
    pub fn from_env(var: impl Into<String>) -> Self {
        Self {
            env: Some(var.into()),
            ..Self::default()
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_provider_id() -> String {
    "openai".into()
}
fn d_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn d_60000u() -> u64 {
    60_000
}
fn d_2() -> u32 {
    2
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_auth_reads_openai_env() {
        let cfg = LlmConfig::default();
        assert_eq!(cfg.auth.env.as_deref(), Some("OPENAI_API_KEY"));
        assert!(cfg.auth.key.is_none());
    }

    #[test]
    fn partial_section_keeps_defaults() {
        let json = r#"{ "model": "gpt-4o", "auth": { "env": "MY_KEY" } }"#;
        let cfg: LlmConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.embedding_model, "text-embedding-3-small");
        assert_eq!(cfg.auth.env.as_deref(), Some("MY_KEY"));
        assert_eq!(cfg.timeout_ms, 60_000);
    }

    #[test]
    fn auth_config_deserializes_keychain_fields() {
        let json = r#"{ "service": "leadgraph", "account": "openai-api-key" }"#;
        let auth: AuthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(auth.service.as_deref(), Some("leadgraph"));
        assert_eq!(auth.account.as_deref(), Some("openai-api-key"));
        assert!(auth.env.is_none());
    }
}
