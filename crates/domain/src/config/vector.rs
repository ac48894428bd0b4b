use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Vector similarity store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    #[serde(default)]
    pub backend: VectorBackend,
    /// Qdrant REST root (`backend = "qdrant"` only).
    #[serde(default = "d_url")]
    pub url: String,
    /// Env var holding the Qdrant API key, if the server requires one.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "d_lead_collection")]
    pub lead_collection: String,
    #[serde(default = "d_memory_collection")]
    pub memory_collection: String,
    /// Embedding dimension; also the collection's vector size.
    #[serde(default = "d_dimension")]
    pub dimension: usize,
    #[serde(default)]
    pub distance: Distance,
    #[serde(default)]
    pub embedder: EmbedderKind,
    #[serde(default = "d_10000u")]
    pub timeout_ms: u64,
    #[serde(default = "d_3")]
    pub max_retries: u32,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Memory,
            url: d_url(),
            api_key_env: None,
            lead_collection: d_lead_collection(),
            memory_collection: d_memory_collection(),
            dimension: d_dimension(),
            distance: Distance::Cosine,
            embedder: EmbedderKind::Provider,
            timeout_ms: 10_000,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// Exact in-process index; contents are lost on exit.
    #[default]
    Memory,
    Qdrant,
}

/// Similarity metric. Higher scores are always "more similar".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
    Euclid,
}

impl Distance {
    /// Name used by the Qdrant collection API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Distance::Cosine => "Cosine",
            Distance::Dot => "Dot",
            Distance::Euclid => "Euclid",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Embeddings endpoint of the configured LLM provider.
    #[default]
    Provider,
    /// Local deterministic trigram hashing (offline use and tests).
    Hashing,
}

fn d_url() -> String {
    "http://localhost:6333".into()
}
fn d_lead_collection() -> String {
    "leads-collection".into()
}
fn d_memory_collection() -> String {
    "long-term-memories".into()
}
fn d_dimension() -> usize {
    64
}
fn d_10000u() -> u64 {
    10_000
}
fn d_3() -> u32 {
    3
}
