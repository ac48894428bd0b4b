//! Text → vector embedders.

use std::sync::Arc;

use lg_domain::error::{Error, Result};
use lg_providers::{EmbeddingsRequest, LlmProvider};
use sha2::{Digest, Sha256};

#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text into a vector of [`Embedder::dimension`] floats.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}

/// Cosine similarity between two vectors. Mismatched lengths or a zero
/// vector score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(
            len_a = a.len(),
            len_b = b.len(),
            "cosine_similarity: mismatched vector lengths, returning 0.0"
        );
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Scale a vector to unit length in place. Zero vectors are left alone.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Provider-backed embedder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Calls the provider's embeddings endpoint, requesting `dimension` outputs.
pub struct ProviderEmbedder {
    provider: Arc<dyn LlmProvider>,
    model: Option<String>,
    dimension: usize,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn LlmProvider>, model: Option<String>, dimension: usize) -> Self {
        Self {
            provider,
            model,
            dimension,
        }
    }
}

#[async_trait::async_trait]
impl Embedder for ProviderEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let resp = self
            .provider
            .embeddings(EmbeddingsRequest::one(text, self.model.clone(), self.dimension))
            .await?;

        let mut vector = resp
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::VectorStore("embeddings response was empty".into()))?;

        if vector.len() != self.dimension {
            return Err(Error::VectorStore(format!(
                "embedding has {} dimensions, expected {}",
                vector.len(),
                self.dimension
            )));
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Hashing embedder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Deterministic offline embedder.
///
/// Text is read as `|`-separated fields of `Label: value`. Every word of a
/// value contributes itself and its character trigrams, hashed into
/// `dimension` signed buckets. Labels are skipped since every record shares
/// them. The first field names the record and weighs
/// [`NAME_FIELD_WEIGHT`] times more, so near-duplicate names outrank
/// records that merely share attribute values.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

pub const NAME_FIELD_WEIGHT: f32 = 3.0;

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        let lower = text.to_lowercase();

        for (i, field) in lower.split('|').enumerate() {
            let weight = if i == 0 { NAME_FIELD_WEIGHT } else { 1.0 };
            for token in field.split_whitespace() {
                if token.ends_with(':') {
                    continue;
                }
                let word: String = token
                    .chars()
                    .filter(|c| c.is_alphanumeric() || *c == '.')
                    .collect();
                if word.is_empty() {
                    continue;
                }
                self.add(&mut v, &format!("w:{word}"), weight);
                let padded: Vec<char> = format!(" {word} ").chars().collect();
                for gram in padded.windows(3) {
                    self.add(&mut v, &gram.iter().collect::<String>(), weight);
                }
            }
        }

        l2_normalize(&mut v);
        v
    }

    fn add(&self, v: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket = [0u8; 8];
        bucket.copy_from_slice(&digest[..8]);
        let idx = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        v[idx] += sign * weight;
    }
}

#[async_trait::async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
