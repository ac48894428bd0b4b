//! Vector similarity store.
//!
//! Structured records are rendered to text ([`Embeddable`]), embedded into a
//! fixed-length vector ([`Embedder`]) and persisted with their payload in a
//! [`VectorIndex`] collection. [`VectorStore`] ties the three together and is
//! used both as the lead repository and as the long-term memory index.

pub mod embed;
pub mod index;
pub mod memory;
pub mod qdrant;
pub mod store;
pub mod text;

pub use embed::{cosine_similarity, Embedder, HashingEmbedder, ProviderEmbedder};
pub use index::{Filter, IndexHit, InMemoryIndex, VectorIndex};
pub use memory::{MemoryFact, MemoryStore};
pub use qdrant::QdrantIndex;
pub use store::{Hit, VectorStore};
pub use text::Embeddable;
