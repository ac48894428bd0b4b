//! Long-term memory: per-user facts in their own vector collection.

use chrono::{DateTime, Utc};
use lg_domain::error::Result;
use serde::{Deserialize, Serialize};

use crate::index::Filter;
use crate::store::{Hit, VectorStore};
use crate::text::Embeddable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFact {
    pub user_id: String,
    pub text: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub date: DateTime<Utc>,
}

impl MemoryFact {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            categories: Vec::new(),
            date: Utc::now(),
        }
    }
}

impl Embeddable for MemoryFact {
    fn embedding_text(&self) -> String {
        self.text.clone()
    }
}

/// Memory facts scoped by `user_id`.
pub struct MemoryStore {
    store: VectorStore<MemoryFact>,
}

impl MemoryStore {
    pub fn new(store: VectorStore<MemoryFact>) -> Self {
        Self { store }
    }

    pub async fn add(&self, fact: &MemoryFact) -> Result<String> {
        self.store.store(fact).await
    }

    /// Record one chat exchange as a conversation fact.
    pub async fn add_exchange(
        &self,
        user_id: &str,
        user_message: &str,
        assistant_reply: &str,
    ) -> Result<String> {
        let mut fact = MemoryFact::new(
            user_id,
            format!("user: {user_message}\nassistant: {assistant_reply}"),
        );
        fact.categories.push("conversation".into());
        self.add(&fact).await
    }

    /// Facts of `user_id` most relevant to `query`.
    pub async fn search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Hit<MemoryFact>>> {
        let filter = Filter::eq("user_id", user_id);
        self.store.search_text(query, limit, Some(&filter)).await
    }

    /// Replace a fact's text. `false` when the id is unknown.
    pub async fn update(&self, id: &str, new_text: &str) -> bool {
        let existing = match self.store.get(id).await {
            Ok(Some(fact)) => fact,
            Ok(None) => return false,
            Err(e) => {
                tracing::error!(id = %id, error = %e, "memory lookup failed");
                return false;
            }
        };
        let updated = MemoryFact {
            text: new_text.to_owned(),
            date: Utc::now(),
            ..existing
        };
        self.store.update(id, &updated).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashingEmbedder;
    use crate::index::InMemoryIndex;
    use lg_domain::config::Distance;
    use std::sync::Arc;

    fn memory() -> MemoryStore {
        MemoryStore::new(VectorStore::new(
            Arc::new(InMemoryIndex::new()),
            Arc::new(HashingEmbedder::new(64)),
            "long-term-memories",
            Distance::Cosine,
        ))
    }

    #[tokio::test]
    async fn search_is_scoped_to_user() {
        let m = memory();
        m.add(&MemoryFact::new("alice", "prefers fintech leads")).await.unwrap();
        m.add(&MemoryFact::new("bob", "prefers fintech leads")).await.unwrap();

        let hits = m.search("alice", "fintech", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.user_id, "alice");
    }

    #[tokio::test]
    async fn update_rewrites_text() {
        let m = memory();
        let id = m.add(&MemoryFact::new("alice", "budget is small")).await.unwrap();
        assert!(m.update(&id, "budget is large").await);
        let hits = m.search("alice", "budget", 1).await.unwrap();
        assert_eq!(hits[0].payload.text, "budget is large");
        assert!(!m.update("missing", "x").await);
    }

    #[tokio::test]
    async fn exchange_is_tagged_as_conversation() {
        let m = memory();
        m.add_exchange("u", "hello", "hi there").await.unwrap();
        let hits = m.search("u", "hello", 5).await.unwrap();
        assert_eq!(hits[0].payload.categories, vec!["conversation".to_string()]);
        assert!(hits[0].payload.text.starts_with("user: hello"));
    }
}
