//! Typed vector store over one collection.
//!
//! `VectorStore<P>` embeds `P` with [`Embeddable::embedding_text`], stores the
//! serialized payload next to the vector and decodes payloads on the way
//! out. The collection is bootstrapped lazily on first use; concurrent first
//! callers share one bootstrap.

use std::marker::PhantomData;
use std::sync::Arc;

use lg_domain::config::Distance;
use lg_domain::error::{Error, Result};
use lg_domain::trace::TraceEvent;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::embed::Embedder;
use crate::index::{Filter, VectorIndex};
use crate::text::Embeddable;

/// A decoded search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<P> {
    pub id: String,
    pub score: f32,
    pub payload: P,
}

pub struct VectorStore<P> {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    distance: Distance,
    ready: OnceCell<()>,
    _payload: PhantomData<fn() -> P>,
}

impl<P> VectorStore<P>
where
    P: Embeddable + Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
        distance: Distance,
    ) -> Self {
        Self {
            index,
            embedder,
            collection: collection.into(),
            distance,
            ready: OnceCell::new(),
            _payload: PhantomData,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the backing collection if needed. Idempotent; a failed
    /// bootstrap is retried on the next call.
    pub async fn bootstrap(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                let created = self
                    .index
                    .ensure_collection(&self.collection, self.embedder.dimension(), self.distance)
                    .await?;
                TraceEvent::CollectionBootstrapped {
                    collection: self.collection.clone(),
                    created,
                }
                .emit();
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }

    async fn vector_for(&self, payload: &P) -> Result<Vec<f32>> {
        self.embedder.embed(&payload.embedding_text()).await
    }

    /// Persist a new record and return its store-assigned id.
    pub async fn store(&self, payload: &P) -> Result<String> {
        self.bootstrap().await?;
        let id = uuid::Uuid::new_v4().to_string();
        let vector = self.vector_for(payload).await?;
        self.index
            .upsert(&self.collection, &id, vector, serde_json::to_value(payload)?)
            .await?;
        tracing::debug!(collection = %self.collection, id = %id, "record stored");
        Ok(id)
    }

    /// Payloads most similar to `payload`, most similar first.
    pub async fn find_similar(&self, payload: &P, limit: usize) -> Result<Vec<P>> {
        Ok(self
            .search(payload, limit, None)
            .await?
            .into_iter()
            .map(|h| h.payload)
            .collect())
    }

    /// Nearest neighbours of a record, with ids and scores.
    pub async fn search(
        &self,
        payload: &P,
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<Hit<P>>> {
        check_limit(limit)?;
        self.bootstrap().await?;
        let vector = self.vector_for(payload).await?;
        self.search_vector(&vector, limit, filter).await
    }

    /// Nearest neighbours of a free-text query.
    pub async fn search_text(
        &self,
        query: &str,
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<Hit<P>>> {
        check_limit(limit)?;
        self.bootstrap().await?;
        let vector = self.embedder.embed(query).await?;
        self.search_vector(&vector, limit, filter).await
    }

    async fn search_vector(
        &self,
        vector: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<Hit<P>>> {
        let raw = self
            .index
            .search(&self.collection, vector, limit, filter)
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|h| match serde_json::from_value::<P>(h.payload) {
                Ok(payload) => Some(Hit {
                    id: h.id,
                    score: h.score,
                    payload,
                }),
                Err(e) => {
                    tracing::warn!(collection = %self.collection, id = %h.id, error = %e, "skipping undecodable payload");
                    None
                }
            })
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<P>> {
        self.bootstrap().await?;
        match self.index.get(&self.collection, id).await? {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }

    /// Replace the payload of an existing record and re-embed it.
    ///
    /// Returns `false` when the id is unknown or the backend fails; failures
    /// are logged, never propagated.
    pub async fn update(&self, id: &str, payload: &P) -> bool {
        let outcome: Result<bool> = async {
            self.bootstrap().await?;
            if self.index.get(&self.collection, id).await?.is_none() {
                return Ok(false);
            }
            let vector = self.vector_for(payload).await?;
            self.index
                .upsert(&self.collection, id, vector, serde_json::to_value(payload)?)
                .await?;
            Ok(true)
        }
        .await;

        outcome.unwrap_or_else(|e| {
            tracing::error!(collection = %self.collection, id = %id, error = %e, "update failed");
            false
        })
    }

    /// Remove a record. Same failure policy as [`VectorStore::update`].
    pub async fn delete(&self, id: &str) -> bool {
        let outcome: Result<bool> = async {
            self.bootstrap().await?;
            self.index.delete(&self.collection, id).await
        }
        .await;

        outcome.unwrap_or_else(|e| {
            tracing::error!(collection = %self.collection, id = %id, error = %e, "delete failed");
            false
        })
    }
}

fn check_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::Config("search limit must be at least 1".into()));
    }
    Ok(())
}
