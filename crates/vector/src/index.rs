//! Collection-oriented vector index abstraction and the exact in-memory
//! backend.

use std::collections::HashMap;

use lg_domain::config::Distance;
use lg_domain::error::{Error, Result};
use parking_lot::RwLock;
use serde_json::Value;

use crate::embed::cosine_similarity;

/// Exact-match payload filter: every `(key, value)` pair must equal the
/// payload's top-level field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub must: Vec<(String, Value)>,
}

impl Filter {
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            must: vec![(key.into(), value.into())],
        }
    }

    pub fn and(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.must.push((key.into(), value.into()));
        self
    }

    pub fn matches(&self, payload: &Value) -> bool {
        self.must
            .iter()
            .all(|(k, v)| payload.get(k).is_some_and(|p| p == v))
    }
}

/// A raw search result. Higher `score` means more similar regardless of
/// the distance function.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub id: String,
    pub score: f32,
    pub payload: Value,
}

#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection if missing. Returns `true` when this call
    /// created it; an existing collection is not an error.
    async fn ensure_collection(&self, name: &str, dimension: usize, distance: Distance)
        -> Result<bool>;

    /// Insert or replace a point.
    async fn upsert(&self, collection: &str, id: &str, vector: Vec<f32>, payload: Value)
        -> Result<()>;

    /// Nearest neighbours, most similar first.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<IndexHit>>;

    /// Payload of a point, if present.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Remove a point. Returns `false` when it did not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Point {
    id: String,
    vector: Vec<f32>,
    payload: Value,
}

struct Collection {
    dimension: usize,
    distance: Distance,
    // Insertion order; replaced points keep their slot.
    points: Vec<Point>,
}

impl Collection {
    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.distance {
            Distance::Cosine => cosine_similarity(a, b),
            Distance::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
            Distance::Euclid => {
                let d: f32 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f32>().sqrt();
                1.0 / (1.0 + d)
            }
        }
    }
}

/// Exact brute-force index. Ties keep insertion order.
#[derive(Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points in a collection (0 when it does not exist).
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, |c| c.points.len())
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

fn missing(collection: &str) -> Error {
    Error::VectorStore(format!("collection '{collection}' does not exist"))
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryIndex {
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<bool> {
        let mut cols = self.collections.write();
        if cols.contains_key(name) {
            return Ok(false);
        }
        cols.insert(
            name.to_owned(),
            Collection {
                dimension,
                distance,
                points: Vec::new(),
            },
        );
        Ok(true)
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: Vec<f32>,
        payload: Value,
    ) -> Result<()> {
        let mut cols = self.collections.write();
        let col = cols.get_mut(collection).ok_or_else(|| missing(collection))?;
        if vector.len() != col.dimension {
            return Err(Error::VectorStore(format!(
                "vector has {} dimensions, collection '{collection}' expects {}",
                vector.len(),
                col.dimension
            )));
        }
        match col.points.iter_mut().find(|p| p.id == id) {
            Some(point) => {
                point.vector = vector;
                point.payload = payload;
            }
            None => col.points.push(Point {
                id: id.to_owned(),
                vector,
                payload,
            }),
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<IndexHit>> {
        let cols = self.collections.read();
        let col = cols.get(collection).ok_or_else(|| missing(collection))?;

        let mut hits: Vec<IndexHit> = col
            .points
            .iter()
            .filter(|p| filter.map_or(true, |f| f.matches(&p.payload)))
            .map(|p| IndexHit {
                id: p.id.clone(),
                score: col.score(vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let cols = self.collections.read();
        let col = cols.get(collection).ok_or_else(|| missing(collection))?;
        Ok(col
            .points
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.payload.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut cols = self.collections.write();
        let col = cols.get_mut(collection).ok_or_else(|| missing(collection))?;
        let before = col.points.len();
        col.points.retain(|p| p.id != id);
        Ok(col.points.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn index_with(points: &[(&str, [f32; 2], Value)]) -> InMemoryIndex {
        let idx = InMemoryIndex::new();
        idx.ensure_collection("c", 2, Distance::Cosine).await.unwrap();
        for (id, v, p) in points {
            idx.upsert("c", id, v.to_vec(), p.clone()).await.unwrap();
        }
        idx
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let idx = InMemoryIndex::new();
        assert!(idx.ensure_collection("c", 4, Distance::Dot).await.unwrap());
        assert!(!idx.ensure_collection("c", 4, Distance::Dot).await.unwrap());
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let idx = index_with(&[
            ("first", [1.0, 0.0], json!({})),
            ("second", [1.0, 0.0], json!({})),
            ("far", [0.0, 1.0], json!({})),
        ])
        .await;
        let hits = idx.search("c", &[1.0, 0.0], 3, None).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "far"]);
    }

    #[tokio::test]
    async fn filter_restricts_results() {
        let idx = index_with(&[
            ("a", [1.0, 0.0], json!({"user_id": "u1"})),
            ("b", [1.0, 0.0], json!({"user_id": "u2"})),
        ])
        .await;
        let f = Filter::eq("user_id", "u2");
        let hits = idx.search("c", &[1.0, 0.0], 10, Some(&f)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[tokio::test]
    async fn upsert_replaces_in_place() {
        let idx = index_with(&[("a", [1.0, 0.0], json!({"v": 1}))]).await;
        idx.upsert("c", "a", vec![0.0, 1.0], json!({"v": 2})).await.unwrap();
        assert_eq!(idx.len("c"), 1);
        assert_eq!(idx.get("c", "a").await.unwrap(), Some(json!({"v": 2})));
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let idx = index_with(&[]).await;
        let err = idx.upsert("c", "a", vec![1.0; 3], json!({})).await.unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let idx = index_with(&[("a", [1.0, 0.0], json!({}))]).await;
        assert!(idx.delete("c", "a").await.unwrap());
        assert!(!idx.delete("c", "a").await.unwrap());
        assert!(idx.is_empty("c"));
    }

    #[tokio::test]
    async fn euclid_scores_closer_points_higher() {
        let idx = InMemoryIndex::new();
        idx.ensure_collection("e", 2, Distance::Euclid).await.unwrap();
        idx.upsert("e", "near", vec![1.0, 1.0], json!({})).await.unwrap();
        idx.upsert("e", "far", vec![9.0, 9.0], json!({})).await.unwrap();
        let hits = idx.search("e", &[0.0, 0.0], 2, None).await.unwrap();
        assert_eq!(hits[0].id, "near");
    }
}
