//! Qdrant REST backend for [`VectorIndex`].
//!
//! Every call goes through [`QdrantIndex::execute_with_retry`], which retries
//! 5xx responses and transport failures with exponential back-off and emits a
//! `TraceEvent::VectorStoreCall` per attempt.

use std::time::{Duration, Instant};

use lg_domain::config::{Distance, VectorConfig};
use lg_domain::error::{Error, Result};
use lg_domain::trace::TraceEvent;
use lg_providers::util::from_reqwest;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use crate::index::{Filter, IndexHit, VectorIndex};

#[derive(Debug, Clone)]
pub struct QdrantIndex {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl QdrantIndex {
    pub fn new(cfg: &VectorConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        let api_key = match cfg.api_key_env {
            Some(ref var) => match std::env::var(var) {
                Ok(key) => Some(key),
                Err(_) => {
                    return Err(Error::Auth(format!(
                        "environment variable '{var}' not set for vector.api_key_env"
                    )))
                }
            },
            None => None,
        };

        Ok(Self {
            http,
            base_url: cfg.url.trim_end_matches('/').to_owned(),
            api_key,
            max_retries: cfg.max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        match self.api_key {
            Some(ref key) => rb.header("api-key", key),
            None => rb,
        }
    }

    /// Execute a request with retry + exponential back-off.
    ///
    /// * 5xx and transport errors are retried.
    /// * Statuses listed in `tolerated` are handed back to the caller.
    /// * Any other 4xx is permanent and becomes an error immediately.
    async fn execute_with_retry(
        &self,
        collection: &str,
        operation: &str,
        tolerated: &[StatusCode],
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let result = self.decorate(build_request()).send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    TraceEvent::VectorStoreCall {
                        collection: collection.to_owned(),
                        operation: operation.to_owned(),
                        status: status.as_u16(),
                        duration_ms,
                    }
                    .emit();

                    if status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_err = Some(Error::VectorStore(format!(
                            "{operation} returned {}: {body}",
                            status.as_u16()
                        )));
                        continue;
                    }

                    if status.is_client_error() && !tolerated.contains(&status) {
                        let body = resp.text().await.unwrap_or_default();
                        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                            return Err(Error::Auth(format!(
                                "{operation} auth failed ({}): {body}",
                                status.as_u16()
                            )));
                        }
                        return Err(Error::VectorStore(format!(
                            "{operation} returned {}: {body}",
                            status.as_u16()
                        )));
                    }

                    return Ok(resp);
                }
                Err(e) => {
                    TraceEvent::VectorStoreCall {
                        collection: collection.to_owned(),
                        operation: operation.to_owned(),
                        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                        duration_ms,
                    }
                    .emit();
                    last_err = Some(from_reqwest(e));
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| Error::VectorStore(format!("{operation}: all retries exhausted"))))
    }

    async fn json_body(resp: Response) -> Result<Value> {
        let text = resp.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::VectorStore(format!("failed to parse qdrant response: {e}: {text}")))
    }
}

fn filter_to_qdrant(filter: &Filter) -> Value {
    let must: Vec<Value> = filter
        .must
        .iter()
        .map(|(key, value)| json!({ "key": key, "match": { "value": value } }))
        .collect();
    json!({ "must": must })
}

fn point_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The JSON form of a point id. Qdrant only knows unsigned integers and
/// UUIDs; anything else cannot name a stored point.
fn point_key(id: &str) -> Option<Value> {
    if let Ok(n) = id.parse::<u64>() {
        return Some(json!(n));
    }
    uuid::Uuid::parse_str(id).ok().map(|u| json!(u.to_string()))
}

fn parse_hits(body: &Value) -> Vec<IndexHit> {
    body.get("result")
        .and_then(|r| r.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|p| {
                    Some(IndexHit {
                        id: point_id(p.get("id")?)?,
                        score: p.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0) as f32,
                        payload: p.get("payload").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<bool> {
        let url = self.url(&format!("/collections/{name}"));

        let existing = self
            .execute_with_retry(name, "GET collection", &[StatusCode::NOT_FOUND], || {
                self.http.get(&url)
            })
            .await?;
        if existing.status().is_success() {
            return Ok(false);
        }

        let body = json!({ "vectors": { "size": dimension, "distance": distance.as_str() } });
        let resp = self
            .execute_with_retry(
                name,
                "PUT collection",
                &[StatusCode::CONFLICT, StatusCode::BAD_REQUEST],
                || self.http.put(&url).json(&body),
            )
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(true);
        }
        // Another process created it between our GET and PUT.
        let text = resp.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT || text.contains("already exists") {
            return Ok(false);
        }
        Err(Error::VectorStore(format!(
            "creating collection '{name}' returned {}: {text}",
            status.as_u16()
        )))
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &str,
        vector: Vec<f32>,
        payload: Value,
    ) -> Result<()> {
        let key = point_key(id).ok_or_else(|| {
            Error::VectorStore(format!("'{id}' is not a valid point id (uuid or integer)"))
        })?;
        let url = self.url(&format!("/collections/{collection}/points?wait=true"));
        let body = json!({ "points": [{ "id": key, "vector": vector, "payload": payload }] });
        self.execute_with_retry(collection, "PUT points", &[], || {
            self.http.put(&url).json(&body)
        })
        .await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<IndexHit>> {
        let url = self.url(&format!("/collections/{collection}/points/search"));
        let mut body = json!({ "vector": vector, "limit": limit, "with_payload": true });
        if let Some(f) = filter {
            body["filter"] = filter_to_qdrant(f);
        }
        let resp = self
            .execute_with_retry(collection, "POST search", &[], || {
                self.http.post(&url).json(&body)
            })
            .await?;
        Ok(parse_hits(&Self::json_body(resp).await?))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let Some(key) = point_key(id) else {
            return Ok(None);
        };
        let url = self.url(&format!("/collections/{collection}/points"));
        let body = json!({ "ids": [key], "with_payload": true });
        let resp = self
            .execute_with_retry(
                collection,
                "POST points",
                &[StatusCode::NOT_FOUND, StatusCode::BAD_REQUEST],
                || self.http.post(&url).json(&body),
            )
            .await?;
        // 400 is how Qdrant answers a lookup it cannot match to a point.
        if matches!(resp.status(), StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST) {
            return Ok(None);
        }
        let hits = parse_hits(&Self::json_body(resp).await?);
        Ok(hits.into_iter().find(|h| h.id == id).map(|h| h.payload))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        if self.get(collection, id).await?.is_none() {
            return Ok(false);
        }
        let url = self.url(&format!("/collections/{collection}/points/delete?wait=true"));
        let body = json!({ "points": [point_key(id)] });
        self.execute_with_retry(collection, "POST delete", &[], || {
            self.http.post(&url).json(&body)
        })
        .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_uses_match_value_clauses() {
        let f = Filter::eq("user_id", "default_user").and("kind", "fact");
        let q = filter_to_qdrant(&f);
        assert_eq!(q["must"][0]["key"], "user_id");
        assert_eq!(q["must"][0]["match"]["value"], "default_user");
        assert_eq!(q["must"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn parses_search_results() {
        let body = json!({
            "status": "ok",
            "result": [
                {"id": "7f1c", "score": 0.93, "payload": {"company": "Acme"}},
                {"id": 42, "score": 0.5, "payload": {"company": "Globex"}},
                {"score": 0.1}
            ]
        });
        let hits = parse_hits(&body);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "7f1c");
        assert_eq!(hits[1].id, "42");
        assert_eq!(hits[0].payload["company"], "Acme");
    }

    #[test]
    fn missing_result_is_empty() {
        assert!(parse_hits(&json!({"status": "ok"})).is_empty());
    }

    #[test]
    fn point_keys_are_integers_or_uuids() {
        assert_eq!(point_key("42"), Some(json!(42)));
        let id = uuid::Uuid::new_v4().to_string();
        assert_eq!(point_key(&id), Some(json!(id)));
        assert_eq!(point_key("no-such-id"), None);
        assert_eq!(point_key(""), None);
    }

    #[tokio::test]
    async fn lookups_of_foreign_ids_are_not_found() {
        // Nothing listens here; a request would fail with a transport error.
        let cfg = VectorConfig {
            url: "http://127.0.0.1:9".into(),
            max_retries: 0,
            ..Default::default()
        };
        let index = QdrantIndex::new(&cfg).unwrap();
        assert_eq!(index.get("leads", "no-such-id").await.unwrap(), None);
        assert!(!index.delete("leads", "no-such-id").await.unwrap());
    }

    #[test]
    fn new_requires_declared_api_key_env() {
        let cfg = VectorConfig {
            api_key_env: Some("LG_TEST_QDRANT_KEY_UNSET_4242".into()),
            ..Default::default()
        };
        assert!(matches!(QdrantIndex::new(&cfg), Err(Error::Auth(_))));
    }
}
