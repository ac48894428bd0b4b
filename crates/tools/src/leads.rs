//! `search_leads`: semantic search over stored leads.

use std::sync::Arc;

use lg_domain::error::Result;
use lg_domain::Lead;
use lg_vector::VectorStore;
use serde_json::{json, Value};

use crate::registry::{query_schema, required_str, Tool};

pub struct SearchLeadsTool {
    leads: Arc<VectorStore<Lead>>,
    limit: usize,
}

impl SearchLeadsTool {
    pub fn new(leads: Arc<VectorStore<Lead>>, limit: usize) -> Self {
        Self { leads, limit }
    }
}

#[async_trait::async_trait]
impl Tool for SearchLeadsTool {
    fn name(&self) -> &str {
        "search_leads"
    }

    fn description(&self) -> &str {
        "Search stored leads using semantic search. Provide a text query like \
         'Fintech companies' or 'software companies with high revenue'. Returns \
         similar companies."
    }

    fn parameters(&self) -> Value {
        query_schema("Free-text description of the companies to find")
    }

    async fn invoke(&self, arguments: &Value) -> Result<String> {
        let query = required_str(self.name(), arguments, "query")?;

        let body = match self.leads.search_text(&query, self.limit, None).await {
            Ok(hits) if hits.is_empty() => json!({
                "status": "success",
                "message": "No leads found.",
                "results": []
            }),
            Ok(hits) => {
                let results: Vec<&Lead> = hits.iter().map(|h| &h.payload).collect();
                json!({
                    "status": "success",
                    "message": format!("Found {} lead(s).", results.len()),
                    "results": results
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "lead search failed");
                json!({
                    "status": "error",
                    "message": format!("Error searching leads: {e}")
                })
            }
        };

        Ok(serde_json::to_string_pretty(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_domain::config::Distance;
    use lg_vector::{HashingEmbedder, InMemoryIndex};

    fn store() -> Arc<VectorStore<Lead>> {
        Arc::new(VectorStore::new(
            Arc::new(InMemoryIndex::new()),
            Arc::new(HashingEmbedder::new(64)),
            "leads-collection",
            Distance::Cosine,
        ))
    }

    #[tokio::test]
    async fn empty_store_reports_no_leads() {
        let out = SearchLeadsTool::new(store(), 10)
            .invoke(&json!({"query": "fintech"}))
            .await
            .unwrap();
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["message"], "No leads found.");
        assert_eq!(v["results"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn results_are_counted() {
        let leads = store();
        leads.store(&Lead::new("Acme", "SaaS", 120, 15.0)).await.unwrap();
        leads.store(&Lead::new("Globex", "Energy", 900, 80.0)).await.unwrap();

        let out = SearchLeadsTool::new(leads, 10)
            .invoke(&json!({"query": "SaaS companies"}))
            .await
            .unwrap();
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["message"], "Found 2 lead(s).");
    }
}
