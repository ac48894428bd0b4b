//! `search_company_info`: web search over a Serper-compatible API.

use std::time::Duration;

use lg_domain::config::{AuthConfig, SearchConfig};
use lg_domain::error::{Error, Result};
use lg_providers::util::{from_reqwest, resolve_api_key, send_with_retry};
use serde_json::Value;

use crate::registry::{query_schema, required_str, Tool};

const NO_RESULTS: &str = "No good search result was found.";

pub struct SearchCompanyInfoTool {
    http: reqwest::Client,
    endpoint: String,
    auth: AuthConfig,
    max_results: usize,
}

impl SearchCompanyInfoTool {
    pub fn from_config(cfg: &SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;
        Ok(Self {
            http,
            endpoint: format!("{}/search", cfg.base_url.trim_end_matches('/')),
            auth: cfg.auth.clone(),
            max_results: cfg.max_results,
        })
    }
}

/// Flatten a search response into the snippets a model can read: the
/// answer box first, then the knowledge graph, then organic results.
pub fn format_results(body: &Value, max_results: usize) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(answer) = body.get("answerBox") {
        if let Some(text) = ["answer", "snippet"]
            .iter()
            .find_map(|k| answer.get(*k).and_then(|v| v.as_str()))
        {
            parts.push(text.to_owned());
        }
    }

    if let Some(kg) = body.get("knowledgeGraph") {
        let title = kg.get("title").and_then(|v| v.as_str());
        let desc = kg.get("description").and_then(|v| v.as_str());
        match (title, desc) {
            (Some(t), Some(d)) => parts.push(format!("{t}: {d}")),
            (None, Some(d)) => parts.push(d.to_owned()),
            _ => {}
        }
        if let Some(attrs) = kg.get("attributes").and_then(|v| v.as_object()) {
            for (k, v) in attrs {
                if let Some(v) = v.as_str() {
                    parts.push(format!("{k}: {v}"));
                }
            }
        }
    }

    if let Some(organic) = body.get("organic").and_then(|v| v.as_array()) {
        parts.extend(
            organic
                .iter()
                .take(max_results)
                .filter_map(|r| r.get("snippet").and_then(|v| v.as_str()))
                .map(String::from),
        );
    }

    if parts.is_empty() {
        NO_RESULTS.to_owned()
    } else {
        parts.join(" ")
    }
}

#[async_trait::async_trait]
impl Tool for SearchCompanyInfoTool {
    fn name(&self) -> &str {
        "search_company_info"
    }

    fn description(&self) -> &str {
        "Search the web for detailed information about a company including recent news, \
         financials, technologies used, partnerships, key contacts and business updates. \
         Use this when you need more context about a lead company."
    }

    fn parameters(&self) -> Value {
        query_schema("Search query, e.g. 'Acme Corp annual revenue 2024'")
    }

    async fn invoke(&self, arguments: &Value) -> Result<String> {
        let query = required_str(self.name(), arguments, "query")?;
        let key = resolve_api_key(&self.auth)?;
        let header = self.auth.header.clone().unwrap_or_else(|| "X-API-KEY".into());
        let value = format!("{}{key}", self.auth.prefix.clone().unwrap_or_default());
        let body = serde_json::json!({ "q": query, "num": self.max_results });

        let resp = send_with_retry("POST /search", 2, || {
            self.http
                .post(&self.endpoint)
                .header(header.as_str(), value.as_str())
                .json(&body)
        })
        .await?;

        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(Error::ToolInvocation {
                tool: self.name().to_owned(),
                message: format!("search API returned {}: {text}", status.as_u16()),
            });
        }

        let parsed: Value = serde_json::from_str(&text)?;
        tracing::debug!(query = %query, "company search completed");
        Ok(format_results(&parsed, self.max_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_box_comes_first() {
        let body = json!({
            "answerBox": { "answer": "$1.2B" },
            "organic": [
                { "snippet": "Acme reported strong growth." },
                { "snippet": "Acme hires new CFO." }
            ]
        });
        assert_eq!(
            format_results(&body, 5),
            "$1.2B Acme reported strong growth. Acme hires new CFO."
        );
    }

    #[test]
    fn organic_results_are_capped() {
        let body = json!({
            "organic": [{ "snippet": "a" }, { "snippet": "b" }, { "snippet": "c" }]
        });
        assert_eq!(format_results(&body, 2), "a b");
    }

    #[test]
    fn knowledge_graph_includes_attributes() {
        let body = json!({
            "knowledgeGraph": {
                "title": "Globex",
                "description": "Energy company",
                "attributes": { "CEO": "Hank Scorpio" }
            }
        });
        let text = format_results(&body, 5);
        assert!(text.starts_with("Globex: Energy company"));
        assert!(text.contains("CEO: Hank Scorpio"));
    }

    #[test]
    fn empty_response_has_fallback_text() {
        assert_eq!(format_results(&json!({}), 5), NO_RESULTS);
    }

    #[tokio::test]
    async fn missing_key_is_an_error() {
        let cfg = SearchConfig {
            auth: AuthConfig::from_env("LG_TEST_SERPER_KEY_UNSET_9191"),
            ..Default::default()
        };
        let tool = SearchCompanyInfoTool::from_config(&cfg).unwrap();
        let err = tool.invoke(&json!({"query": "Acme"})).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
