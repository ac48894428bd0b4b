//! `retrieve_icp`: the ideal-customer criteria profile from a TOML file.

use std::path::{Path, PathBuf};

use lg_domain::error::{Error, Result};
use lg_domain::CriteriaProfile;
use serde_json::Value;

use crate::registry::Tool;

/// Parse a criteria profile file. List keys may be TOML arrays or
/// semicolon-separated strings.
pub async fn load_profile(path: &Path) -> Result<CriteriaProfile> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::Config(format!("reading profile {}: {e}", path.display()))
    })?;
    toml::from_str(&raw)
        .map_err(|e| Error::Config(format!("parsing profile {}: {e}", path.display())))
}

pub struct RetrieveIcpTool {
    path: PathBuf,
}

impl RetrieveIcpTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Tool for RetrieveIcpTool {
    fn name(&self) -> &str {
        "retrieve_icp"
    }

    fn description(&self) -> &str {
        "Retrieves the Ideal Customer Profile (ICP): allowed and blocked industries, \
         employee count range, regions, required technologies and buyer personas."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, _arguments: &Value) -> Result<String> {
        let profile = load_profile(&self.path).await?;
        Ok(serde_json::to_string_pretty(&profile)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_profile_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icp.toml");
        std::fs::write(
            &path,
            r#"
industries_allowed = "SaaS; Fintech"
industries_blocked = ["Gambling"]
employee_min = 50
employee_max = 5000
"#,
        )
        .unwrap();

        let out = RetrieveIcpTool::new(&path).invoke(&serde_json::json!({})).await.unwrap();
        let profile: CriteriaProfile = serde_json::from_str(&out).unwrap();
        assert_eq!(profile.industries_allowed, vec!["SaaS", "Fintech"]);
        assert_eq!(profile.employee_max, Some(5000));
    }

    #[tokio::test]
    async fn missing_file_is_config_error() {
        let err = load_profile(Path::new("/nonexistent/icp.toml")).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
