//! Ideal-customer criteria used by lead qualification.

use serde::{Deserialize, Deserializer, Serialize};

/// Structured qualification filter. Every field is optional; an unset
/// field does not constrain qualification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteriaProfile {
    #[serde(default, deserialize_with = "list_or_semicolons")]
    pub industries_allowed: Vec<String>,
    #[serde(default, deserialize_with = "list_or_semicolons")]
    pub industries_blocked: Vec<String>,
    #[serde(default)]
    pub employee_min: Option<u64>,
    #[serde(default)]
    pub employee_max: Option<u64>,
    #[serde(default, deserialize_with = "list_or_semicolons")]
    pub regions_allowed: Vec<String>,
    #[serde(default, deserialize_with = "list_or_semicolons")]
    pub regions_blocked: Vec<String>,
    #[serde(default, deserialize_with = "list_or_semicolons")]
    pub technologies_required: Vec<String>,
    #[serde(default, deserialize_with = "list_or_semicolons")]
    pub buyer_personas: Vec<String>,
    #[serde(default, deserialize_with = "list_or_semicolons")]
    pub excluded_personas: Vec<String>,
}

impl CriteriaProfile {
    /// Whether `industry` passes the allow/block lists (case-insensitive).
    pub fn industry_allowed(&self, industry: &str) -> bool {
        let industry = industry.trim();
        if contains_ci(&self.industries_blocked, industry) {
            return false;
        }
        self.industries_allowed.is_empty() || contains_ci(&self.industries_allowed, industry)
    }

    /// Whether `count` falls inside the configured employee range.
    pub fn employees_in_range(&self, count: u64) -> bool {
        self.employee_min.map_or(true, |min| count >= min)
            && self.employee_max.map_or(true, |max| count <= max)
    }
}

/// Split a semicolon-separated string into trimmed, non-empty items.
pub fn parse_semicolon_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn contains_ci(list: &[String], needle: &str) -> bool {
    list.iter().any(|item| item.trim().eq_ignore_ascii_case(needle))
}

/// Accept either a list of strings or one semicolon-separated string.
fn list_or_semicolons<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::List(items)) => items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Raw::Joined(s)) => parse_semicolon_list(&s),
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_list_skips_blanks() {
        assert_eq!(
            parse_semicolon_list(" SaaS ;; Fintech; "),
            vec!["SaaS".to_string(), "Fintech".to_string()]
        );
        assert!(parse_semicolon_list("").is_empty());
    }

    #[test]
    fn deserializes_joined_and_list_forms() {
        let json = r#"{
            "industries_allowed": "SaaS; Fintech",
            "industries_blocked": ["logistics"],
            "employee_min": 10
        }"#;
        let profile: CriteriaProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.industries_allowed, vec!["SaaS", "Fintech"]);
        assert_eq!(profile.industries_blocked, vec!["logistics"]);
        assert_eq!(profile.employee_min, Some(10));
        assert!(profile.regions_allowed.is_empty());
    }

    #[test]
    fn industry_block_wins_over_allow() {
        let profile = CriteriaProfile {
            industries_allowed: vec!["Logistics".into(), "tech".into()],
            industries_blocked: vec!["logistics".into()],
            ..Default::default()
        };
        assert!(!profile.industry_allowed("LOGISTICS"));
        assert!(profile.industry_allowed("Tech"));
        assert!(!profile.industry_allowed("food"));
    }

    #[test]
    fn empty_profile_allows_everything() {
        let profile = CriteriaProfile::default();
        assert!(profile.industry_allowed("anything"));
        assert!(profile.employees_in_range(0));
        assert!(profile.employees_in_range(u64::MAX));
    }

    #[test]
    fn employee_range_is_inclusive() {
        let profile = CriteriaProfile {
            employee_min: Some(50),
            employee_max: Some(900),
            ..Default::default()
        };
        assert!(profile.employees_in_range(50));
        assert!(profile.employees_in_range(900));
        assert!(!profile.employees_in_range(49));
        assert!(!profile.employees_in_range(901));
    }
}
