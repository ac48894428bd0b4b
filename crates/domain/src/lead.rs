//! Lead records produced by discovery and completed by enrichment.

use serde::{Deserialize, Serialize};

/// A person at a lead company. All four fields are mandatory: a contact
/// missing any of them is dropped rather than stored half-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
}

/// A candidate business record.
///
/// Discovery fills the first four fields; enrichment fills the rest.
/// `company` is the identity key used for deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub company: String,
    pub industry: String,
    pub employee_count: u64,
    pub revenue_musd: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_year_profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_quarter_ebitda: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_variation_3m: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<Contact>,
}

impl Lead {
    pub fn new(
        company: impl Into<String>,
        industry: impl Into<String>,
        employee_count: u64,
        revenue_musd: f64,
    ) -> Self {
        Self {
            company: company.into(),
            industry: industry.into(),
            employee_count,
            revenue_musd,
            website: None,
            last_year_profit: None,
            last_quarter_ebitda: None,
            stock_variation_3m: None,
            contacts: Vec::new(),
        }
    }

    /// True while any of the four late scalar fields is unset.
    pub fn needs_enrichment(&self) -> bool {
        self.website.is_none()
            || self.last_year_profit.is_none()
            || self.last_quarter_ebitda.is_none()
            || self.stock_variation_3m.is_none()
    }

    /// Case-insensitive identity comparison on the company name.
    pub fn same_company(&self, other: &str) -> bool {
        self.company.trim().eq_ignore_ascii_case(other.trim())
    }

    /// Parse a lead from loosely-shaped model output.
    ///
    /// Contacts with a missing or blank field are discarded. Returns `None`
    /// when the core fields are absent or `company` is empty.
    pub fn from_loose_json(value: &serde_json::Value) -> Option<Lead> {
        let obj = value.as_object()?;
        let company = obj.get("company")?.as_str()?.trim().to_string();
        if company.is_empty() {
            return None;
        }
        let industry = obj
            .get("industry")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let employee_count = obj
            .get("employee_count")
            .and_then(|v| v.as_f64())
            .filter(|n| *n >= 0.0)
            .map(|n| n as u64)
            .unwrap_or(0);
        let revenue_musd = obj
            .get("revenue_musd")
            .and_then(|v| v.as_f64())
            .filter(|n| *n >= 0.0)
            .unwrap_or(0.0);

        let website = obj
            .get("website")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let contacts = obj
            .get("contacts")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(complete_contact).collect())
            .unwrap_or_default();

        Some(Lead {
            company,
            industry,
            employee_count,
            revenue_musd,
            website,
            last_year_profit: obj.get("last_year_profit").and_then(|v| v.as_f64()),
            last_quarter_ebitda: obj.get("last_quarter_ebitda").and_then(|v| v.as_f64()),
            stock_variation_3m: obj.get("stock_variation_3m").and_then(|v| v.as_f64()),
            contacts,
        })
    }
}

fn complete_contact(value: &serde_json::Value) -> Option<Contact> {
    let field = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };
    Some(Contact {
        name: field("name")?,
        email: field("email")?,
        phone: field("phone")?,
        position: field("position")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_lead_needs_enrichment() {
        let lead = Lead::new("Acme", "tech", 50, 2.0);
        assert!(lead.needs_enrichment());
    }

    #[test]
    fn lead_with_all_late_fields_is_complete() {
        let mut lead = Lead::new("Acme", "tech", 50, 2.0);
        lead.website = Some("https://acme.test".into());
        lead.last_year_profit = Some(0.4);
        lead.last_quarter_ebitda = Some(0.1);
        assert!(lead.needs_enrichment());
        lead.stock_variation_3m = Some(-3.5);
        assert!(!lead.needs_enrichment());
    }

    #[test]
    fn loose_json_drops_partial_contacts() {
        let value = json!({
            "company": "Globex",
            "industry": "food",
            "employee_count": 900,
            "revenue_musd": 40.0,
            "contacts": [
                {"name": "Hank Scorpio", "email": "hank@globex.test", "phone": "+1 555 0100", "position": "CEO"},
                {"name": "No Phone", "email": "np@globex.test", "position": "CFO"},
                {"name": "", "email": "blank@globex.test", "phone": "1", "position": "CTO"}
            ]
        });
        let lead = Lead::from_loose_json(&value).unwrap();
        assert_eq!(lead.contacts.len(), 1);
        assert_eq!(lead.contacts[0].name, "Hank Scorpio");
    }

    #[test]
    fn loose_json_requires_company() {
        assert!(Lead::from_loose_json(&json!({"industry": "tech"})).is_none());
        assert!(Lead::from_loose_json(&json!({"company": "  "})).is_none());
    }

    #[test]
    fn unset_fields_are_not_serialized() {
        let json = serde_json::to_value(Lead::new("Acme", "tech", 50, 2.0)).unwrap();
        assert!(json.get("website").is_none());
        assert!(json.get("contacts").is_none());
    }

    #[test]
    fn same_company_ignores_case_and_whitespace() {
        let lead = Lead::new("Acme", "tech", 50, 2.0);
        assert!(lead.same_company(" acme "));
        assert!(!lead.same_company("Acme Inc"));
    }
}
