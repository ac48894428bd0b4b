use lg_domain::error::Result;
use lg_domain::{CriteriaProfile, Lead};
use lg_graph::Node;

use crate::state::{State, StatePatch};

/// Qualification rules applied to one lead.
///
/// `blocked` is matched case-insensitively in addition to the profile's own
/// block list.
pub fn qualifies(lead: &Lead, profile: Option<&CriteriaProfile>, blocked: &[String]) -> bool {
    if lead.revenue_musd.is_nan() || lead.revenue_musd < 0.0 {
        return false;
    }
    let industry = lead.industry.trim();
    if blocked.iter().any(|b| b.trim().eq_ignore_ascii_case(industry)) {
        return false;
    }
    match profile {
        Some(p) => p.industry_allowed(industry) && p.employees_in_range(lead.employee_count),
        None => true,
    }
}

/// Deterministic lead qualification.
pub struct ScreenerNode {
    blocked_industries: Vec<String>,
}

impl ScreenerNode {
    pub fn new(blocked_industries: Vec<String>) -> Self {
        Self { blocked_industries }
    }
}

#[async_trait::async_trait]
impl Node<State> for ScreenerNode {
    async fn run(&self, state: &State) -> Result<StatePatch> {
        let profile = state.criteria_profile.as_ref();
        let filtered: Vec<Lead> = state
            .leads
            .iter()
            .filter(|l| qualifies(l, profile, &self.blocked_industries))
            .cloned()
            .collect();

        let names: Vec<&str> = filtered.iter().map(|l| l.company.as_str()).collect();
        tracing::info!(
            total = state.leads.len(),
            qualified = filtered.len(),
            "leads screened"
        );
        let summary = format!(
            "Filtered to {} qualified leads: {}",
            filtered.len(),
            names.join(", ")
        );

        Ok(StatePatch {
            filtered_leads: Some(filtered),
            ..StatePatch::say(summary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_graph::GraphState;

    fn blocked() -> Vec<String> {
        vec!["logistics".into()]
    }

    #[test]
    fn default_block_list_is_case_insensitive() {
        assert!(!qualifies(&Lead::new("Haul Co", "Logistics", 10, 1.0), None, &blocked()));
        assert!(qualifies(&Lead::new("Acme", "tech", 10, 1.0), None, &blocked()));
    }

    #[test]
    fn profile_narrows_industries_and_size() {
        let profile = CriteriaProfile {
            industries_allowed: vec!["SaaS".into()],
            employee_min: Some(50),
            ..Default::default()
        };
        let p = Some(&profile);
        assert!(qualifies(&Lead::new("A", "saas", 60, 1.0), p, &blocked()));
        assert!(!qualifies(&Lead::new("B", "saas", 10, 1.0), p, &blocked()));
        assert!(!qualifies(&Lead::new("C", "retail", 60, 1.0), p, &blocked()));
    }

    #[test]
    fn negative_or_nan_revenue_is_rejected() {
        assert!(!qualifies(&Lead::new("A", "tech", 1, -1.0), None, &[]));
        assert!(!qualifies(&Lead::new("A", "tech", 1, f64::NAN), None, &[]));
    }

    #[tokio::test]
    async fn reports_qualified_companies() {
        let mut state = State::default();
        state.merge(StatePatch {
            leads: Some(vec![
                Lead::new("Acme", "tech", 50, 2.0),
                Lead::new("Truckers", "logistics", 500, 9.0),
                Lead::new("Globex", "energy", 900, 40.0),
            ]),
            ..Default::default()
        });

        let patch = ScreenerNode::new(blocked()).run(&state).await.unwrap();
        let filtered = patch.filtered_leads.unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(
            patch.messages[0].content,
            "Filtered to 2 qualified leads: Acme, Globex"
        );
    }
}
