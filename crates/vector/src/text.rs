//! Text rendering of records before embedding.

use lg_domain::Lead;

/// A record that can be turned into the text its vector is computed from.
pub trait Embeddable {
    fn embedding_text(&self) -> String;
}

/// Contacts beyond this count do not contribute to the embedding.
const MAX_EMBEDDED_CONTACTS: usize = 3;

impl Embeddable for Lead {
    fn embedding_text(&self) -> String {
        let mut parts = vec![
            format!("Company: {}", self.company),
            format!("Industry: {}", self.industry),
            format!("Employees: {}", self.employee_count),
            format!("Revenue: ${}M USD", self.revenue_musd),
        ];

        if let Some(ref website) = self.website {
            parts.push(format!("Website: {website}"));
        }
        if let Some(profit) = self.last_year_profit {
            parts.push(format!("Last Year Profit: ${profit}M USD"));
        }
        if let Some(ebitda) = self.last_quarter_ebitda {
            parts.push(format!("Last Quarter EBITDA: ${ebitda}M USD"));
        }
        if let Some(variation) = self.stock_variation_3m {
            parts.push(format!("3-Month Stock Variation: {variation}%"));
        }
        if !self.contacts.is_empty() {
            let contacts: Vec<String> = self
                .contacts
                .iter()
                .take(MAX_EMBEDDED_CONTACTS)
                .map(|c| format!("{} ({})", c.name, c.position))
                .collect();
            parts.push(format!("Key Contacts: {}", contacts.join("; ")));
        }

        parts.join(" | ")
    }
}
