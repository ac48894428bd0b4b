//! `leadgraph leads`: query the lead repository directly.

use lg_domain::config::Config;

use crate::bootstrap;

pub async fn search(config: &Config, query: &str, limit: usize) -> anyhow::Result<()> {
    let leads = bootstrap::lead_store(config)?;
    let hits = leads.search_text(query, limit, None).await?;

    if hits.is_empty() {
        println!("No matching leads.");
        return Ok(());
    }
    for hit in hits {
        let lead = &hit.payload;
        println!(
            "{:.3}  {}  {} ({}, {} employees, ${}M revenue)",
            hit.score, hit.id, lead.company, lead.industry, lead.employee_count, lead.revenue_musd
        );
        if let Some(site) = &lead.website {
            println!("       {site}");
        }
    }
    Ok(())
}

pub async fn delete(config: &Config, id: &str) -> anyhow::Result<()> {
    let leads = bootstrap::lead_store(config)?;
    if leads.delete(id).await {
        println!("Deleted {id}");
        Ok(())
    } else {
        anyhow::bail!("no lead with id '{id}'")
    }
}
