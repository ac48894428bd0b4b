//! `leadgraph sessions`: inspect checkpointed sessions.

use lg_domain::config::Config;
use lg_domain::tool::Role;
use lg_sessions::scoped;

use crate::bootstrap;
use crate::state::State;

pub async fn list(config: &Config) -> anyhow::Result<()> {
    let store = bootstrap::checkpoint_store(config);
    let checkpoints = scoped(store, |s| async move { s.list().await }).await?;

    if checkpoints.is_empty() {
        println!("No sessions.");
        return Ok(());
    }
    for cp in checkpoints {
        let status = match &cp.next {
            Some(node) => format!("pending at {node}"),
            None => "idle".to_owned(),
        };
        println!(
            "{}  {}  steps={}  {status}",
            cp.session_id,
            cp.updated_at.format("%Y-%m-%d %H:%M:%S"),
            cp.step
        );
    }
    Ok(())
}

pub async fn show(config: &Config, session_id: &str) -> anyhow::Result<()> {
    let store = bootstrap::checkpoint_store(config);
    let checkpoint = scoped(store, |s| async move { s.get(session_id).await })
        .await?
        .ok_or_else(|| anyhow::anyhow!("no session '{session_id}'"))?;
    let state: State = serde_json::from_value(checkpoint.state)
        .map_err(|e| anyhow::anyhow!("decoding session state: {e}"))?;

    for msg in &state.transcript {
        let who = match msg.role {
            Role::System => continue,
            Role::User => "you",
            Role::Assistant if msg.has_tool_calls() => {
                let names: Vec<&str> = msg.tool_calls.iter().map(|c| c.tool_name.as_str()).collect();
                println!("\x1b[2m[tools: {}]\x1b[0m", names.join(", "));
                continue;
            }
            Role::Assistant => "assistant",
            Role::Tool => {
                println!("\x1b[2m[tool result, {} chars]\x1b[0m", msg.content.len());
                continue;
            }
        };
        println!("{who}> {}", msg.content);
    }
    println!(
        "\n{} lead(s), {} qualified",
        state.leads.len(),
        state.filtered_leads.len()
    );
    Ok(())
}
