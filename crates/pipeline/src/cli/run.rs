//! `leadgraph run`: one-shot execution.
//!
//! Sends a single message through the pipeline, prints the reply and exits.
//! Intermediate progress goes to stderr so stdout stays scriptable.

use lg_domain::config::Config;
use lg_sessions::scoped;

use crate::bootstrap;
use crate::service::ChatReply;

pub async fn run(
    config: &Config,
    message: String,
    session: Option<String>,
    json_output: bool,
) -> anyhow::Result<()> {
    let runtime = bootstrap::build_runtime(config).await?;

    let outcome = scoped(runtime.checkpoints.clone(), |_| async {
        Ok(runtime.service.chat(&message, session.as_deref()).await)
    })
    .await;
    runtime.shutdown().await;
    let reply = outcome?;

    if json_output {
        let json = serde_json::to_string_pretty(&reply)
            .map_err(|e| anyhow::anyhow!("serializing reply: {e}"))?;
        println!("{json}");
    } else {
        print_reply(&reply);
    }
    Ok(())
}

/// Progress dimmed on stderr, the response on stdout.
pub(crate) fn print_reply(reply: &ChatReply) {
    for line in &reply.progress {
        eprintln!("\x1b[2m{line}\x1b[0m");
    }
    println!("{}", reply.response);
    eprintln!("\x1b[2m[session: {}]\x1b[0m", reply.session_id);
}
