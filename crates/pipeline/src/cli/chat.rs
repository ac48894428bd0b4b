//! `leadgraph chat`: interactive REPL.
//!
//! A readline loop that sends each line through the pipeline. The session
//! id is kept across turns so the conversation and its leads accumulate.

use lg_domain::config::Config;
use lg_sessions::scoped;

use crate::bootstrap::{self, Runtime};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(config: &Config, session: Option<String>) -> anyhow::Result<()> {
    let runtime = bootstrap::build_runtime(config).await?;

    let outcome = scoped(runtime.checkpoints.clone(), |_| repl(&runtime, session)).await;
    runtime.shutdown().await;
    Ok(outcome?)
}

async fn repl(runtime: &Runtime, mut session: Option<String>) -> lg_domain::Result<()> {
    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".leadgraph")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()
        .map_err(|e| lg_domain::Error::Other(format!("readline: {e}")))?;
    let _ = rl.load_history(&history_path);

    eprintln!("leadgraph interactive chat");
    eprintln!(
        "Session: {}  |  Type /help for commands, Ctrl+D to exit",
        session.as_deref().unwrap_or("(new)")
    );
    eprintln!();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    if handle_slash_command(trimmed, &mut session) {
                        break;
                    }
                    continue;
                }

                let reply = runtime.service.chat(trimmed, session.as_deref()).await;
                for line in &reply.progress {
                    eprintln!("\x1b[2m{line}\x1b[0m");
                }
                println!("{}\n", reply.response);
                session = Some(reply.session_id);
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process a slash command. Returns `true` if the REPL should exit.
fn handle_slash_command(input: &str, session: &mut Option<String>) -> bool {
    let (cmd, arg) = match input.split_once(' ') {
        Some((c, a)) => (c, Some(a.trim())),
        None => (input, None),
    };

    match cmd {
        "/exit" | "/quit" => return true,

        "/session" => match arg.filter(|s| !s.is_empty()) {
            Some(id) => {
                *session = Some(id.to_owned());
                eprintln!("Session switched to: {id}");
            }
            None => {
                eprintln!(
                    "Current session: {}",
                    session.as_deref().unwrap_or("(new)")
                );
                eprintln!("Usage: /session <id>");
            }
        },

        "/reset" => {
            *session = None;
            eprintln!("Session reset. The next message starts a new session.");
        }

        "/clear" => eprint!("\x1B[2J\x1B[1;1H"),

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /session <id>    Switch to an existing session");
            eprintln!("  /reset           Start a fresh session");
            eprintln!("  /clear           Clear the screen");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }

        other => eprintln!("Unknown command: {other}  (type /help for a list)"),
    }

    false
}
