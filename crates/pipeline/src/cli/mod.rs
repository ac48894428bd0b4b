pub mod chat;
pub mod config;
pub mod leads;
pub mod run;
pub mod sessions;

use clap::{Parser, Subcommand};

/// leadgraph: conversational lead discovery, screening and enrichment.
#[derive(Debug, Parser)]
#[command(name = "leadgraph", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive chat (default when no subcommand is given).
    Chat {
        /// Resume an existing session instead of starting a new one.
        #[arg(long)]
        session: Option<String>,
    },
    /// Send a single message and print the reply.
    Run {
        /// The message to send.
        message: String,
        /// Session to continue (a new one is created when omitted).
        #[arg(long)]
        session: Option<String>,
        /// Print the reply as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Inspect persisted sessions.
    #[command(subcommand)]
    Sessions(SessionsCommand),
    /// Query the lead repository.
    #[command(subcommand)]
    Leads(LeadsCommand),
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// List checkpointed sessions, most recent first.
    List,
    /// Print the transcript of one session.
    Show {
        session_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum LeadsCommand {
    /// Semantic search over stored leads.
    Search {
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Remove a stored lead by id.
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `LG_CONFIG` (or `config.toml`).
/// A missing file yields the defaults. Returns the config and the path used.
pub fn load_config() -> anyhow::Result<(lg_domain::config::Config, String)> {
    let config_path = std::env::var("LG_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        lg_domain::config::Config::default()
    };

    Ok((config, config_path))
}
