use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig as _;

use lg_domain::config::ObservabilityConfig;
use lg_pipeline::cli::{self, Cli, Command, ConfigCommand, LeadsCommand, SessionsCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command {
        // Default to chat when no subcommand is given.
        None => {
            let (config, _) = cli::load_config()?;
            let provider = init_tracing(&config.observability);
            let outcome = cli::chat::chat(&config, None).await;
            shutdown_tracing(provider);
            outcome
        }
        Some(Command::Chat { session }) => {
            let (config, _) = cli::load_config()?;
            let provider = init_tracing(&config.observability);
            let outcome = cli::chat::chat(&config, session).await;
            shutdown_tracing(provider);
            outcome
        }
        Some(Command::Run {
            message,
            session,
            json,
        }) => {
            let (config, _) = cli::load_config()?;
            let provider = init_tracing(&config.observability);
            let outcome = cli::run::run(&config, message, session, json).await;
            shutdown_tracing(provider);
            outcome
        }
        Some(Command::Sessions(SessionsCommand::List)) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            cli::sessions::list(&config).await
        }
        Some(Command::Sessions(SessionsCommand::Show { session_id })) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            cli::sessions::show(&config, &session_id).await
        }
        Some(Command::Leads(LeadsCommand::Search { query, limit })) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            cli::leads::search(&config, &query, limit).await
        }
        Some(Command::Leads(LeadsCommand::Delete { id })) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            cli::leads::delete(&config, &id).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = cli::load_config()?;
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _) = cli::load_config()?;
            cli::config::show(&config)
        }
    }
}

/// Tracing for commands that run the pipeline.
///
/// Logs go to stderr, as JSON lines when `json_logs` is set. When
/// `otlp_endpoint` is configured, spans are also exported via OTLP/gRPC;
/// the returned provider must be shut down on exit to flush them.
fn init_tracing(obs: &ObservabilityConfig) -> Option<opentelemetry_sdk::trace::SdkTracerProvider> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(obs.default_filter()));

    let json_layer = obs.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let compact_layer = (!obs.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
    });

    let tracer_provider = obs.otlp_endpoint.as_deref().and_then(|endpoint| {
        let exporter = match opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
        {
            Ok(e) => e,
            Err(e) => {
                eprintln!(
                    "WARNING: failed to create OTLP exporter for {endpoint}: {e}; \
                     continuing without OpenTelemetry"
                );
                return None;
            }
        };
        let resource = opentelemetry_sdk::Resource::builder()
            .with_service_name(obs.service_name.clone())
            .build();
        Some(
            opentelemetry_sdk::trace::SdkTracerProvider::builder()
                .with_batch_exporter(exporter)
                .with_sampler(opentelemetry_sdk::trace::Sampler::TraceIdRatioBased(
                    obs.sample_rate,
                ))
                .with_resource(resource)
                .build(),
        )
    });
    let otel_layer = tracer_provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("leadgraph")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(compact_layer)
        .with(otel_layer)
        .init();

    tracer_provider
}

fn shutdown_tracing(provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>) {
    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = ?e, "OpenTelemetry tracer provider shutdown failed");
        }
    }
}

/// Compact stderr-only tracing for the inspection commands.
///
/// Defaults to `warn` so diagnostics do not pollute stdout.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
