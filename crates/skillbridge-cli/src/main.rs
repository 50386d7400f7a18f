mod config;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use config::AppConfig;
use skillbridge_agent::{LlmClient, Orchestrator};
use skillbridge_core::CancellationToken;
use skillbridge_gateway::{AppState, BackendClient, GatewayServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "skillbridge",
    about = "Answer questions with a remote agent's skills as model tools"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "skillbridge.toml")]
    config: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask one question and print the answer
    Ask {
        /// The question for the orchestrating model
        question: String,
    },
    /// Show the tools generated from the remote agent's card
    Card,
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn backend_client(config: &AppConfig) -> anyhow::Result<BackendClient> {
    let client = BackendClient::new(&config.backend.base_url, config.backend_timeout())?
        .with_agent_card_path(config.backend.agent_card_path.clone());
    Ok(client)
}

fn orchestrator(config: &AppConfig) -> anyhow::Result<Orchestrator> {
    let backend = backend_client(config)?;
    let (endpoint, http) = backend.agent_card_endpoint();
    let orchestrator = Orchestrator::new(
        &endpoint,
        http,
        LlmClient::new(config.model.clone()),
        config.orchestrator_config(),
    )?;
    Ok(orchestrator)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Token cancelled by the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = AppConfig::load(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid listen address {host}:{port}"))?;

            let state = AppState::new(
                backend_client(&config)?,
                LlmClient::new(config.model.clone()),
                config.orchestrator_config(),
            )?;
            info!(
                backend = %state.backend.base_url(),
                model = %config.model.model_id,
                "Starting skillbridge"
            );
            GatewayServer::serve(GatewayServer::build(state), addr, shutdown_signal()).await?;
        }
        Commands::Ask { question } => {
            let orchestrator = orchestrator(&config)?;
            let cancel = cancel_on_ctrl_c();
            let result = orchestrator.ask_with_cancel(&question, &cancel).await?;
            println!("{}", result.answer);
        }
        Commands::Card => {
            let orchestrator = orchestrator(&config)?;
            let (card, tools) = orchestrator.inspect(&cancel_on_ctrl_c()).await?;

            println!("{} ({})", card.name, card.url);
            if tools.is_empty() {
                println!("The card declares no skills.");
            } else {
                for descriptor in tools.descriptors() {
                    println!("\n{}", descriptor.name);
                    println!("{}", descriptor.description);
                }
                println!("\nTotal: {} tool(s)", tools.len());
            }
        }
    }

    Ok(())
}
