use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use quiz_gateway::auth::{AuthService, HttpTokenVerifier};
use quiz_gateway::config::{load_config, GatewayConfig};
use quiz_gateway::dispatch::Dispatcher;
use quiz_gateway::http::HttpServer;
use quiz_gateway::lifecycle::Shutdown;
use quiz_gateway::observability;
use quiz_gateway::quiz::{self, QuizService};
use quiz_gateway::storage::MemoryStore;

#[derive(Debug, Parser)]
#[command(name = "quiz-gateway", about = "Request-dispatch gateway for the quiz API")]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    observability::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        auth_url = %config.auth.url,
        token_ttl_secs = config.auth.token_ttl_secs,
        path_prefixes = ?config.routing.path_prefixes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let quiz_service = Arc::new(QuizService::new(
        Arc::new(MemoryStore::new(["session"])),
        Arc::new(MemoryStore::new(["session", "question_id"])),
        Arc::new(MemoryStore::new(["session", "question_id"])),
    ));
    let auth = AuthService::new(
        Arc::new(HttpTokenVerifier::new(config.auth.url.clone())),
        Duration::from_secs(config.auth.token_ttl_secs),
    );
    let dispatcher = Arc::new(Dispatcher::new(
        quiz::routes(quiz_service),
        config.routing.path_prefixes.clone(),
        auth,
    ));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(config, dispatcher);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
