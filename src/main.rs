use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cotacao_relay::config::{load_config, RelayConfig};
use cotacao_relay::http::HttpServer;
use cotacao_relay::persistence::BidStore;

#[derive(Parser)]
#[command(name = "cotacao-relay")]
#[command(about = "Bounded-latency USD-BRL quote relay", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cotacao_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_url = %config.upstream.url,
        request_budget_ms = config.budgets.request_ms,
        upstream_budget_ms = config.budgets.upstream_ms,
        persistence_budget_ms = config.budgets.persistence_ms,
        "Configuration loaded"
    );

    let store = BidStore::connect(&config.persistence.database_url).await?;
    store.init_schema().await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = HttpServer::new(config, store);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
