use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cotacao_relay::budget::Budget;
use cotacao_relay::client::{CallOutcome, Caller};
use cotacao_relay::config::{load_config, RelayConfig};

#[derive(Parser)]
#[command(name = "cotacao-client")]
#[command(about = "Deadline-bound client for the cotacao quote relay", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Relay endpoint to call. Overrides the config file.
    #[arg(short, long)]
    url: Option<String>,

    /// Call budget in milliseconds. Overrides the config file.
    #[arg(short, long)]
    budget_ms: Option<u64>,

    /// File the labeled bid is written to. Overrides the config file.
    #[arg(short, long)]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cotacao_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config(path)?.client,
        None => RelayConfig::default().client,
    };
    if let Some(url) = cli.url {
        config.server_url = url;
    }
    if let Some(budget_ms) = cli.budget_ms {
        config.budget_ms = budget_ms;
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }

    let budget = Budget::root(config.budget());
    let caller = Caller::new(config);

    match caller.call(&budget).await? {
        CallOutcome::Success { bid } => {
            tracing::info!(bid = %bid, "Quote recorded");
            Ok(())
        }
        outcome => {
            tracing::error!(outcome = ?outcome, "Call failed");
            Err(format!("call failed: {outcome:?}").into())
        }
    }
}
