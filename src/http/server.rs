//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (tracing, timeout)
//! - Inject the fetcher, the store and the budget table into the handler
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - `TimeoutLayer` at the inbound request budget is an outer guard only;
//!   the handler's own budget hierarchy is authoritative. Both sides answer
//!   408 on expiry, so the race between them is invisible on the wire.

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::http::relay::{cotacao_handler, AppState};
use crate::persistence::BidStore;
use crate::upstream::UpstreamFetcher;

/// HTTP server for the quote relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new server from a validated configuration and a connected
    /// store.
    pub fn new(config: RelayConfig, store: BidStore) -> Self {
        let state = AppState {
            fetcher: Arc::new(UpstreamFetcher::new(&config.upstream.url)),
            store,
            budgets: config.budgets.clone(),
        };

        let router = Router::new()
            .route("/cotacao", get(cotacao_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(config.budgets.request()))
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_with_shutdown(listener, shutdown_signal()).await
    }

    /// Run the server until `signal` resolves. Tests inject their own
    /// shutdown future here.
    pub async fn run_with_shutdown(
        self,
        listener: TcpListener,
        signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Quote relay listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!("Quote relay stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
