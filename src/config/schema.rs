//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a minimal (or absent) config file still
//! yields a runnable service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the quote relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream price source.
    pub upstream: UpstreamConfig,

    /// Persistence settings.
    pub persistence: PersistenceConfig,

    /// Deadline budgets for every hop of the pipeline.
    pub budgets: BudgetConfig,

    /// Settings for the client binary.
    pub client: ClientConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream price source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Endpoint returning the USD-BRL quote envelope.
    pub url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "https://economia.awesomeapi.com.br/json/last/USD-BRL".to_string(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// SQLite connection string. The database file is created when missing.
    pub database_url: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://cotacao.db".to_string(),
        }
    }
}

/// Deadline budgets, in milliseconds.
///
/// The upstream and persistence windows are siblings derived from the same
/// per-request budget. Persistence is intentionally far tighter than the
/// fetch: a slow write must never threaten the client-visible latency.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Top-level budget granted to each inbound request.
    pub request_ms: u64,

    /// Sub-budget for the upstream fetch.
    pub upstream_ms: u64,

    /// Sub-budget for the persistence transaction.
    pub persistence_ms: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            request_ms: 300,
            upstream_ms: 200,
            persistence_ms: 10,
        }
    }
}

impl BudgetConfig {
    /// Per-request window.
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    /// Upstream fetch window.
    pub fn upstream(&self) -> Duration {
        Duration::from_millis(self.upstream_ms)
    }

    /// Persistence window.
    pub fn persistence(&self) -> Duration {
        Duration::from_millis(self.persistence_ms)
    }
}

/// Settings for the client binary.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Relay endpoint the client calls.
    pub server_url: String,

    /// The client's own call budget, independent of the server's budgets.
    pub budget_ms: u64,

    /// File the labeled bid is written to on success.
    pub output_path: String,

    /// Label prepended to the bid in the output file.
    pub label: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080/cotacao".to_string(),
            budget_ms: 300,
            output_path: "cotacao.txt".to_string(),
            label: "Dolar: ".to_string(),
        }
    }
}

impl ClientConfig {
    /// Call window.
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }
}
