//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     -> server.rs (Axum setup, timeout + trace layers)
//!     -> relay.rs (per-request coordinator: budget, fetch, persist)
//!     -> HTTP status + JSON body
//! ```

pub mod relay;
pub mod server;

pub use relay::{relay_quote, AppState, RelayOutcome};
pub use server::HttpServer;
