//! Bounded-latency USD-BRL quote relay.
//!
//! # Architecture Overview
//!
//! ```text
//! cotacao-client --(own 300ms budget)--> GET /cotacao
//!
//!     relay handler (per-request budget, 300ms)
//!         |-- fetch sub-budget (200ms) --> upstream price source
//!         |-- persist sub-budget (10ms) --> SQLite `bids` table
//!         '-> 200 + quote | 400 | 408
//!
//! cotacao-client --> cotacao.txt ("Dolar: <bid>")
//! ```
//!
//! Every hop that can block is bound to a deadline budget derived from its
//! caller's budget, so no single slow dependency can hang the chain. The
//! persistence window is deliberately a fraction of the fetch window, and a
//! failed or late write never costs the client its response.

pub mod budget;
pub mod client;
pub mod config;
pub mod http;
pub mod persistence;
pub mod upstream;

pub use budget::Budget;
pub use config::RelayConfig;
pub use http::HttpServer;
