//! Persistence subsystem: the SQLite-backed bid store.

pub mod store;

pub use store::{BidStore, PersistError};
