//! Budget-bound quote persistence.
//!
//! # Responsibilities
//! - Own the SQLite pool; no global database handle anywhere
//! - Create the `bids` table idempotently at startup
//! - Insert one row per fetched quote inside a deadline-bound transaction
//!
//! # Design Decisions
//! - The begin-insert-commit sequence runs under `tokio::time::timeout_at`;
//!   on expiry the transaction future is dropped and sqlx rolls the open
//!   transaction back, so a missed budget never leaves a partial row
//! - Commit is atomic at the SQLite journal level: the row is either fully
//!   visible or absent
//! - Timeouts and write failures stay distinct error variants even though
//!   the handler treats both the same way

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tokio::time::timeout_at;

use crate::budget::Budget;
use crate::upstream::Quote;

const CREATE_BIDS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS bids (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT,
        codein TEXT,
        name TEXT,
        high TEXT,
        low TEXT,
        varBid TEXT,
        pctChange TEXT,
        bid TEXT,
        ask TEXT,
        timestamp TEXT,
        create_date TEXT
    )
";

const INSERT_BID: &str = "
    INSERT INTO bids (code, codein, name, high, low, varBid, pctChange, bid, ask, timestamp, create_date)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

/// Errors that can occur while persisting a quote.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The budget was spent before the transaction could begin.
    #[error("persistence budget expired before the transaction could begin")]
    BudgetExpired,

    /// The transaction did not commit within its budget and was rolled back.
    #[error("persistence transaction exceeded its budget")]
    Timeout,

    /// Any other persistence failure. The transaction is rolled back.
    #[error("persistence write failed: {0}")]
    Write(#[from] sqlx::Error),
}

/// SQLite-backed store for fetched quotes.
///
/// Cloning shares the underlying pool; the store is constructed once at
/// startup and injected wherever it is needed.
#[derive(Clone)]
pub struct BidStore {
    pool: SqlitePool,
}

impl BidStore {
    /// Open a store at the given SQLite URL, creating the database file when
    /// missing.
    pub async fn connect(url: &str) -> Result<Self, PersistError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Open an in-memory store with its schema already created.
    ///
    /// A single-connection pool keeps every transaction on the one
    /// connection that holds the in-memory database. Intended for tests and
    /// local experiments.
    pub async fn in_memory() -> Result<Self, PersistError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create the `bids` table if it does not exist. Idempotent; runs once
    /// at process start.
    pub async fn init_schema(&self) -> Result<(), PersistError> {
        sqlx::query(CREATE_BIDS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert one row for `quote`, bounded by `budget`.
    ///
    /// On a missed budget the in-flight transaction is cancelled and rolled
    /// back; no partial row survives on any failure path.
    pub async fn persist(&self, budget: &Budget, quote: &Quote) -> Result<(), PersistError> {
        if budget.is_expired() {
            return Err(PersistError::BudgetExpired);
        }

        match timeout_at(budget.deadline(), self.insert_row(quote)).await {
            Ok(result) => result,
            Err(_) => Err(PersistError::Timeout),
        }
    }

    async fn insert_row(&self, quote: &Quote) -> Result<(), PersistError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(INSERT_BID)
            .bind(&quote.code)
            .bind(&quote.codein)
            .bind(&quote.name)
            .bind(&quote.high)
            .bind(&quote.low)
            .bind(&quote.var_bid)
            .bind(&quote.pct_change)
            .bind(&quote.bid)
            .bind(&quote.ask)
            .bind(&quote.timestamp)
            .bind(&quote.create_date)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Number of committed rows. Used by tests asserting the zero-rows
    /// properties of the failure paths.
    pub async fn bid_count(&self) -> Result<i64, PersistError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bids")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Close the pool. Further writes fail with [`PersistError::Write`].
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
