//! Deadline budgets.
//!
//! # Responsibilities
//! - Represent the time remaining for one unit of work as an absolute expiry
//! - Derive child budgets that can never outlive their parent
//! - Refuse to hand out a budget for work that cannot start in time
//!
//! # Design Decisions
//! - Budgets are plain `Copy` values; enforcement lives at the await points,
//!   which pass `deadline()` to `tokio::time::timeout_at`
//! - A child's expiry is clamped to its parent's, so the child-never-exceeds-
//!   parent invariant holds by construction
//! - Sibling budgets derived from the same parent are independent: a slow
//!   step does not eat into its sibling's window

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// Errors raised when a budget cannot cover new work.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BudgetError {
    /// The parent budget ran out before the child hop could start.
    #[error("budget already expired, refusing to start new work")]
    AlreadyExpired,
}

/// Time remaining for one unit of work, as an absolute expiry instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    expiry: Instant,
}

impl Budget {
    /// Open a fresh top-of-chain budget spanning `window` from now.
    pub fn root(window: Duration) -> Self {
        Self {
            expiry: Instant::now() + window,
        }
    }

    /// Derive a child budget spanning at most `window` from now.
    ///
    /// The child expires at `min(parent expiry, now + window)`. Fails when
    /// this budget is already spent; callers must not open the hop at all in
    /// that case.
    pub fn derive(&self, window: Duration) -> Result<Budget, BudgetError> {
        if self.is_expired() {
            return Err(BudgetError::AlreadyExpired);
        }
        Ok(Budget {
            expiry: (Instant::now() + window).min(self.expiry),
        })
    }

    /// The absolute expiry instant, in the form `tokio::time::timeout_at`
    /// consumes.
    pub fn deadline(&self) -> Instant {
        self.expiry
    }

    /// Time left before expiry. Saturates at zero once spent.
    pub fn remaining(&self) -> Duration {
        self.expiry.saturating_duration_since(Instant::now())
    }

    /// Whether this budget has run out.
    pub fn is_expired(&self) -> bool {
        self.remaining() == Duration::ZERO
    }
}
