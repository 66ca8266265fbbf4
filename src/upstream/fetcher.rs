//! Budget-bound upstream fetch.
//!
//! # Responsibilities
//! - Perform one outbound call to the price source under a deadline budget
//! - Map transport, status and decode failures to distinct errors
//! - Cancel the in-flight call when the budget expires
//!
//! # Design Decisions
//! - The whole send-plus-body-read runs under `tokio::time::timeout_at`;
//!   on expiry the future is dropped, which aborts the request and releases
//!   the connection
//! - Decode errors are distinct from transport errors so the handler can
//!   tell a broken upstream from an unreachable one

use std::time::Instant;

use thiserror::Error;
use tokio::time::timeout_at;

use crate::budget::Budget;
use crate::upstream::types::{Quote, UsdBrlEnvelope};

/// Errors that can occur while fetching a quote from the upstream source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The budget was spent before the call could be opened.
    #[error("fetch budget expired before the call could start")]
    BudgetExpired,

    /// The call did not complete within its budget and was cancelled.
    #[error("upstream call exceeded its budget")]
    Timeout,

    /// Transport-level failure (connection refused, DNS, broken body read).
    #[error("upstream unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),

    /// The response body does not decode into the quote envelope.
    #[error("malformed upstream payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),
}

/// Performs one outbound call to the external price source per request.
pub struct UpstreamFetcher {
    client: reqwest::Client,
    url: String,
}

impl UpstreamFetcher {
    /// Create a fetcher for the given upstream endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Fetch one quote, bounded by `budget`.
    pub async fn fetch(&self, budget: &Budget) -> Result<Quote, FetchError> {
        if budget.is_expired() {
            return Err(FetchError::BudgetExpired);
        }

        let started = Instant::now();
        let envelope = match timeout_at(budget.deadline(), self.request_quote()).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout),
        };

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            bid = %envelope.usdbrl.bid,
            "Upstream quote fetched"
        );
        Ok(envelope.usdbrl)
    }

    async fn request_quote(&self) -> Result<UsdBrlEnvelope, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::Unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await.map_err(FetchError::Unavailable)?;
        serde_json::from_slice(&body).map_err(FetchError::MalformedPayload)
    }
}
