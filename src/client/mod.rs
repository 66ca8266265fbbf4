//! The deadline-bound client side of the relay.
//!
//! # Responsibilities
//! - Issue one call to the relay under the client's own budget
//! - Classify what it observed: success, cancellation, connection failure
//!   or a server-side error status
//! - Record the served bid in a local file, label included
//!
//! # Design Decisions
//! - The client's budget is independent of every server-side budget; the
//!   call is cancelled the moment it expires, whatever the server is doing
//! - A non-2xx body is never parsed as a quote
//! - One attempt per call; retrying is the operator's decision, not ours

use thiserror::Error;
use tokio::time::timeout_at;

use crate::budget::Budget;
use crate::config::ClientConfig;
use crate::upstream::UsdBrlEnvelope;

/// A local failure after an otherwise successful exchange.
#[derive(Debug, Error)]
pub enum CallError {
    /// The quote arrived but could not be written to the output file.
    #[error("could not write the quote artifact: {0}")]
    Output(#[from] std::io::Error),
}

/// What one call to the relay looked like from the outside.
#[derive(Debug)]
pub enum CallOutcome {
    /// The relay answered 2xx; the labeled bid was written to the sink.
    Success { bid: String },

    /// The client's budget expired first; the in-flight call was cancelled.
    Cancelled,

    /// The relay could not be reached at all.
    ConnectionFailed,

    /// The relay answered with a non-2xx status.
    ServerError(reqwest::StatusCode),

    /// The relay answered 2xx but the body was not a quote envelope.
    MalformedResponse,
}

/// Issues deadline-bound calls against the relay.
pub struct Caller {
    client: reqwest::Client,
    config: ClientConfig,
}

impl Caller {
    /// Create a caller for the configured relay endpoint.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Call the relay once, bounded by `budget`.
    ///
    /// Only a local sink failure is an `Err`; every remote condition is a
    /// [`CallOutcome`].
    pub async fn call(&self, budget: &Budget) -> Result<CallOutcome, CallError> {
        if budget.is_expired() {
            return Ok(CallOutcome::Cancelled);
        }

        let (status, body) = match timeout_at(budget.deadline(), self.request()).await {
            Ok(Ok(exchange)) => exchange,
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "Relay unreachable");
                return Ok(CallOutcome::ConnectionFailed);
            }
            Err(_) => {
                tracing::warn!("Call budget expired, cancelling the in-flight request");
                return Ok(CallOutcome::Cancelled);
            }
        };

        if !status.is_success() {
            tracing::warn!(status = %status, "Relay reported a failure");
            return Ok(CallOutcome::ServerError(status));
        }

        let envelope: UsdBrlEnvelope = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(error) => {
                tracing::warn!(error = %error, "Relay body did not decode");
                return Ok(CallOutcome::MalformedResponse);
            }
        };

        let bid = envelope.usdbrl.bid;
        self.write_artifact(&bid).await?;
        tracing::info!(bid = %bid, path = %self.config.output_path, "Bid recorded");
        Ok(CallOutcome::Success { bid })
    }

    async fn request(&self) -> Result<(reqwest::StatusCode, Vec<u8>), reqwest::Error> {
        let response = self.client.get(&self.config.server_url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }

    async fn write_artifact(&self, bid: &str) -> Result<(), std::io::Error> {
        let contents = format!("{}{}", self.config.label, bid);
        tokio::fs::write(&self.config.output_path, contents).await
    }
}
