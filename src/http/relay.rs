//! The per-request coordinator for `GET /cotacao`.
//!
//! # Data Flow
//! ```text
//! inbound request (root budget)
//!     -> derive fetch sub-budget   -> upstream fetch
//!     -> derive persist sub-budget -> bids insert (best effort)
//!     -> outcome -> HTTP status + body
//! ```
//!
//! The two sub-budgets are siblings under the same inbound budget, not
//! sequential slices of one window: a slow fetch cannot starve persistence
//! and a slow write cannot starve a later fetch.
//!
//! Persistence failure of any kind is non-fatal. The client still receives
//! the fetched quote; the failure is visible only in the logs.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::budget::Budget;
use crate::config::BudgetConfig;
use crate::persistence::{BidStore, PersistError};
use crate::upstream::{FetchError, Quote, UpstreamFetcher, UsdBrlEnvelope};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<UpstreamFetcher>,
    pub store: BidStore,
    pub budgets: BudgetConfig,
}

/// Everything one request can end as. Exactly one outcome is produced per
/// request, and the variant alone decides the wire response.
#[derive(Debug)]
pub enum RelayOutcome {
    /// Fetch and persist both succeeded.
    Success(Quote),

    /// Fetch succeeded but the write missed its budget. The quote is still
    /// served.
    PersistenceTimeout(Quote),

    /// Fetch succeeded but the write failed outright. The quote is still
    /// served.
    PersistenceError(Quote),

    /// The upstream call missed its budget.
    UpstreamTimeout,

    /// The upstream was unreachable or answered with a non-2xx status.
    UpstreamError,

    /// The upstream body did not decode into a quote.
    MalformedPayload,

    /// The inbound budget died before a response could be produced.
    Cancelled,
}

impl RelayOutcome {
    /// Short name for log fields, without dragging the quote body along.
    pub fn label(&self) -> &'static str {
        match self {
            RelayOutcome::Success(_) => "success",
            RelayOutcome::PersistenceTimeout(_) => "persistence_timeout",
            RelayOutcome::PersistenceError(_) => "persistence_error",
            RelayOutcome::UpstreamTimeout => "upstream_timeout",
            RelayOutcome::UpstreamError => "upstream_error",
            RelayOutcome::MalformedPayload => "malformed_payload",
            RelayOutcome::Cancelled => "cancelled",
        }
    }

    /// The HTTP status this outcome maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayOutcome::Success(_)
            | RelayOutcome::PersistenceTimeout(_)
            | RelayOutcome::PersistenceError(_) => StatusCode::OK,
            RelayOutcome::UpstreamTimeout
            | RelayOutcome::UpstreamError
            | RelayOutcome::MalformedPayload => StatusCode::BAD_REQUEST,
            RelayOutcome::Cancelled => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

impl IntoResponse for RelayOutcome {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            RelayOutcome::Success(quote)
            | RelayOutcome::PersistenceTimeout(quote)
            | RelayOutcome::PersistenceError(quote) => {
                (status, Json(UsdBrlEnvelope { usdbrl: quote })).into_response()
            }
            _ => status.into_response(),
        }
    }
}

/// Handler for `GET /cotacao`.
///
/// Client disconnects drop this future mid-flight, so nothing is ever
/// written after an inbound cancellation is observed.
pub async fn cotacao_handler(State(state): State<AppState>) -> Response {
    let request_id = Uuid::new_v4();
    tracing::info!(request_id = %request_id, "Quote request received");

    let budget = Budget::root(state.budgets.request());
    let outcome = relay_quote(request_id, &budget, &state.budgets, &state.fetcher, &state.store).await;

    tracing::info!(
        request_id = %request_id,
        status = %outcome.status(),
        outcome = outcome.label(),
        "Quote request completed"
    );
    outcome.into_response()
}

/// Drive one request through fetch and persistence under `budget`.
pub async fn relay_quote(
    request_id: Uuid,
    budget: &Budget,
    budgets: &BudgetConfig,
    fetcher: &UpstreamFetcher,
    store: &BidStore,
) -> RelayOutcome {
    let fetch_budget = match budget.derive(budgets.upstream()) {
        Ok(b) => b,
        Err(_) => {
            tracing::warn!(request_id = %request_id, "Inbound budget expired before fetch could start");
            return RelayOutcome::Cancelled;
        }
    };

    let quote = match fetcher.fetch(&fetch_budget).await {
        Ok(quote) => quote,
        Err(FetchError::BudgetExpired) | Err(FetchError::Timeout) => {
            tracing::warn!(request_id = %request_id, "Upstream fetch missed its budget");
            return RelayOutcome::UpstreamTimeout;
        }
        Err(FetchError::Unavailable(error)) => {
            tracing::warn!(request_id = %request_id, error = %error, "Upstream unavailable");
            return RelayOutcome::UpstreamError;
        }
        Err(FetchError::Status(status)) => {
            tracing::warn!(request_id = %request_id, upstream_status = %status, "Upstream returned an error status");
            return RelayOutcome::UpstreamError;
        }
        Err(FetchError::MalformedPayload(error)) => {
            tracing::warn!(request_id = %request_id, error = %error, "Upstream payload did not decode");
            return RelayOutcome::MalformedPayload;
        }
    };

    // Sibling budget, derived from the inbound budget rather than from what
    // the fetch left over.
    let persist_budget = match budget.derive(budgets.persistence()) {
        Ok(b) => b,
        Err(_) => {
            tracing::warn!(request_id = %request_id, "Inbound budget expired after fetch, dropping response");
            return RelayOutcome::Cancelled;
        }
    };

    match store.persist(&persist_budget, &quote).await {
        Ok(()) => RelayOutcome::Success(quote),
        Err(PersistError::BudgetExpired) | Err(PersistError::Timeout) => {
            tracing::warn!(
                request_id = %request_id,
                bid = %quote.bid,
                "Persistence missed its budget, serving the quote anyway"
            );
            RelayOutcome::PersistenceTimeout(quote)
        }
        Err(PersistError::Write(error)) => {
            tracing::warn!(
                request_id = %request_id,
                error = %error,
                "Persistence write failed, serving the quote anyway"
            );
            RelayOutcome::PersistenceError(quote)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote() -> Quote {
        Quote {
            code: "USD".into(),
            codein: "BRL".into(),
            name: "Dolar Americano/Real Brasileiro".into(),
            high: "5.4587".into(),
            low: "5.4102".into(),
            var_bid: "0.0173".into(),
            pct_change: "0.32".into(),
            bid: "5.4312".into(),
            ask: "5.4318".into(),
            timestamp: "1712245496".into(),
            create_date: "2024-04-04 11:04:56".into(),
        }
    }

    #[test]
    fn quote_bearing_outcomes_map_to_ok() {
        assert_eq!(RelayOutcome::Success(quote()).status(), StatusCode::OK);
        assert_eq!(
            RelayOutcome::PersistenceTimeout(quote()).status(),
            StatusCode::OK
        );
        assert_eq!(
            RelayOutcome::PersistenceError(quote()).status(),
            StatusCode::OK
        );
    }

    #[test]
    fn fetch_failures_map_to_bad_request() {
        assert_eq!(
            RelayOutcome::UpstreamTimeout.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayOutcome::UpstreamError.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayOutcome::MalformedPayload.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn cancellation_maps_to_request_timeout() {
        assert_eq!(
            RelayOutcome::Cancelled.status(),
            StatusCode::REQUEST_TIMEOUT
        );
    }
}
