//! End-to-end tests for the cascading-deadline relay pipeline.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use uuid::Uuid;

use cotacao_relay::budget::Budget;
use cotacao_relay::http::{relay_quote, RelayOutcome};
use cotacao_relay::persistence::BidStore;
use cotacao_relay::upstream::UpstreamFetcher;

mod common;

#[tokio::test]
async fn fast_path_serves_the_quote_and_persists_one_row() {
    let upstream = common::start_mock_endpoint(|| async {
        (200, common::SAMPLE_PAYLOAD.to_string())
    })
    .await;
    let store = BidStore::in_memory().await.unwrap();
    let relay = common::start_relay(common::relay_config(upstream), store.clone()).await;

    let response = reqwest::get(format!("http://{relay}/cotacao"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let expected: serde_json::Value = serde_json::from_str(common::SAMPLE_PAYLOAD).unwrap();
    // Every field comes back exactly as the upstream sent it.
    assert_eq!(body, expected);
    assert_eq!(store.bid_count().await.unwrap(), 1);
}

#[tokio::test]
async fn slow_upstream_is_cancelled_and_nothing_is_written() {
    let upstream = common::start_mock_endpoint(|| async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        (200, common::SAMPLE_PAYLOAD.to_string())
    })
    .await;
    let store = BidStore::in_memory().await.unwrap();
    let relay = common::start_relay(common::relay_config(upstream), store.clone()).await;

    let started = Instant::now();
    let response = reqwest::get(format!("http://{relay}/cotacao"))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    // The 200ms fetch budget fired well before the 500ms upstream finished.
    assert!(
        started.elapsed() < Duration::from_millis(400),
        "fetch was not cancelled at its budget, took {:?}",
        started.elapsed()
    );
    assert_eq!(store.bid_count().await.unwrap(), 0);
}

#[tokio::test]
async fn upstream_error_status_skips_persistence() {
    let upstream =
        common::start_mock_endpoint(|| async { (503, "unavailable".to_string()) }).await;
    let store = BidStore::in_memory().await.unwrap();
    let relay = common::start_relay(common::relay_config(upstream), store.clone()).await;

    let response = reqwest::get(format!("http://{relay}/cotacao"))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(store.bid_count().await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_payload_skips_persistence() {
    let upstream = common::start_mock_endpoint(|| async {
        (200, r#"{"USDBRL": {"code": "USD", "bid": "5.43"}}"#.to_string())
    })
    .await;
    let store = BidStore::in_memory().await.unwrap();
    let relay = common::start_relay(common::relay_config(upstream), store.clone()).await;

    let response = reqwest::get(format!("http://{relay}/cotacao"))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(store.bid_count().await.unwrap(), 0);
}

#[tokio::test]
async fn missed_persistence_budget_still_serves_the_quote() {
    let upstream = common::start_mock_endpoint(|| async {
        (200, common::SAMPLE_PAYLOAD.to_string())
    })
    .await;
    let store = BidStore::in_memory().await.unwrap();
    let mut config = common::relay_config(upstream);
    // A window that is spent the moment it is derived.
    config.budgets.persistence_ms = 0;
    let relay = common::start_relay(config, store.clone()).await;

    let response = reqwest::get(format!("http://{relay}/cotacao"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["USDBRL"]["bid"], "5.4312");
    // The response succeeded, the row did not.
    assert_eq!(store.bid_count().await.unwrap(), 0);
}

#[tokio::test]
async fn persistence_write_failure_still_serves_the_quote() {
    let upstream = common::start_mock_endpoint(|| async {
        (200, common::SAMPLE_PAYLOAD.to_string())
    })
    .await;
    let store = BidStore::in_memory().await.unwrap();
    store.close().await;
    let relay = common::start_relay(common::relay_config(upstream), store).await;

    let response = reqwest::get(format!("http://{relay}/cotacao"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["USDBRL"]["bid"], "5.4312");
}

#[tokio::test]
async fn expired_inbound_budget_cancels_before_any_work() {
    let upstream = common::start_mock_endpoint(|| async {
        (200, common::SAMPLE_PAYLOAD.to_string())
    })
    .await;
    let store = BidStore::in_memory().await.unwrap();
    let config = common::relay_config(upstream);
    let fetcher = UpstreamFetcher::new(&config.upstream.url);

    let budget = Budget::root(Duration::from_millis(1));
    tokio::time::sleep(Duration::from_millis(5)).await;

    let outcome = relay_quote(Uuid::new_v4(), &budget, &config.budgets, &fetcher, &store).await;

    assert!(matches!(outcome, RelayOutcome::Cancelled));
    assert_eq!(outcome.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(store.bid_count().await.unwrap(), 0);
}
