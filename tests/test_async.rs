//! Async requester wrapper. Run with `cargo test --features async`.

#![cfg(feature = "async")]

mod common;

use std::time::Duration;

use common::StubTransport;
use immo_calc::{fallback_content, AsyncCommentaryRequester, FailureKind, ImmoError, Stage};

async fn requester_with(stub: &StubTransport) -> AsyncCommentaryRequester {
    AsyncCommentaryRequester::builder()
        .api_key("test-key")
        .transport(stub.clone())
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn request_commentary_success() {
    let stub = StubTransport::ok("tableau");
    let requester = requester_with(&stub).await;
    let (request, metrics) = common::lyon_t2();

    let result = requester
        .request_commentary(&request, &metrics, Stage::SearchListings)
        .await
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(result.content(), "tableau");
}

#[tokio::test]
async fn rate_limit_degrades() {
    let stub = StubTransport::status(429, "slow down");
    let requester = requester_with(&stub).await;

    let result = requester
        .complete(Stage::TopListings, "top 3")
        .await
        .unwrap();
    assert_eq!(result.failure().unwrap().kind, FailureKind::RateLimit);
    assert_eq!(result.content(), fallback_content(Stage::TopListings));
}

#[tokio::test]
async fn blank_prompt_is_rejected() {
    let stub = StubTransport::ok("unused");
    let requester = requester_with(&stub).await;

    let err = requester.complete(Stage::SearchListings, " ").await.unwrap_err();
    assert!(matches!(err, ImmoError::EmptyPrompt(_)));
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn clones_share_one_requester() {
    let stub = StubTransport::ok("ok");
    let requester = requester_with(&stub).await;
    let other = requester.clone();

    requester.complete(Stage::SearchListings, "a").await.unwrap();
    other.complete(Stage::SearchListings, "b").await.unwrap();
    assert_eq!(stub.calls(), 2);
}

#[tokio::test]
async fn benchmark_runs_all_stages() {
    let stub = StubTransport::ok("ok");
    let requester = requester_with(&stub).await;
    let (request, metrics) = common::lyon_t2();

    let report = requester
        .run_benchmark(&request, &metrics, Duration::from_millis(5))
        .await
        .unwrap();
    assert_eq!(report.results.len(), 3);
    assert!(report.all_live());
}
