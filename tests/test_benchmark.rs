//! Three-stage benchmark runs against a stub service.

mod common;

use std::time::{Duration, Instant};

use common::StubTransport;
use immo_calc::{fallback_content, run_benchmark, FailureKind, HttpReply, Stage};

#[test]
fn runs_every_stage_in_order() {
    let stub = StubTransport::sequence(vec![
        Ok(common::success_reply("annonces")),
        Ok(common::success_reply("quartiers")),
        Ok(common::success_reply("top 3")),
    ]);
    let requester = common::requester_with(&stub);
    let (request, metrics) = common::lyon_t2();

    let report = run_benchmark(&requester, &request, &metrics, Duration::ZERO).unwrap();

    assert_eq!(stub.calls(), 3);
    let stages: Vec<Stage> = report.results.iter().map(|r| r.stage()).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    let contents: Vec<&str> = report.results.iter().map(|r| r.content()).collect();
    assert_eq!(contents, vec!["annonces", "quartiers", "top 3"]);
    assert!(report.all_live());
    assert_eq!(report.degraded_count(), 0);
}

#[test]
fn each_stage_sends_its_own_prompt() {
    let stub = StubTransport::ok("ok");
    let requester = common::requester_with(&stub);
    let (request, metrics) = common::lyon_t2();

    run_benchmark(&requester, &request, &metrics, Duration::ZERO).unwrap();

    let prompts: Vec<String> = stub
        .sent()
        .into_iter()
        .map(|payload| payload.messages[1].content.clone())
        .collect();
    assert_eq!(prompts.len(), 3);
    assert_ne!(prompts[0], prompts[1]);
    assert_ne!(prompts[1], prompts[2]);
}

#[test]
fn degraded_stage_does_not_stop_the_run() {
    let stub = StubTransport::sequence(vec![
        Ok(common::success_reply("annonces")),
        Ok(HttpReply {
            status: 429,
            body: "rate limited".to_string(),
        }),
        Ok(common::success_reply("top 3")),
    ]);
    let requester = common::requester_with(&stub);
    let (request, metrics) = common::lyon_t2();

    let report = run_benchmark(&requester, &request, &metrics, Duration::ZERO).unwrap();

    assert_eq!(stub.calls(), 3);
    assert!(!report.all_live());
    assert_eq!(report.degraded_count(), 1);

    let hoods = report.get(Stage::AnalyzeNeighborhoods).unwrap();
    assert_eq!(hoods.failure().unwrap().kind, FailureKind::RateLimit);
    assert_eq!(hoods.content(), fallback_content(Stage::AnalyzeNeighborhoods));
    assert_eq!(report.get(Stage::TopListings).unwrap().content(), "top 3");
}

#[test]
fn missing_credential_degrades_every_stage() {
    let requester = immo_calc::CommentaryRequester::builder().build().unwrap();
    let (request, metrics) = common::lyon_t2();

    let report = run_benchmark(&requester, &request, &metrics, Duration::ZERO).unwrap();

    assert_eq!(report.degraded_count(), 3);
    for stage in Stage::ALL {
        let result = report.get(stage).unwrap();
        assert_eq!(result.content(), fallback_content(stage));
    }
}

#[test]
fn pause_is_applied_between_stages_only() {
    let stub = StubTransport::ok("ok");
    let requester = common::requester_with(&stub);
    let (request, metrics) = common::lyon_t2();

    let started = Instant::now();
    run_benchmark(&requester, &request, &metrics, Duration::from_millis(30)).unwrap();
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[test]
fn report_serializes_results_array() {
    let stub = StubTransport::ok("ok");
    let requester = common::requester_with(&stub);
    let (request, metrics) = common::lyon_t2();

    let report = run_benchmark(&requester, &request, &metrics, Duration::ZERO).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[2]["stage"], "top_listings");
    assert_eq!(results[2]["ok"], true);
}
