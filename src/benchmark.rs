//! Sequential three-stage market benchmark.
//!
//! Stages only share the fixed request and metrics, never each other's
//! output, so the pause between calls is presentation pacing only.

use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::commentary::{CommentaryRequester, CommentaryResult};
use crate::error::Result;
use crate::models::{DerivedMetrics, InvestmentRequest};
use crate::prompts::Stage;

/// Per-stage results of one benchmark run, in [`Stage::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub results: Vec<CommentaryResult>,
}

impl BenchmarkReport {
    /// True when every stage came back from the live service.
    pub fn all_live(&self) -> bool {
        self.results.iter().all(CommentaryResult::is_ok)
    }

    pub fn get(&self, stage: Stage) -> Option<&CommentaryResult> {
        self.results.iter().find(|r| r.stage() == stage)
    }

    pub fn degraded_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_ok()).count()
    }
}

/// Run every stage one after the other, sleeping `pause` between calls.
///
/// A degraded stage does not stop the run. A local error (blank prompt)
/// aborts it.
pub fn run_benchmark(
    requester: &CommentaryRequester,
    request: &InvestmentRequest,
    metrics: &DerivedMetrics,
    pause: Duration,
) -> Result<BenchmarkReport> {
    let mut results = Vec::with_capacity(Stage::ALL.len());
    for (i, stage) in Stage::ALL.into_iter().enumerate() {
        if i > 0 && !pause.is_zero() {
            thread::sleep(pause);
        }
        log::debug!("Benchmark {}", stage.title());
        results.push(requester.request_commentary(request, metrics, stage)?);
    }
    Ok(BenchmarkReport { results })
}
