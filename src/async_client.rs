//! Async wrapper around [`CommentaryRequester`] for Tokio-based servers.
//!
//! The requester uses a blocking HTTP client, so every call runs on the
//! blocking thread pool via [`tokio::task::spawn_blocking`] and the event
//! loop stays free during the network round trip.
//!
//! # Example
//!
//! ```no_run
//! use immo_calc::{AsyncCommentaryRequester, Stage};
//! # async fn example(
//! #     request: immo_calc::InvestmentRequest,
//! #     metrics: immo_calc::DerivedMetrics,
//! # ) -> immo_calc::Result<()> {
//! let requester = AsyncCommentaryRequester::builder()
//!     .api_key("pplx-...")
//!     .build()
//!     .await?;
//! let result = requester
//!     .request_commentary(&request, &metrics, Stage::AnalyzeNeighborhoods)
//!     .await?;
//! println!("{}", result.content());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::benchmark::BenchmarkReport;
use crate::commentary::{
    CommentaryRequester, CommentaryRequesterBuilder, CommentaryResult, CompletionTransport,
};
use crate::config::RequesterConfig;
use crate::error::{ImmoError, Result};
use crate::models::{DerivedMetrics, InvestmentRequest};
use crate::prompts::Stage;

// ---------------------------------------------------------------------------
// AsyncCommentaryRequesterBuilder
// ---------------------------------------------------------------------------

/// Builder for [`AsyncCommentaryRequester`]; same settings as the sync builder.
#[derive(Default)]
pub struct AsyncCommentaryRequesterBuilder {
    inner: CommentaryRequesterBuilder,
}

impl AsyncCommentaryRequesterBuilder {
    pub fn config(mut self, config: RequesterConfig) -> Self {
        self.inner = self.inner.config(config);
        self
    }

    pub fn api_key(mut self, key: &str) -> Self {
        self.inner = self.inner.api_key(key);
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.inner = self.inner.model(model);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    pub fn transport<T: CompletionTransport + 'static>(mut self, transport: T) -> Self {
        self.inner = self.inner.transport(transport);
        self
    }

    /// Build on the blocking pool, since the HTTP client must not be created
    /// on an async worker thread.
    pub async fn build(self) -> Result<AsyncCommentaryRequester> {
        let inner = self.inner;
        let requester = tokio::task::spawn_blocking(move || inner.build())
            .await
            .map_err(|e| ImmoError::InvalidArgument(format!("Task join error: {e}")))??;
        Ok(AsyncCommentaryRequester::from_requester(requester))
    }
}

// ---------------------------------------------------------------------------
// AsyncCommentaryRequester
// ---------------------------------------------------------------------------

/// Cloneable async handle to a shared [`CommentaryRequester`].
#[derive(Clone)]
pub struct AsyncCommentaryRequester {
    inner: Arc<CommentaryRequester>,
}

impl AsyncCommentaryRequester {
    pub fn builder() -> AsyncCommentaryRequesterBuilder {
        AsyncCommentaryRequesterBuilder::default()
    }

    pub fn from_requester(requester: CommentaryRequester) -> Self {
        Self {
            inner: Arc::new(requester),
        }
    }

    /// Run a sync requester operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&CommentaryRequester) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let requester = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&requester))
            .await
            .map_err(|e| ImmoError::InvalidArgument(format!("Task join error: {e}")))?
    }

    pub async fn request_commentary(
        &self,
        request: &InvestmentRequest,
        metrics: &DerivedMetrics,
        stage: Stage,
    ) -> Result<CommentaryResult> {
        let request = request.clone();
        let metrics = metrics.clone();
        self.run(move |r| r.request_commentary(&request, &metrics, stage))
            .await
    }

    pub async fn complete(&self, stage: Stage, prompt: &str) -> Result<CommentaryResult> {
        let prompt = prompt.to_string();
        self.run(move |r| r.complete(stage, &prompt)).await
    }

    /// Async counterpart of [`crate::benchmark::run_benchmark`], pausing with
    /// `tokio::time::sleep` between stages.
    pub async fn run_benchmark(
        &self,
        request: &InvestmentRequest,
        metrics: &DerivedMetrics,
        pause: Duration,
    ) -> Result<BenchmarkReport> {
        let mut results = Vec::with_capacity(Stage::ALL.len());
        for (i, stage) in Stage::ALL.into_iter().enumerate() {
            if i > 0 && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            results.push(self.request_commentary(request, metrics, stage).await?);
        }
        Ok(BenchmarkReport { results })
    }
}
