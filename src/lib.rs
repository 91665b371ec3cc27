//! Rental investment calculator for the French property market.
//!
//! Turns a validated investment request (city, budget, unit type, renovation
//! level) into deterministic acquisition cost and gross yield figures, and
//! requests market commentary tables from an external chat-completion
//! service with offline fallbacks.
//!
//! # Quick start
//!
//! ```no_run
//! use immo_calc::{Calculator, CommentaryRequester, InvestmentForm, Stage};
//! use rust_decimal_macros::dec;
//!
//! let calculator = Calculator::builder().build();
//! let form = InvestmentForm {
//!     city: "Lyon".into(),
//!     total_budget: dec!(300000),
//!     renovation_budget: None,
//!     property_age: "existing".into(),
//!     unit_type: "T2".into(),
//!     renovation_level: "none".into(),
//!     goal: "patrimoine".into(),
//! };
//! let (request, metrics) = calculator.evaluate(&form).unwrap();
//!
//! let requester = CommentaryRequester::from_env().unwrap();
//! let result = requester
//!     .request_commentary(&request, &metrics, Stage::SearchListings)
//!     .unwrap();
//! println!("{}", result.content());
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod benchmark;
pub mod calculator;
pub mod commentary;
pub mod config;
pub mod error;
pub mod market;
pub mod models;
pub mod prompts;
pub mod report;

#[cfg(feature = "async")]
pub use async_client::AsyncCommentaryRequester;
pub use benchmark::{run_benchmark, BenchmarkReport};
pub use calculator::{compute, compute_with, CalculationPolicy};
pub use commentary::{
    CommentaryRequester, CommentaryResult, CompletionTransport, FailureKind, HttpReply,
    ServiceFailure,
};
pub use config::{BudgetBounds, Credential, RequesterConfig};
pub use error::{ImmoError, Result};
pub use market::MarketReferenceTable;
pub use models::*;
pub use prompts::{fallback_content, Stage};

use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// CalculatorBuilder
// ---------------------------------------------------------------------------

/// Builder for a [`Calculator`].
///
/// Defaults: built-in market table, default [`CalculationPolicy`], budget
/// bounds of 50 000 to 2 000 000.
#[derive(Default)]
pub struct CalculatorBuilder {
    table: Option<MarketReferenceTable>,
    policy: CalculationPolicy,
    bounds: BudgetBounds,
}

impl CalculatorBuilder {
    /// Use a specific market table.
    pub fn table(mut self, table: MarketReferenceTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Load the market table from a JSON file.
    pub fn table_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.table = Some(MarketReferenceTable::from_json_file(path)?);
        Ok(self)
    }

    /// Use a custom policy. Fails if [`CalculationPolicy::validate`] does.
    pub fn policy(mut self, policy: CalculationPolicy) -> Result<Self> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    pub fn bounds(mut self, bounds: BudgetBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn build(self) -> Calculator {
        Calculator {
            table: self.table.unwrap_or_default(),
            policy: self.policy,
            bounds: self.bounds,
        }
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Validation plus the calculation engine, bound to one table and policy.
pub struct Calculator {
    table: MarketReferenceTable,
    policy: CalculationPolicy,
    bounds: BudgetBounds,
}

impl Calculator {
    pub fn builder() -> CalculatorBuilder {
        CalculatorBuilder::default()
    }

    /// Validate a form into an [`InvestmentRequest`].
    pub fn validate(&self, form: &InvestmentForm) -> Result<InvestmentRequest> {
        form.validate(&self.bounds)
    }

    /// Compute metrics for an already validated request. Never fails.
    pub fn compute(&self, request: &InvestmentRequest) -> DerivedMetrics {
        calculator::compute_checked(request, &self.table, &self.policy)
    }

    /// Validate then compute. The engine is not invoked when validation fails.
    pub fn evaluate(&self, form: &InvestmentForm) -> Result<(InvestmentRequest, DerivedMetrics)> {
        let request = self.validate(form)?;
        let metrics = self.compute(&request);
        Ok((request, metrics))
    }

    pub fn table(&self) -> &MarketReferenceTable {
        &self.table
    }

    pub fn policy(&self) -> &CalculationPolicy {
        &self.policy
    }

    pub fn bounds(&self) -> &BudgetBounds {
        &self.bounds
    }
}

impl fmt::Display for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max = self
            .bounds
            .max
            .map(|m| m.to_string())
            .unwrap_or_else(|| "unbounded".to_string());
        write!(
            f,
            "Calculator(cities={}, budget={}..={})",
            self.table.cities().len(),
            self.bounds.min,
            max
        )
    }
}
