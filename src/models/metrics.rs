use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A low/high pair. Every ranged metric keeps `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: Decimal,
    pub max: Decimal,
}

impl Range {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    pub fn mean(&self) -> Decimal {
        (self.min + self.max) / Decimal::TWO
    }

    /// Multiply both bounds by a non-negative factor.
    pub fn scale(&self, factor: Decimal) -> Self {
        Self {
            min: self.min * factor,
            max: self.max * factor,
        }
    }
}

// ---------------------------------------------------------------------------
// FeeBreakdown
// ---------------------------------------------------------------------------

/// Full acquisition cost breakdown for one purchase price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub price: Decimal,
    pub notary_fees: Decimal,
    pub agency_commission: Decimal,
    pub realtor_fee: Range,
    pub renovation_cost: Decimal,
    /// Price + notary + commission + mean realtor fee.
    pub total_cost_excl: Decimal,
    /// `total_cost_excl + renovation_cost`.
    pub total_cost_incl: Decimal,
}

// ---------------------------------------------------------------------------
// DerivedMetrics
// ---------------------------------------------------------------------------

/// Output of the calculation engine for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub surface_sqm: Decimal,
    /// Matched reference city, `None` when the fallback bands were used.
    pub resolved_city: Option<String>,
    pub purchase_price: Range,
    pub notary_fees: Range,
    pub agency_commission: Range,
    /// Low bound of the band on the low price, high bound on the high price.
    pub realtor_fee_range: Range,
    pub renovation_cost: Decimal,
    pub total_cost_excl: Range,
    pub total_cost_incl: Range,
    pub estimated_monthly_rent: Range,
    /// Percent. Cross-paired: low rent over high cost, high rent over low cost.
    pub gross_yield_excl: Range,
    pub gross_yield_incl: Range,
    pub max_net_seller_budget: Decimal,
}

impl DerivedMetrics {
    /// All ranged fields, labelled, for invariant checks and reports.
    pub fn ranges(&self) -> [(&'static str, Range); 10] {
        [
            ("purchasePrice", self.purchase_price),
            ("notaryFees", self.notary_fees),
            ("agencyCommission", self.agency_commission),
            ("realtorFeeRange", self.realtor_fee_range),
            ("totalCostExcl", self.total_cost_excl),
            ("totalCostIncl", self.total_cost_incl),
            ("estimatedMonthlyRent", self.estimated_monthly_rent),
            ("grossYieldExcl", self.gross_yield_excl),
            ("grossYieldIncl", self.gross_yield_incl),
            (
                "renovationCost",
                Range::new(self.renovation_cost, self.renovation_cost),
            ),
        ]
    }
}
