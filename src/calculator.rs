//! Deterministic acquisition cost and gross yield calculation.
//!
//! Pure functions only: no I/O, no logging. The request is assumed to be
//! validated (strictly positive budget); only a custom policy can be rejected.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{ImmoError, Result};
use crate::market::MarketReferenceTable;
use crate::models::{
    DerivedMetrics, FeeBreakdown, InvestmentRequest, PropertyAge, Range, RenovationLevel,
    UnitType,
};

// ---------------------------------------------------------------------------
// CalculationPolicy
// ---------------------------------------------------------------------------

/// Largest reference surface a policy may declare, in m².
pub const MAX_SURFACE_SQM: Decimal = dec!(10000);

/// Largest renovation cost per m² a policy may declare, in EUR.
pub const MAX_RENOVATION_PER_SQM: Decimal = dec!(100000);

/// Reference surfaces and fee rates. Policy constants, not derived values.
///
/// Rates are fractions of the purchase price (`0.075` = 7.5 %). Custom
/// policies must pass [`validate`](Self::validate) before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationPolicy {
    pub surface_t1: Decimal,
    pub surface_t2: Decimal,
    pub surface_t3: Decimal,
    pub surface_t4: Decimal,
    pub surface_t5: Decimal,
    pub notary_rate_existing: Decimal,
    pub notary_rate_new: Decimal,
    pub agency_commission_rate: Decimal,
    pub realtor_fee_rate: Range,
    /// EUR per m².
    pub renovation_light_per_sqm: Decimal,
    /// EUR per m².
    pub renovation_heavy_per_sqm: Decimal,
}

impl Default for CalculationPolicy {
    fn default() -> Self {
        Self {
            surface_t1: dec!(25),
            surface_t2: dec!(40),
            surface_t3: dec!(65),
            surface_t4: dec!(90),
            surface_t5: dec!(110),
            notary_rate_existing: dec!(0.075),
            notary_rate_new: dec!(0.025),
            agency_commission_rate: dec!(0.084),
            realtor_fee_rate: Range::new(dec!(0.04), dec!(0.10)),
            renovation_light_per_sqm: dec!(400),
            renovation_heavy_per_sqm: dec!(1000),
        }
    }
}

impl CalculationPolicy {
    /// Check that every figure is usable by the engine.
    ///
    /// Surfaces must be positive, rates within `0..=1`, the realtor band
    /// ordered, renovation costs non-negative. All are capped so no
    /// computation can overflow.
    pub fn validate(&self) -> Result<()> {
        for unit in UnitType::ALL {
            let surface = self.surface(unit);
            if surface <= Decimal::ZERO || surface > MAX_SURFACE_SQM {
                return Err(ImmoError::InvalidArgument(format!(
                    "{unit} surface must be positive and at most {MAX_SURFACE_SQM} m², got {surface}"
                )));
            }
        }

        let rates = [
            ("existing notary rate", self.notary_rate_existing),
            ("new-build notary rate", self.notary_rate_new),
            ("agency commission rate", self.agency_commission_rate),
            ("realtor fee rate min", self.realtor_fee_rate.min),
            ("realtor fee rate max", self.realtor_fee_rate.max),
        ];
        for (label, rate) in rates {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(ImmoError::InvalidArgument(format!(
                    "{label} must be within 0..=1, got {rate}"
                )));
            }
        }
        if !self.realtor_fee_rate.is_ordered() {
            return Err(ImmoError::InvalidArgument(format!(
                "realtor fee band is inverted ({} > {})",
                self.realtor_fee_rate.min, self.realtor_fee_rate.max
            )));
        }

        for (label, cost) in [
            ("light renovation cost", self.renovation_light_per_sqm),
            ("heavy renovation cost", self.renovation_heavy_per_sqm),
        ] {
            if cost < Decimal::ZERO || cost > MAX_RENOVATION_PER_SQM {
                return Err(ImmoError::InvalidArgument(format!(
                    "{label} must be within 0..={MAX_RENOVATION_PER_SQM} per m², got {cost}"
                )));
            }
        }
        Ok(())
    }

    pub fn surface(&self, unit: UnitType) -> Decimal {
        match unit {
            UnitType::T1 => self.surface_t1,
            UnitType::T2 => self.surface_t2,
            UnitType::T3 => self.surface_t3,
            UnitType::T4 => self.surface_t4,
            UnitType::T5 => self.surface_t5,
        }
    }

    pub fn notary_rate(&self, age: PropertyAge) -> Decimal {
        match age {
            PropertyAge::Existing => self.notary_rate_existing,
            PropertyAge::New => self.notary_rate_new,
        }
    }

    pub fn renovation_cost_per_sqm(&self, level: RenovationLevel) -> Decimal {
        match level {
            RenovationLevel::None => Decimal::ZERO,
            RenovationLevel::Light => self.renovation_light_per_sqm,
            RenovationLevel::Heavy => self.renovation_heavy_per_sqm,
        }
    }

    /// Sum of all buyer-side rates on top of the price, realtor fee at its mean.
    pub fn total_fee_rate(&self, age: PropertyAge) -> Decimal {
        self.notary_rate(age) + self.agency_commission_rate + self.realtor_fee_rate.mean()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compute derived metrics with the default [`CalculationPolicy`].
pub fn compute(request: &InvestmentRequest, table: &MarketReferenceTable) -> DerivedMetrics {
    compute_checked(request, table, &CalculationPolicy::default())
}

/// Compute derived metrics with a custom policy, rejecting it first if
/// [`CalculationPolicy::validate`] fails.
pub fn compute_with(
    request: &InvestmentRequest,
    table: &MarketReferenceTable,
    policy: &CalculationPolicy,
) -> Result<DerivedMetrics> {
    policy.validate()?;
    Ok(compute_checked(request, table, policy))
}

/// Engine body. `policy` must already be validated.
pub(crate) fn compute_checked(
    request: &InvestmentRequest,
    table: &MarketReferenceTable,
    policy: &CalculationPolicy,
) -> DerivedMetrics {
    let surface = policy.surface(request.unit_type());
    let bands = table.resolve(request.city());

    let purchase_price = bands.price_per_sqm.scale(surface);
    let renovation_cost = surface * policy.renovation_cost_per_sqm(request.renovation_level());

    let low = fee_breakdown(purchase_price.min, request.property_age(), renovation_cost, policy);
    let high = fee_breakdown(purchase_price.max, request.property_age(), renovation_cost, policy);

    let rent = bands.rent_per_sqm.scale(surface);

    let total_cost_excl = Range::new(low.total_cost_excl, high.total_cost_excl);
    let total_cost_incl = Range::new(low.total_cost_incl, high.total_cost_incl);

    DerivedMetrics {
        surface_sqm: surface,
        resolved_city: bands.city,
        purchase_price,
        notary_fees: Range::new(low.notary_fees, high.notary_fees),
        agency_commission: Range::new(low.agency_commission, high.agency_commission),
        realtor_fee_range: Range::new(low.realtor_fee.min, high.realtor_fee.max),
        renovation_cost,
        total_cost_excl,
        total_cost_incl,
        estimated_monthly_rent: rent,
        gross_yield_excl: yield_range(&rent, &total_cost_excl),
        gross_yield_incl: yield_range(&rent, &total_cost_incl),
        max_net_seller_budget: max_net_seller_budget(
            request.total_budget(),
            request.property_age(),
            policy,
        ),
    }
}

/// All buyer-side costs for a single purchase price.
pub fn fee_breakdown(
    price: Decimal,
    age: PropertyAge,
    renovation_cost: Decimal,
    policy: &CalculationPolicy,
) -> FeeBreakdown {
    let notary_fees = price * policy.notary_rate(age);
    let agency_commission = price * policy.agency_commission_rate;
    let realtor_fee = policy.realtor_fee_rate.scale(price);
    let total_cost_excl = price + notary_fees + agency_commission + realtor_fee.mean();

    FeeBreakdown {
        price,
        notary_fees,
        agency_commission,
        realtor_fee,
        renovation_cost,
        total_cost_excl,
        total_cost_incl: total_cost_excl + renovation_cost,
    }
}

/// Annual rent over total cost, in percent. Zero when the cost is not positive.
pub fn gross_yield(monthly_rent: Decimal, total_cost: Decimal) -> Decimal {
    if total_cost <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    monthly_rent * dec!(12) / total_cost * Decimal::ONE_HUNDRED
}

/// Pessimistic bound pairs the low rent with the high cost; optimistic bound
/// pairs the high rent with the low cost.
fn yield_range(rent: &Range, cost: &Range) -> Range {
    Range::new(
        gross_yield(rent.min, cost.max),
        gross_yield(rent.max, cost.min),
    )
}

/// Largest net seller price reachable with an all-in budget once every
/// buyer-side fee is backed out.
///
/// With a validated policy the divisor is at least 1.
pub fn max_net_seller_budget(
    total_budget: Decimal,
    age: PropertyAge,
    policy: &CalculationPolicy,
) -> Decimal {
    total_budget / (Decimal::ONE + policy.total_fee_rate(age))
}
