use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::BudgetBounds;
use crate::error::{ImmoError, Result};

// ---------------------------------------------------------------------------
// PropertyAge
// ---------------------------------------------------------------------------

/// Existing ("ancien") or new-build ("neuf") property. Selects the notary rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyAge {
    Existing,
    New,
}

impl FromStr for PropertyAge {
    type Err = ImmoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "existing" | "ancien" => Ok(PropertyAge::Existing),
            "new" | "neuf" => Ok(PropertyAge::New),
            other => Err(ImmoError::Validation(format!(
                "unknown property age '{other}' (expected existing or new)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// UnitType
// ---------------------------------------------------------------------------

/// French apartment typology, T1 (studio) to T5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    T1,
    T2,
    T3,
    T4,
    T5,
}

impl UnitType {
    pub const ALL: [UnitType; 5] = [
        UnitType::T1,
        UnitType::T2,
        UnitType::T3,
        UnitType::T4,
        UnitType::T5,
    ];
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for UnitType {
    type Err = ImmoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "T1" => Ok(UnitType::T1),
            "T2" => Ok(UnitType::T2),
            "T3" => Ok(UnitType::T3),
            "T4" => Ok(UnitType::T4),
            "T5" => Ok(UnitType::T5),
            other => Err(ImmoError::Validation(format!(
                "unknown unit type '{other}' (expected T1 to T5)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RenovationLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenovationLevel {
    None,
    Light,
    Heavy,
}

impl FromStr for RenovationLevel {
    type Err = ImmoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "aucune" => Ok(RenovationLevel::None),
            "light" | "rafraichissement" => Ok(RenovationLevel::Light),
            "heavy" | "lourde" => Ok(RenovationLevel::Heavy),
            other => Err(ImmoError::Validation(format!(
                "unknown renovation level '{other}' (expected none, light or heavy)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// InvestmentForm
// ---------------------------------------------------------------------------

/// Raw investment parameters as collected by a front end.
///
/// Enum fields stay strings here so that unknown values surface as
/// [`ImmoError::Validation`] from [`validate`](Self::validate) instead of a
/// deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentForm {
    pub city: String,
    pub total_budget: Decimal,
    #[serde(default)]
    pub renovation_budget: Option<Decimal>,
    pub property_age: String,
    pub unit_type: String,
    pub renovation_level: String,
    #[serde(default)]
    pub goal: String,
}

impl InvestmentForm {
    /// Check the form and build an immutable [`InvestmentRequest`].
    pub fn validate(&self, bounds: &BudgetBounds) -> Result<InvestmentRequest> {
        let city = self.city.trim();
        if city.is_empty() {
            return Err(ImmoError::Validation("city is required".into()));
        }

        if self.total_budget <= Decimal::ZERO {
            return Err(ImmoError::Validation(format!(
                "total budget must be positive, got {}",
                self.total_budget
            )));
        }
        if !bounds.contains(self.total_budget) {
            let max = bounds
                .max
                .map(|m| m.to_string())
                .unwrap_or_else(|| "unbounded".to_string());
            return Err(ImmoError::Validation(format!(
                "total budget {} outside accepted range {}..={}",
                self.total_budget, bounds.min, max
            )));
        }

        let renovation_budget = self.renovation_budget.unwrap_or(Decimal::ZERO);
        if renovation_budget < Decimal::ZERO {
            return Err(ImmoError::Validation(format!(
                "renovation budget cannot be negative, got {renovation_budget}"
            )));
        }

        Ok(InvestmentRequest {
            city: city.to_string(),
            total_budget: self.total_budget,
            renovation_budget,
            property_age: self.property_age.parse()?,
            unit_type: self.unit_type.parse()?,
            renovation_level: self.renovation_level.parse()?,
            goal: self.goal.trim().to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// InvestmentRequest
// ---------------------------------------------------------------------------

/// A validated investment request. Only obtainable through
/// [`InvestmentForm::validate`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentRequest {
    city: String,
    total_budget: Decimal,
    renovation_budget: Decimal,
    property_age: PropertyAge,
    unit_type: UnitType,
    renovation_level: RenovationLevel,
    goal: String,
}

impl InvestmentRequest {
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn total_budget(&self) -> Decimal {
        self.total_budget
    }

    pub fn renovation_budget(&self) -> Decimal {
        self.renovation_budget
    }

    pub fn property_age(&self) -> PropertyAge {
        self.property_age
    }

    pub fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    pub fn renovation_level(&self) -> RenovationLevel {
        self.renovation_level
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }
}
