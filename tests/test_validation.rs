//! Form validation: budgets, bounds, enums, presence checks.

mod common;

use immo_calc::{
    BudgetBounds, Calculator, ImmoError, InvestmentForm, PropertyAge, RenovationLevel, UnitType,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn assert_validation_error(form: &InvestmentForm, needle: &str) {
    match form.validate(&BudgetBounds::default()) {
        Err(ImmoError::Validation(msg)) => {
            assert!(msg.contains(needle), "message '{msg}' lacks '{needle}'")
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn valid_form_builds_request() {
    let request = common::lyon_t2_form()
        .validate(&BudgetBounds::default())
        .unwrap();
    assert_eq!(request.city(), "Lyon");
    assert_eq!(request.total_budget(), dec!(300000));
    assert_eq!(request.renovation_budget(), Decimal::ZERO);
    assert_eq!(request.property_age(), PropertyAge::Existing);
    assert_eq!(request.unit_type(), UnitType::T2);
    assert_eq!(request.renovation_level(), RenovationLevel::None);
    assert_eq!(request.goal(), "patrimoine");
}

#[test]
fn french_enum_names_are_accepted() {
    let form = common::form("  Bordeaux ", dec!(250000), "t3", "Neuf", "rafraichissement");
    let request = form.validate(&BudgetBounds::default()).unwrap();
    assert_eq!(request.city(), "Bordeaux");
    assert_eq!(request.unit_type(), UnitType::T3);
    assert_eq!(request.property_age(), PropertyAge::New);
    assert_eq!(request.renovation_level(), RenovationLevel::Light);

    let heavy = common::form("Lille", dec!(250000), "T1", "ancien", "lourde")
        .validate(&BudgetBounds::default())
        .unwrap();
    assert_eq!(heavy.renovation_level(), RenovationLevel::Heavy);
    assert_eq!(heavy.property_age(), PropertyAge::Existing);
}

#[test]
fn zero_and_negative_budgets_are_rejected() {
    assert_validation_error(&common::form("Lyon", Decimal::ZERO, "T2", "existing", "none"), "positive");
    assert_validation_error(&common::form("Lyon", dec!(-1000), "T2", "existing", "none"), "positive");

    // Even without a lower bound.
    let zero = common::form("Lyon", Decimal::ZERO, "T2", "existing", "none");
    assert!(matches!(
        zero.validate(&BudgetBounds::positive()),
        Err(ImmoError::Validation(_))
    ));
}

#[test]
fn budget_outside_bounds_is_rejected() {
    assert_validation_error(&common::form("Lyon", dec!(49999), "T2", "existing", "none"), "outside");
    assert_validation_error(&common::form("Lyon", dec!(2000001), "T2", "existing", "none"), "outside");
}

#[test]
fn bounds_are_inclusive() {
    let bounds = BudgetBounds::default();
    assert!(bounds.contains(dec!(50000)));
    assert!(bounds.contains(dec!(2000000)));
    assert!(!bounds.contains(dec!(2000000.01)));
}

#[test]
fn positive_bounds_accept_large_budgets() {
    let form = common::form("Paris", dec!(5000000), "T5", "existing", "none");
    assert!(form.validate(&BudgetBounds::positive()).is_ok());
}

#[test]
fn blank_city_is_rejected() {
    assert_validation_error(&common::form("   ", dec!(300000), "T2", "existing", "none"), "city");
}

#[test]
fn unknown_enums_are_rejected() {
    assert_validation_error(&common::form("Lyon", dec!(300000), "T6", "existing", "none"), "unit type");
    assert_validation_error(&common::form("Lyon", dec!(300000), "T2", "ruin", "none"), "property age");
    assert_validation_error(&common::form("Lyon", dec!(300000), "T2", "existing", "total"), "renovation level");
}

#[test]
fn negative_renovation_budget_is_rejected() {
    let mut form = common::lyon_t2_form();
    form.renovation_budget = Some(dec!(-5000));
    assert_validation_error(&form, "renovation budget");
}

#[test]
fn form_deserializes_from_camel_case_json() {
    let json = r#"{
        "city": "Nantes",
        "totalBudget": 320000,
        "renovationBudget": 15000,
        "propertyAge": "existing",
        "unitType": "T2",
        "renovationLevel": "light",
        "goal": "rendement"
    }"#;
    let form: InvestmentForm = serde_json::from_str(json).unwrap();
    let request = form.validate(&BudgetBounds::default()).unwrap();
    assert_eq!(request.total_budget(), dec!(320000));
    assert_eq!(request.renovation_budget(), dec!(15000));
    assert_eq!(request.goal(), "rendement");
}

#[test]
fn calculator_does_not_compute_invalid_forms() {
    let calculator = Calculator::builder().build();
    let form = common::form("Lyon", dec!(10), "T2", "existing", "none");
    assert!(matches!(calculator.evaluate(&form), Err(ImmoError::Validation(_))));
}

#[test]
fn calculator_respects_custom_bounds() {
    let calculator = Calculator::builder()
        .bounds(BudgetBounds::new(dec!(100000), dec!(500000)))
        .build();
    assert!(calculator.validate(&common::lyon_t2_form()).is_ok());
    assert!(calculator
        .validate(&common::form("Lyon", dec!(600000), "T2", "existing", "none"))
        .is_err());
}
