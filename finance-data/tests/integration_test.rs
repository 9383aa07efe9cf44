//! Integration tests running the engine against the fixture files.

use std::fs::File;
use std::path::{Path, PathBuf};

use finance_core::calculations::{TaxAssessor, amortization_schedule, compute_tax, simulate};
use finance_core::{CategoryIncome, PayoffStrategy, SimulationScenario};
use finance_data::{
    RulesConfig, SlabLoaderError, SlabTableLoader, compare_regimes, compare_strategies, debt_loader,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const TEST_SLABS: &str = include_str!("../test-data/slabs.csv");
const TEST_DEBTS: &str = include_str!("../test-data/debts.csv");

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data").join(name)
}

fn rules() -> RulesConfig {
    RulesConfig::load(&fixture("rules.toml")).expect("Failed to load rules fixture")
}

// =============================================================================
// Slab tables
// =============================================================================

#[test]
fn test_slab_csv_tables_compute_tax() {
    let tables = SlabTableLoader::load(TEST_SLABS.as_bytes()).expect("Failed to load slabs");

    let new = compute_tax(dec!(1000000), &tables["new"]).expect("valid table");
    let old = compute_tax(dec!(1000000), &tables["old"]).expect("valid table");

    assert_eq!(new.total_tax, dec!(60000));
    assert_eq!(new.per_slab.len(), 6);
    assert_eq!(new.effective_rate, dec!(0.06));
    assert_eq!(old.total_tax, dec!(112500));
}

#[test]
fn test_slab_csv_from_file_matches_embedded() {
    let file = File::open(fixture("slabs.csv")).expect("Failed to open fixture");

    let from_file = SlabTableLoader::load(file).expect("Failed to load slabs");
    let embedded = SlabTableLoader::load(TEST_SLABS.as_bytes()).expect("Failed to load slabs");

    assert_eq!(from_file, embedded);
}

#[test]
fn test_unknown_regime_lookup() {
    let tables = SlabTableLoader::load(TEST_SLABS.as_bytes()).expect("Failed to load slabs");

    let err = tables
        .get("flat")
        .ok_or_else(|| SlabLoaderError::UnknownRegime("flat".to_string()))
        .expect_err("regime should be missing");

    assert_eq!(err.to_string(), "slab table 'flat' not found");
}

// =============================================================================
// Rules file and assessment
// =============================================================================

#[test]
fn test_rules_fixture_loads() {
    let config = rules();

    assert_eq!(config.regimes.len(), 2);
    assert_eq!(config.categories.len(), 4);
    assert_eq!(config.regime("old", Some(2025)).unwrap().standard_deduction, dec!(50000));
}

#[test]
fn test_assess_salary_and_categories() {
    let config = rules();
    let regime = config.regime("new", None).expect("regime exists");
    let incomes = vec![
        CategoryIncome::new("capital_gains_long", dec!(150000)),
        CategoryIncome::new("rental", dec!(100000)),
        CategoryIncome::new("agricultural", dec!(50000)),
    ];

    let assessment = TaxAssessor::new(regime, &config.categories)
        .assess(dec!(1075000), &incomes)
        .expect("assessment should succeed");

    assert_eq!(assessment.taxable_salary, dec!(1000000));
    assert_eq!(assessment.slab_result.total_tax, dec!(60000));
    let category_taxes: Vec<_> = assessment.category_taxes.iter().map(|c| c.tax).collect();
    assert_eq!(category_taxes, vec![dec!(5000), dec!(21000), dec!(0)]);
    assert_eq!(assessment.tax_before_cess, dec!(86000));
    assert_eq!(assessment.cess, dec!(3440));
    assert_eq!(assessment.total_tax, dec!(89440));
    assert_eq!(assessment.gross_income, dec!(1375000));
}

#[test]
fn test_compare_regimes_from_rules_file() {
    let config = rules();
    let new = config.regime("new", Some(2025)).unwrap();
    let old = config.regime("old", Some(2025)).unwrap();

    let comparison =
        compare_regimes(old, new, &config.categories, dec!(1075000), &[]).expect("valid regimes");

    assert_eq!(comparison.first.total_tax, dec!(124800));
    assert_eq!(comparison.second.total_tax, dec!(62400));
    assert_eq!(comparison.cheaper, "new");
    assert_eq!(comparison.savings, dec!(62400));
}

// =============================================================================
// Debts
// =============================================================================

#[test]
fn test_debts_fixture_loads_in_file_order() {
    let debts = debt_loader::load_from_file(&fixture("debts.csv")).expect("Failed to load debts");

    let ids: Vec<_> = debts.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["card", "car", "store"]);
    assert_eq!(debts[0].outstanding_balance, dec!(3200.50));
    assert_eq!(debts[1].principal, dec!(8000));
}

#[test]
fn test_simulate_fixture_orders() {
    let debts = debt_loader::load_from_str(TEST_DEBTS).expect("Failed to load debts");

    let run = |strategy| {
        simulate(&SimulationScenario {
            debts: debts.clone(),
            extra_monthly_payment: dec!(100),
            strategy,
        })
        .expect("debts are payable")
    };
    let snowball = run(PayoffStrategy::Snowball);
    let avalanche = run(PayoffStrategy::Avalanche);

    assert_eq!(snowball.order, vec!["store", "card", "car"]);
    assert_eq!(avalanche.order, vec!["card", "store", "car"]);
    assert_eq!(snowball.per_debt_schedule.len(), 3);
    assert_eq!(
        snowball.total_paid,
        dec!(12400.50) + snowball.total_interest_paid
    );
}

#[test]
fn test_compare_strategies_recommends_avalanche() {
    let debts = debt_loader::load_from_str(TEST_DEBTS).expect("Failed to load debts");

    let comparison = compare_strategies(&debts, dec!(100)).expect("debts are payable");

    assert_eq!(comparison.snowball.total_months, 35);
    assert_eq!(comparison.avalanche.total_months, 34);
    assert_eq!(comparison.months_saved, 1);
    assert!(comparison.interest_saved > dec!(90));
    assert_eq!(comparison.recommended, PayoffStrategy::Avalanche);
}

#[test]
fn test_amortize_single_fixture_debt() {
    let debts = debt_loader::load_from_str(TEST_DEBTS).expect("Failed to load debts");
    let store = debts.iter().find(|d| d.id == "store").unwrap();

    let rows = amortization_schedule(store, dec!(100)).expect("payable");

    assert_eq!(rows[0].opening_balance, dec!(1200));
    assert_eq!(rows[0].interest, dec!(18));
    assert_eq!(rows.last().unwrap().closing_balance, dec!(0));
    assert!(rows.windows(2).all(|w| w[1].opening_balance == w[0].closing_balance));
}
