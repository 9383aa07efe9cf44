use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::round_half_up;

/// A single debt as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    pub id: String,
    pub principal: Decimal,
    pub outstanding_balance: Decimal,
    pub annual_rate_percent: Decimal,
    pub minimum_payment: Decimal,
}

impl Debt {
    /// Creates a debt whose principal equals its current balance.
    pub fn new(
        id: impl Into<String>,
        outstanding_balance: Decimal,
        annual_rate_percent: Decimal,
        minimum_payment: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            principal: outstanding_balance,
            outstanding_balance,
            annual_rate_percent,
            minimum_payment,
        }
    }
}

/// Order in which surplus budget is directed at outstanding debts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoffStrategy {
    /// Smallest outstanding balance first.
    Snowball,
    /// Highest annual rate first.
    Avalanche,
}

impl PayoffStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snowball => "snowball",
            Self::Avalanche => "avalanche",
        }
    }
}

impl fmt::Display for PayoffStrategy {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown payoff strategy '{0}' (expected snowball or avalanche)")]
pub struct ParseStrategyError(String);

impl FromStr for PayoffStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snowball" => Ok(Self::Snowball),
            "avalanche" => Ok(Self::Avalanche),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Everything a single payoff simulation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationScenario {
    pub debts: Vec<Debt>,
    #[serde(default)]
    pub extra_monthly_payment: Decimal,
    pub strategy: PayoffStrategy,
}

/// How one debt fared in a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtPayoff {
    pub debt_id: String,
    /// Month index (1-based) in which the balance reached zero; 0 if the debt
    /// started at zero.
    pub months_to_payoff: u32,
    pub interest_paid: Decimal,
}

/// Outcome of simulating one strategy to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffStrategyResult {
    pub strategy: PayoffStrategy,
    /// Debt ids in targeting priority.
    pub order: Vec<String>,
    pub total_months: u32,
    pub total_interest_paid: Decimal,
    /// Starting balances plus all interest accrued.
    pub total_paid: Decimal,
    /// Per-debt outcome, in the same order as `order`.
    pub per_debt_schedule: Vec<DebtPayoff>,
}

impl PayoffStrategyResult {
    /// Returns a copy with every money amount rounded half-up to cents.
    pub fn rounded(&self) -> Self {
        Self {
            strategy: self.strategy,
            order: self.order.clone(),
            total_months: self.total_months,
            total_interest_paid: round_half_up(self.total_interest_paid),
            total_paid: round_half_up(self.total_paid),
            per_debt_schedule: self
                .per_debt_schedule
                .iter()
                .map(|entry| DebtPayoff {
                    debt_id: entry.debt_id.clone(),
                    months_to_payoff: entry.months_to_payoff,
                    interest_paid: round_half_up(entry.interest_paid),
                })
                .collect(),
        }
    }
}
