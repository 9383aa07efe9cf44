//! Parsing of user-entered money amounts.
//!
//! Accepts an optional leading sign and currency symbol and thousands
//! separators in any grouping, so `"₹5,00,000"`, `"$1,200.50"` and
//! `"-€40"` all parse. Empty input is zero.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a money amount.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid amount '{input}'")]
pub struct ParseMoneyError {
    input: String,
}

impl ParseMoneyError {
    pub fn input(&self) -> &str {
        &self.input
    }
}

fn money_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<sign>-)?\s*(?:[$€£¥₹]|Rs\.?)?\s*(?P<amount>[0-9][0-9,_]*(?:\.[0-9]+)?|\.[0-9]+)$")
            .expect("money pattern is a valid regex")
    })
}

/// Parses a money string into a [`Decimal`].
///
/// ```
/// use rust_decimal_macros::dec;
/// use finance_data::money::parse_money;
///
/// assert_eq!(parse_money("₹5,00,000").unwrap(), dec!(500000));
/// assert_eq!(parse_money(" $1,200.50 ").unwrap(), dec!(1200.50));
/// assert_eq!(parse_money("").unwrap(), dec!(0));
/// ```
pub fn parse_money(s: &str) -> Result<Decimal, ParseMoneyError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let err = || ParseMoneyError {
        input: s.to_string(),
    };
    let captures = money_pattern().captures(trimmed).ok_or_else(err)?;
    let digits: String = captures["amount"]
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    let amount: Decimal = digits.parse().map_err(|_| err())?;

    if captures.name("sign").is_some() {
        Ok(-amount)
    } else {
        Ok(amount)
    }
}

/// Parses an optional money string; empty input is `None`.
pub fn parse_optional_money(s: &str) -> Result<Option<Decimal>, ParseMoneyError> {
    if s.trim().is_empty() {
        Ok(None)
    } else {
        parse_money(s).map(Some)
    }
}

/// Serde adapter for money cells in CSV files.
pub(crate) fn deserialize_money<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_money(&s).map_err(serde::de::Error::custom)
}

/// Serde adapter for optional money cells; empty cells become `None`.
pub(crate) fn deserialize_optional_money<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) => parse_optional_money(&s).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    #[rstest]
    #[case("1,234.56", dec!(1234.56))]
    #[case("1,234,567.89", dec!(1234567.89))]
    #[case("12,34,567", dec!(1234567))]
    #[case("  123.45  ", dec!(123.45))]
    #[case("$99", dec!(99))]
    #[case("Rs. 2,500", dec!(2500))]
    #[case("-€40", dec!(-40))]
    #[case(".5", dec!(0.5))]
    #[case("1_000", dec!(1000))]
    fn parse_money_accepts(
        #[case] input: &str,
        #[case] expected: Decimal,
    ) {
        assert_eq!(parse_money(input), Ok(expected));
    }

    #[rstest]
    #[case("abc")]
    #[case("12.3.4")]
    #[case("$")]
    #[case("1.2e5")]
    fn parse_money_rejects(#[case] input: &str) {
        let err = parse_money(input).expect_err("expected parse failure");

        assert_eq!(err.input(), input);
    }

    #[test]
    fn parse_money_empty_treated_as_zero() {
        assert_eq!(parse_money(""), Ok(Decimal::ZERO));
        assert_eq!(parse_money("   "), Ok(Decimal::ZERO));
    }

    #[test]
    fn parse_optional_money_handles_empty() {
        assert_eq!(parse_optional_money(""), Ok(None));
        assert_eq!(parse_optional_money("1,000"), Ok(Some(dec!(1000))));
    }
}
