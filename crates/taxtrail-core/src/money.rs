//! Fixed-point monetary amounts.
//!
//! Audit values must compare numerically and render canonically, so money
//! is carried as whole cents rather than floats or strings. The canonical
//! rendering (`"1234.56"`) is what lands in `old_value` / `new_value`
//! history columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A dollar amount in whole cents. May be negative (credits, corrections).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
  pub const ZERO: Money = Money(0);

  pub const fn from_cents(cents: i64) -> Self { Self(cents) }

  /// Build from whole dollars, e.g. `Money::from_dollars(1200)` → 1200.00.
  pub const fn from_dollars(dollars: i64) -> Self { Self(dollars * 100) }

  pub const fn cents(self) -> i64 { self.0 }

  pub const fn is_positive(self) -> bool { self.0 > 0 }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.0 < 0 { "-" } else { "" };
    let abs = self.0.unsigned_abs();
    write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
  }
}

/// Error parsing a decimal money string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid money amount: {0:?}")]
pub struct ParseMoneyError(pub String);

impl FromStr for Money {
  type Err = ParseMoneyError;

  /// Accepts `"1234"`, `"1234.5"`, `"1234.56"`, with an optional leading
  /// sign. More than two fractional digits is an error — amounts are
  /// exact cents, never rounded silently.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let err = || ParseMoneyError(s.to_owned());

    let (sign, body) = match s.strip_prefix('-') {
      Some(rest) => (-1i64, rest),
      None => (1i64, s.strip_prefix('+').unwrap_or(s)),
    };

    let (whole, frac) = match body.split_once('.') {
      Some((w, f)) => (w, f),
      None => (body, ""),
    };

    if whole.is_empty() || frac.len() > 2 {
      return Err(err());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit())
      || !frac.bytes().all(|b| b.is_ascii_digit())
    {
      return Err(err());
    }

    let dollars: i64 = whole.parse().map_err(|_| err())?;
    let cents: i64 = match frac.len() {
      0 => 0,
      1 => frac.parse::<i64>().map_err(|_| err())? * 10,
      _ => frac.parse().map_err(|_| err())?,
    };

    dollars
      .checked_mul(100)
      .and_then(|d| d.checked_add(cents))
      .and_then(|c| c.checked_mul(sign))
      .map(Money)
      .ok_or_else(err)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_canonical_two_decimals() {
    assert_eq!(Money::from_cents(100_000).to_string(), "1000.00");
    assert_eq!(Money::from_cents(120_050).to_string(), "1200.50");
    assert_eq!(Money::from_cents(7).to_string(), "0.07");
    assert_eq!(Money::from_cents(-2550).to_string(), "-25.50");
  }

  #[test]
  fn parses_decimal_forms() {
    assert_eq!("1000.00".parse::<Money>().unwrap(), Money::from_cents(100_000));
    assert_eq!("1234.5".parse::<Money>().unwrap(), Money::from_cents(123_450));
    assert_eq!("42".parse::<Money>().unwrap(), Money::from_cents(4200));
    assert_eq!("-3.07".parse::<Money>().unwrap(), Money::from_cents(-307));
  }

  #[test]
  fn rejects_malformed_amounts() {
    for bad in ["", ".", "1.234", "12a.00", "1,000.00", "--5"] {
      assert!(bad.parse::<Money>().is_err(), "accepted {bad:?}");
    }
  }

  #[test]
  fn display_parse_roundtrip() {
    for cents in [0, 1, 99, 100, -100, 123_456_789] {
      let m = Money::from_cents(cents);
      assert_eq!(m.to_string().parse::<Money>().unwrap(), m);
    }
  }
}
