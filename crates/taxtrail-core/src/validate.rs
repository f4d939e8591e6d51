//! Record validation helpers carried over from the ingestion layer.
//!
//! Parcel identifier formats are county policy, not engine policy, so
//! these are plain predicates a caller applies before handing payloads to
//! the store. The tax-amount rule is applied by `add_property` itself.

use crate::money::Money;

/// $10 million ceiling on a single parcel's tax bill; anything above is
/// assumed to be a parse artifact from an upstream source.
pub const MAX_TAX_AMOUNT: Money = Money::from_cents(10_000_000 * 100);

/// A plausible tax amount: strictly positive and under [`MAX_TAX_AMOUNT`].
pub fn valid_tax_amount(amount: Money) -> bool {
  amount.is_positive() && amount < MAX_TAX_AMOUNT
}

/// Cobb County parcel id: 13 digits, dashes permitted as separators.
pub fn valid_cobb_parcel(id: &str) -> bool {
  let digits: Vec<u8> =
    id.bytes().filter(|b| *b != b'-').collect();
  digits.len() == 13 && digits.iter().all(u8::is_ascii_digit)
}

/// Clayton County parcel id: exactly 12 characters — 3 digits, 1 uppercase
/// letter, 8 digits.
pub fn valid_clayton_parcel(id: &str) -> bool {
  let b = id.as_bytes();
  b.len() == 12
    && b[..3].iter().all(u8::is_ascii_digit)
    && b[3].is_ascii_uppercase()
    && b[4..].iter().all(u8::is_ascii_digit)
}

/// DeKalb County property id: 6 digits, a hyphen, 2 digits.
pub fn valid_dekalb_parcel(id: &str) -> bool {
  let b = id.as_bytes();
  b.len() == 9
    && b[..6].iter().all(u8::is_ascii_digit)
    && b[6] == b'-'
    && b[7..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tax_amount_bounds() {
    assert!(valid_tax_amount(Money::from_cents(1)));
    assert!(valid_tax_amount(Money::from_dollars(9_999_999)));
    assert!(!valid_tax_amount(Money::ZERO));
    assert!(!valid_tax_amount(Money::from_dollars(-500)));
    assert!(!valid_tax_amount(MAX_TAX_AMOUNT));
    assert!(!valid_tax_amount(Money::from_dollars(10_000_001)));
  }

  #[test]
  fn cobb_parcel_formats() {
    assert!(valid_cobb_parcel("1234567890123"));
    assert!(valid_cobb_parcel("12-3456789-0123"));
    assert!(!valid_cobb_parcel("123456789012"));
    assert!(!valid_cobb_parcel("12345678901234"));
    assert!(!valid_cobb_parcel("123456789012A"));
  }

  #[test]
  fn clayton_parcel_formats() {
    assert!(valid_clayton_parcel("123A45678901"));
    assert!(!valid_clayton_parcel("123a45678901"));
    assert!(!valid_clayton_parcel("123456789012"));
    assert!(!valid_clayton_parcel("123A4567890"));
    assert!(!valid_clayton_parcel(""));
  }

  #[test]
  fn dekalb_parcel_formats() {
    assert!(valid_dekalb_parcel("123456-78"));
    assert!(!valid_dekalb_parcel("12345-678"));
    assert!(!valid_dekalb_parcel("12345678"));
    assert!(!valid_dekalb_parcel("123456-7a"));
  }
}
