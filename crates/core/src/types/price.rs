//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount with its currency.
///
/// Amounts are `rust_decimal::Decimal` in the currency's standard unit
/// (dollars, not cents), which keeps catalog prices exact and makes order
/// totals safe to sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Total for `quantity` units at this price.
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Option<Self> {
        let total = self.amount.checked_mul(Decimal::from(quantity))?;
        Some(Self::new(total, self.currency))
    }

    /// Add another price of the same currency.
    ///
    /// Returns `None` if the currencies differ or the sum overflows.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        let sum = self.amount.checked_add(other.amount)?;
        Some(Self::new(sum, self.currency))
    }

    /// Subtract another price of the same currency.
    ///
    /// Returns `None` if the currencies differ, the result would be negative,
    /// or the subtraction overflows.
    #[must_use]
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        let diff = self.amount.checked_sub(other.amount)?;
        if diff.is_sign_negative() {
            return None;
        }
        Some(Self::new(diff, self.currency))
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency.symbol(), self.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// ISO 4217 currency codes accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    Usd,
    Eur,
    Gbp,
    Inr,
}

impl CurrencyCode {
    /// The display symbol for this currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "\u{20ac}",
            Self::Gbp => "\u{a3}",
            Self::Inr => "\u{20b9}",
        }
    }

    /// The ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Inr => "INR",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "INR" => Ok(Self::Inr),
            other => Err(format!("unsupported currency code: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn usd(s: &str) -> Price {
        Price::new(s.parse().unwrap(), CurrencyCode::Usd)
    }

    #[test]
    fn test_line_total() {
        let price = usd("19.99");
        let total = price.line_total(3).unwrap();
        assert_eq!(total.amount, "59.97".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_checked_add_same_currency() {
        let sum = usd("10.00").checked_add(&usd("2.50")).unwrap();
        assert_eq!(sum.amount, "12.50".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let eur = Price::new("5".parse().unwrap(), CurrencyCode::Eur);
        assert!(usd("5").checked_add(&eur).is_none());
    }

    #[test]
    fn test_checked_sub_refuses_negative() {
        assert!(usd("5.00").checked_sub(&usd("7.00")).is_none());
        let diff = usd("7.00").checked_sub(&usd("5.00")).unwrap();
        assert_eq!(diff.amount, "2.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_display() {
        assert_eq!(usd("19.99").display(), "$19.99");
        assert_eq!(usd("5").display(), "$5.00");
    }

    #[test]
    fn test_currency_round_trip() {
        for code in ["USD", "EUR", "GBP", "INR"] {
            let parsed: CurrencyCode = code.parse().unwrap();
            assert_eq!(parsed.code(), code);
        }
        assert!("JPY".parse::<CurrencyCode>().is_err());
    }
}
