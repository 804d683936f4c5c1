//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices are stored as `NUMERIC(10,2)` and carried around as
//! [`Decimal`]. A [`Price`] pairs an amount with its currency for display.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the storefront's default currency.
    #[must_use]
    pub fn inr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::INR)
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Sum of two prices, or `None` if the currencies differ.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(&self, other: &Self) -> Option<Self> {
        (self.currency_code == other.currency_code)
            .then(|| Self::new(self.amount + other.amount, self.currency_code))
    }

    /// Format for display, e.g. `₹1,234.50`.
    ///
    /// Amounts are rounded half-away-from-zero to two places and grouped in
    /// thousands.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() { "-" } else { "" };
        let text = format!("{:.2}", rounded.abs());
        let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));
        format!(
            "{sign}{}{}.{frac}",
            self.currency_code.symbol(),
            group_thousands(whole)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let price = Price::inr(Decimal::new(4050, 2));
        assert_eq!(price.line_total(3).amount, Decimal::new(12150, 2));
    }

    #[test]
    fn test_add() {
        let subtotal = Price::inr(Decimal::new(12150, 2));
        let delivery = Price::inr(Decimal::new(40, 0));
        assert_eq!(subtotal.add(&delivery), Some(Price::inr(Decimal::new(16150, 2))));

        let usd = Price::new(Decimal::ONE, CurrencyCode::USD);
        assert_eq!(subtotal.add(&usd), None);
    }

    #[test]
    fn test_display_small() {
        assert_eq!(Price::inr(Decimal::new(5, 0)).display(), "₹5.00");
    }

    #[test]
    fn test_display_grouped() {
        assert_eq!(Price::inr(Decimal::new(123_456_75, 2)).display(), "₹123,456.75");
        assert_eq!(Price::inr(Decimal::new(1000, 0)).display(), "₹1,000.00");
    }

    #[test]
    fn test_display_rounds() {
        assert_eq!(Price::inr(Decimal::new(10_005, 3)).display(), "₹10.01");
    }

    #[test]
    fn test_display_usd() {
        let price = Price::new(Decimal::new(199, 2), CurrencyCode::USD);
        assert_eq!(price.to_string(), "$1.99");
    }
}
