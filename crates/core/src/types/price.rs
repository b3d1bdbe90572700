//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
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

    /// Apply a percentage discount (0-100) and return the reduced price.
    ///
    /// Values outside 0-100 are clamped. The result is rounded to two
    /// decimal places.
    #[must_use]
    pub fn discounted(&self, percent: Decimal) -> Self {
        let percent = percent.clamp(Decimal::ZERO, Decimal::from(100));
        let factor = (Decimal::from(100) - percent) / Decimal::from(100);
        Self {
            amount: (self.amount * factor).round_dp(2),
            currency_code: self.currency_code,
        }
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{}", self.currency_code.symbol(), self.amount.round_dp(2))
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$19.99");
    }

    #[test]
    fn test_discounted() {
        let price = Price::new(Decimal::from(40), CurrencyCode::USD);
        let reduced = price.discounted(Decimal::from(25));
        assert_eq!(reduced.amount, Decimal::from(30));
    }

    #[test]
    fn test_discounted_clamps() {
        let price = Price::new(Decimal::from(40), CurrencyCode::USD);
        assert_eq!(price.discounted(Decimal::from(150)).amount, Decimal::ZERO);
        assert_eq!(price.discounted(Decimal::from(-10)).amount, price.amount);
    }

    #[test]
    fn test_discounted_rounds() {
        let price = Price::new(Decimal::new(999, 2), CurrencyCode::USD);
        // 9.99 * 2/3 rounds to 6.66 (banker's rounding on 6.6600)
        let reduced = price.discounted(Decimal::new(3333, 2));
        assert_eq!(reduced.amount.scale(), 2);
    }
}
