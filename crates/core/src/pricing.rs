//! Order-request pricing arithmetic.
//!
//! The original system recomputed order totals at each call site and stored
//! whatever the caller supplied; totals drifted from the line items. Here the
//! total is derived in exactly one place and repositories never accept a
//! caller-provided total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pricing for a single order request.
///
/// Invariant: `total() == unit_price * quantity + delivery_fee`, rounded to
/// two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPricing {
    /// Price per unit at the time the request was made (after any discount).
    pub unit_price: Decimal,
    /// Number of units requested.
    pub quantity: u32,
    /// Flat delivery fee for the request.
    pub delivery_fee: Decimal,
}

/// Errors validating order pricing inputs.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    /// Quantity must be at least 1.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// Unit price must not be negative.
    #[error("unit price must not be negative")]
    NegativeUnitPrice,
    /// Delivery fee must not be negative.
    #[error("delivery fee must not be negative")]
    NegativeDeliveryFee,
}

impl OrderPricing {
    /// Create validated pricing.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the quantity is zero or either amount
    /// is negative.
    pub fn new(
        unit_price: Decimal,
        quantity: u32,
        delivery_fee: Decimal,
    ) -> Result<Self, PricingError> {
        if quantity == 0 {
            return Err(PricingError::ZeroQuantity);
        }
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(PricingError::NegativeUnitPrice);
        }
        if delivery_fee.is_sign_negative() && !delivery_fee.is_zero() {
            return Err(PricingError::NegativeDeliveryFee);
        }
        Ok(Self {
            unit_price,
            quantity,
            delivery_fee,
        })
    }

    /// The order total: `unit_price * quantity + delivery_fee`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        (self.unit_price * Decimal::from(self.quantity) + self.delivery_fee).round_dp(2)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_total() {
        let pricing = OrderPricing::new(Decimal::new(1250, 2), 3, Decimal::new(499, 2)).unwrap();
        assert_eq!(pricing.total(), Decimal::new(4249, 2)); // 12.50*3 + 4.99
    }

    #[test]
    fn test_total_no_fee() {
        let pricing = OrderPricing::new(Decimal::from(8), 2, Decimal::ZERO).unwrap();
        assert_eq!(pricing.total(), Decimal::from(16));
    }

    #[test]
    fn test_rejects_zero_quantity() {
        assert_eq!(
            OrderPricing::new(Decimal::ONE, 0, Decimal::ZERO),
            Err(PricingError::ZeroQuantity)
        );
    }

    #[test]
    fn test_rejects_negative_amounts() {
        assert_eq!(
            OrderPricing::new(Decimal::from(-1), 1, Decimal::ZERO),
            Err(PricingError::NegativeUnitPrice)
        );
        assert_eq!(
            OrderPricing::new(Decimal::ONE, 1, Decimal::from(-2)),
            Err(PricingError::NegativeDeliveryFee)
        );
    }

    #[test]
    fn test_total_rounds_to_cents() {
        let pricing = OrderPricing::new(Decimal::new(3333, 3), 3, Decimal::ZERO).unwrap();
        assert_eq!(pricing.total(), Decimal::new(1000, 2)); // 3.333*3 = 9.999 -> 10.00
    }
}
