//! Cart snapshot handed over by the (external) cart component.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One (variant, quantity) pair with the unit price it was sold at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub variant_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl CartLine {
    pub fn new(variant_id: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            variant_id: variant_id.into(),
            quantity,
            unit_price,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Immutable view of the cart at the moment the operator picked a payment method.
///
/// `tax_rate` is a fraction (`0.08` for 8%), applied after the discount.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
    discount: Decimal,
    tax_rate: Decimal,
}

impl CartSnapshot {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self {
            lines,
            discount: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
        }
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_tax_rate(mut self, tax_rate: Decimal) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// True when there is nothing to sell: no lines, or only zero-quantity lines.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.quantity == 0)
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Discount actually applied, clamped to `[0, subtotal]`.
    pub fn applied_discount(&self) -> Decimal {
        self.discount.max(Decimal::ZERO).min(self.subtotal())
    }

    pub fn tax(&self) -> Decimal {
        ((self.subtotal() - self.applied_discount()) * self.tax_rate)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// subtotal − discount + tax
    pub fn total_due(&self) -> Decimal {
        self.subtotal() - self.applied_discount() + self.tax()
    }
}
