//! Cart snapshots
//!
//! The immutable input to the totals pipeline: a list of line items plus
//! the cart-level discount metadata, taken as a read-only snapshot at
//! computation time (from cart state before checkout, from order state
//! after). Totals are derived from a snapshot on every render or charge
//! attempt, never cached, so identical snapshots always produce identical
//! breakdowns.

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::Currency};

use crate::{items::LineItem, pricing::BasePriceSource, totals::OrderTotals};

/// Cart-level discount metadata attached to a cart or order.
///
/// Every value is independently zero or absent; the upstream systems that
/// set them do not coordinate with each other. De-duplication against the
/// per-item categories happens in [`crate::discounts::resolve_cart_discounts`],
/// not here.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLevelDiscounts<'a> {
    /// The total discount recorded by the coupon/promotion engine.
    ///
    /// May already include promotional-item discounts, since both are
    /// applied by the same upstream automatic-discount mechanism.
    pub coupon_total: Money<'a, Currency>,

    /// Loyalty points redeemed against this cart.
    pub points_redeemed: u32,

    /// The monetary discount granted for the redeemed points.
    pub points_discount: Money<'a, Currency>,

    /// Discount granted by an active membership promotion.
    pub membership_promo_discount: Money<'a, Currency>,

    /// Display name of the membership promotion, when one applied.
    pub membership_promo_name: Option<String>,

    /// Discount granted by the customer's membership tier.
    pub tier_discount: Money<'a, Currency>,

    /// The tier discount as a fraction (e.g. `0.10` for 10%), for display.
    pub tier_discount_percentage: Option<Percentage>,

    /// Display name of the membership tier, when one applied.
    pub tier_name: Option<String>,

    /// Whether a free-shipping override applies to this cart.
    pub free_shipping_applied: bool,

    /// The shipping cost before the free-shipping override, kept for
    /// struck-through display.
    pub original_shipping_cost: Money<'a, Currency>,
}

impl CartLevelDiscounts<'_> {
    /// A cart with no cart-level discounts in the given currency.
    pub fn none(currency: &'static Currency) -> Self {
        CartLevelDiscounts {
            coupon_total: Money::from_minor(0, currency),
            points_redeemed: 0,
            points_discount: Money::from_minor(0, currency),
            membership_promo_discount: Money::from_minor(0, currency),
            membership_promo_name: None,
            tier_discount: Money::from_minor(0, currency),
            tier_discount_percentage: None,
            tier_name: None,
            free_shipping_applied: false,
            original_shipping_cost: Money::from_minor(0, currency),
        }
    }
}

/// A consistent snapshot of a cart or order.
///
/// The snapshot provider is responsible for serializing concurrent cart
/// mutations and for currency consistency across the lines; the engine
/// only reads.
#[derive(Debug, Clone)]
pub struct CartSnapshot<'a> {
    lines: Vec<LineItem<'a>>,
    cart_level: CartLevelDiscounts<'a>,
    shipping_total: Money<'a, Currency>,
    tax_total: Money<'a, Currency>,
    currency: &'static Currency,
}

impl<'a> CartSnapshot<'a> {
    /// Creates a snapshot from its parts.
    pub fn new(
        lines: impl Into<Vec<LineItem<'a>>>,
        cart_level: CartLevelDiscounts<'a>,
        shipping_total: Money<'a, Currency>,
        tax_total: Money<'a, Currency>,
        currency: &'static Currency,
    ) -> Self {
        CartSnapshot {
            lines: lines.into(),
            cart_level,
            shipping_total,
            tax_total,
            currency,
        }
    }

    /// The line items in the snapshot.
    pub fn lines(&self) -> &[LineItem<'a>] {
        &self.lines
    }

    /// The cart-level discount metadata.
    pub fn cart_level(&self) -> &CartLevelDiscounts<'a> {
        &self.cart_level
    }

    /// The quoted shipping cost, before any free-shipping override.
    pub fn shipping_total(&self) -> &Money<'a, Currency> {
        &self.shipping_total
    }

    /// The tax amount, computed by the external tax collaborator.
    pub fn tax_total(&self) -> &Money<'a, Currency> {
        &self.tax_total
    }

    /// The snapshot currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// The number of lines in the snapshot.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the snapshot has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Runs the full totals pipeline over this snapshot.
    ///
    /// This is the single entry point every display surface and the
    /// payment-charging path call; see [`OrderTotals::compute`].
    pub fn totals(&self, base_prices: &impl BasePriceSource) -> OrderTotals<'a> {
        OrderTotals::compute(self, base_prices)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rusty_money::iso::GBP;

    use super::*;

    fn qty(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
    }

    #[test]
    fn none_is_all_zeroes() {
        let cart = CartLevelDiscounts::none(GBP);

        assert_eq!(cart.coupon_total, Money::from_minor(0, GBP));
        assert_eq!(cart.points_redeemed, 0);
        assert!(!cart.free_shipping_applied);
        assert!(cart.tier_name.is_none());
    }

    #[test]
    fn snapshot_accessors() {
        let lines = [LineItem::new("v1", Money::from_minor(100, GBP), qty(1))];

        let snapshot = CartSnapshot::new(
            lines,
            CartLevelDiscounts::none(GBP),
            Money::from_minor(250, GBP),
            Money::from_minor(50, GBP),
            GBP,
        );

        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.shipping_total(), &Money::from_minor(250, GBP));
        assert_eq!(snapshot.tax_total(), &Money::from_minor(50, GBP));
        assert_eq!(snapshot.currency(), GBP);
    }

    #[test]
    fn empty_snapshot() {
        let snapshot = CartSnapshot::new(
            [],
            CartLevelDiscounts::none(GBP),
            Money::from_minor(0, GBP),
            Money::from_minor(0, GBP),
            GBP,
        );

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
    }
}
