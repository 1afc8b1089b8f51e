//! Per-line price resolution
//!
//! Resolves a line's original and effective unit prices from its
//! [`DiscountKind`]. The stored unit price means something different for
//! each kind — for promotional and wholesale lines it is already the
//! charged price, for variant-sale lines it may have drifted from the
//! markdown fields on older records — so this module is the only place
//! that asymmetry is interpreted. Everything downstream works from the
//! resolved values, never from the stored price directly.

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};

use crate::{
    items::{DiscountKind, LineItem},
    money,
};

/// External source for undiscounted base unit prices.
///
/// Wholesale-tier lines store the discounted tier price as their unit
/// price; the undiscounted price lives with the variant catalog and is
/// supplied by the caller through this seam.
pub trait BasePriceSource {
    /// Returns the undiscounted base unit price for a variant, if known.
    fn base_unit_price(&self, variant_id: &str) -> Option<Money<'static, Currency>>;
}

/// A base-price source with no entries.
///
/// Wholesale-tier lines resolve with no visible discount, which is the
/// documented degraded behavior when the catalog price is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBasePrices;

impl BasePriceSource for NoBasePrices {
    fn base_unit_price(&self, _variant_id: &str) -> Option<Money<'static, Currency>> {
        None
    }
}

impl BasePriceSource for FxHashMap<String, Money<'static, Currency>> {
    fn base_unit_price(&self, variant_id: &str) -> Option<Money<'static, Currency>> {
        self.get(variant_id).copied()
    }
}

/// The resolved prices for one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLinePrice<'a> {
    original_unit: Money<'a, Currency>,
    effective_unit: Money<'a, Currency>,
    line_discount: Money<'a, Currency>,
}

impl<'a> ResolvedLinePrice<'a> {
    /// The undiscounted per-unit price.
    pub fn original_unit(&self) -> &Money<'a, Currency> {
        &self.original_unit
    }

    /// The per-unit price the customer actually pays.
    pub fn effective_unit(&self) -> &Money<'a, Currency> {
        &self.effective_unit
    }

    /// `(original − effective) × quantity`, clamped at zero.
    pub fn line_discount(&self) -> &Money<'a, Currency> {
        &self.line_discount
    }
}

/// Resolves the original and effective unit prices for one line.
///
/// This function is total: corrupt metadata (negative amounts, discounts
/// exceeding the price, a base price below the tier price) degrades to a
/// zero discount rather than an error.
pub fn resolve_line_price<'a>(
    line: &LineItem<'a>,
    base_prices: &impl BasePriceSource,
) -> ResolvedLinePrice<'a> {
    let unit = money::floor_zero(line.unit_price());

    let (original, effective) = match line.discount() {
        DiscountKind::None => (unit, unit),

        // The stored unit price is already the charged price; the
        // original is reconstructed by adding the reward discount back.
        DiscountKind::Promotional { discount_per_unit } => {
            let discount = money::floor_zero(&discount_per_unit);

            (add(&unit, &discount), unit)
        }

        DiscountKind::VariantSale {
            discount_per_unit,
            original_unit_price,
        } => {
            let discount = money::floor_zero(&discount_per_unit);

            // Records created before original-price capture existed have
            // no stored original; reconstruct it from the markdown.
            let original = match original_unit_price {
                Some(original) => money::floor_zero(&original),
                None => add(&unit, &discount),
            };

            // Recomputed rather than read from the stored unit price,
            // which may have drifted from the markdown fields on older
            // records.
            let effective = money::sub_or_zero(&original, &discount);

            (original, effective)
        }

        // The stored unit price already is the tier price. A lookup miss
        // means no visible discount.
        DiscountKind::WholesaleTier => {
            let original = base_prices
                .base_unit_price(line.variant_id())
                .map_or(unit, |base| money::floor_zero(&base));

            (original, unit)
        }
    };

    let per_unit_discount = money::sub_or_zero(&original, &effective);

    ResolvedLinePrice {
        original_unit: original,
        effective_unit: effective,
        line_discount: money::scale(&per_unit_discount, line.quantity()),
    }
}

fn add<'a>(lhs: &Money<'a, Currency>, rhs: &Money<'_, Currency>) -> Money<'a, Currency> {
    let minor = lhs.to_minor_units().saturating_add(rhs.to_minor_units());

    Money::from_minor(minor, lhs.currency())
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rusty_money::iso::USD;

    use super::*;

    fn qty(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
    }

    #[test]
    fn plain_line_resolves_to_its_unit_price() {
        let line = LineItem::new("v1", Money::from_minor(500, USD), qty(3));
        let resolved = resolve_line_price(&line, &NoBasePrices);

        assert_eq!(resolved.original_unit(), &Money::from_minor(500, USD));
        assert_eq!(resolved.effective_unit(), &Money::from_minor(500, USD));
        assert_eq!(resolved.line_discount(), &Money::from_minor(0, USD));
    }

    #[test]
    fn promotional_line_reconstructs_the_original_price() {
        let line = LineItem::with_discount(
            "v1",
            Money::from_minor(800, USD),
            qty(2),
            DiscountKind::Promotional {
                discount_per_unit: Money::from_minor(200, USD),
            },
        );

        let resolved = resolve_line_price(&line, &NoBasePrices);

        assert_eq!(resolved.original_unit(), &Money::from_minor(1000, USD));
        assert_eq!(resolved.effective_unit(), &Money::from_minor(800, USD));
        assert_eq!(resolved.line_discount(), &Money::from_minor(400, USD));
    }

    #[test]
    fn variant_sale_uses_the_captured_original_price() {
        let line = LineItem::with_discount(
            "v1",
            Money::from_minor(4500, USD),
            qty(2),
            DiscountKind::VariantSale {
                discount_per_unit: Money::from_minor(500, USD),
                original_unit_price: Some(Money::from_minor(5000, USD)),
            },
        );

        let resolved = resolve_line_price(&line, &NoBasePrices);

        assert_eq!(resolved.original_unit(), &Money::from_minor(5000, USD));
        assert_eq!(resolved.effective_unit(), &Money::from_minor(4500, USD));
        assert_eq!(resolved.line_discount(), &Money::from_minor(1000, USD));
    }

    #[test]
    fn variant_sale_falls_back_to_reconstruction() {
        // Records older than original-price capture carry no original.
        let line = LineItem::with_discount(
            "v1",
            Money::from_minor(700, USD),
            qty(1),
            DiscountKind::VariantSale {
                discount_per_unit: Money::from_minor(300, USD),
                original_unit_price: None,
            },
        );

        let resolved = resolve_line_price(&line, &NoBasePrices);

        assert_eq!(resolved.original_unit(), &Money::from_minor(1000, USD));
        assert_eq!(resolved.effective_unit(), &Money::from_minor(700, USD));
        assert_eq!(resolved.line_discount(), &Money::from_minor(300, USD));
    }

    #[test]
    fn variant_sale_effective_price_is_recomputed_not_stored() {
        // The stored unit price (999) drifted from the markdown fields;
        // the resolver trusts original − discount instead.
        let line = LineItem::with_discount(
            "v1",
            Money::from_minor(999, USD),
            qty(1),
            DiscountKind::VariantSale {
                discount_per_unit: Money::from_minor(500, USD),
                original_unit_price: Some(Money::from_minor(2000, USD)),
            },
        );

        let resolved = resolve_line_price(&line, &NoBasePrices);

        assert_eq!(resolved.effective_unit(), &Money::from_minor(1500, USD));
    }

    #[test]
    fn variant_sale_discount_exceeding_price_clamps_to_zero() {
        let line = LineItem::with_discount(
            "v1",
            Money::from_minor(100, USD),
            qty(1),
            DiscountKind::VariantSale {
                discount_per_unit: Money::from_minor(900, USD),
                original_unit_price: Some(Money::from_minor(400, USD)),
            },
        );

        let resolved = resolve_line_price(&line, &NoBasePrices);

        assert_eq!(resolved.effective_unit(), &Money::from_minor(0, USD));
        assert_eq!(resolved.line_discount(), &Money::from_minor(400, USD));
    }

    #[test]
    fn wholesale_line_reads_the_base_price_source() {
        let mut base_prices = FxHashMap::default();
        base_prices.insert("v1".to_string(), Money::from_minor(1200, USD));

        let line = LineItem::with_discount(
            "v1",
            Money::from_minor(1000, USD),
            qty(5),
            DiscountKind::WholesaleTier,
        );

        let resolved = resolve_line_price(&line, &base_prices);

        assert_eq!(resolved.original_unit(), &Money::from_minor(1200, USD));
        assert_eq!(resolved.effective_unit(), &Money::from_minor(1000, USD));
        assert_eq!(resolved.line_discount(), &Money::from_minor(1000, USD));
    }

    #[test]
    fn wholesale_lookup_miss_shows_no_discount() {
        let line = LineItem::with_discount(
            "v1",
            Money::from_minor(1000, USD),
            qty(5),
            DiscountKind::WholesaleTier,
        );

        let resolved = resolve_line_price(&line, &NoBasePrices);

        assert_eq!(resolved.original_unit(), &Money::from_minor(1000, USD));
        assert_eq!(resolved.line_discount(), &Money::from_minor(0, USD));
    }

    #[test]
    fn wholesale_base_below_tier_price_clamps_the_discount() {
        let mut base_prices = FxHashMap::default();
        base_prices.insert("v1".to_string(), Money::from_minor(800, USD));

        let line = LineItem::with_discount(
            "v1",
            Money::from_minor(1000, USD),
            qty(2),
            DiscountKind::WholesaleTier,
        );

        let resolved = resolve_line_price(&line, &base_prices);

        assert_eq!(resolved.line_discount(), &Money::from_minor(0, USD));
    }

    #[test]
    fn negative_stored_prices_are_rejected() {
        let line = LineItem::with_discount(
            "v1",
            Money::from_minor(-500, USD),
            qty(1),
            DiscountKind::Promotional {
                discount_per_unit: Money::from_minor(-200, USD),
            },
        );

        let resolved = resolve_line_price(&line, &NoBasePrices);

        assert_eq!(resolved.original_unit(), &Money::from_minor(0, USD));
        assert_eq!(resolved.effective_unit(), &Money::from_minor(0, USD));
        assert_eq!(resolved.line_discount(), &Money::from_minor(0, USD));
    }
}
