//! Metadata decoding
//!
//! Upstream carts and orders carry their discount state as loosely-typed
//! metadata blobs set by independent systems: `is_pwp_item` /
//! `pwp_discount_amount` on reward lines, `is_variant_discount` /
//! `variant_discount_amount` / `original_unit_price` on markdown lines,
//! `is_bulk_price` on wholesale lines, and the points / membership promo
//! / tier / free-shipping fields at cart level.
//!
//! Decoding is deliberately lenient: a missing or malformed field reads
//! as zero, false or absent, never as an error, and negative amounts are
//! clamped to zero on entry. A wrong discount is a recoverable business
//! outcome; a failed decode would block checkout.
//!
//! The boolean line flags are collapsed here, once, into a
//! [`DiscountKind`]; the first true flag wins in the order pwp, variant,
//! bulk, matching the flag-check order of the systems that write them.

use std::num::NonZeroU32;

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::ToPrimitive,
};
use rusty_money::{Money, iso::Currency};
use serde_json::Value;

use crate::{
    cart::CartLevelDiscounts,
    items::{DiscountKind, LineItem},
};

/// Decodes the discount kind of one line from its metadata blob.
pub fn discount_kind(metadata: &Value, currency: &'static Currency) -> DiscountKind<'static> {
    if flag(metadata, "is_pwp_item") {
        DiscountKind::Promotional {
            discount_per_unit: amount(metadata, "pwp_discount_amount", currency),
        }
    } else if flag(metadata, "is_variant_discount") {
        DiscountKind::VariantSale {
            discount_per_unit: amount(metadata, "variant_discount_amount", currency),
            original_unit_price: optional_amount(metadata, "original_unit_price", currency),
        }
    } else if flag(metadata, "is_bulk_price") {
        DiscountKind::WholesaleTier
    } else {
        DiscountKind::None
    }
}

/// Builds a line item from the raw fields an ORM row provides.
///
/// Returns `None` for a zero quantity: such a line cannot contribute to
/// any total and quantity is positive by construction everywhere inside
/// the engine.
pub fn line_item(
    variant_id: impl Into<String>,
    unit_price_minor: i64,
    quantity: u32,
    metadata: &Value,
    currency: &'static Currency,
) -> Option<LineItem<'static>> {
    let quantity = NonZeroU32::new(quantity)?;

    Some(LineItem::with_discount(
        variant_id,
        Money::from_minor(unit_price_minor.max(0), currency),
        quantity,
        discount_kind(metadata, currency),
    ))
}

/// Decodes the cart-level discount metadata.
///
/// `discount_total_minor` is the order's recorded `discount_total` — the
/// raw coupon total before de-duplication, which lives on the order row
/// rather than in the metadata blob.
pub fn cart_level_discounts(
    metadata: &Value,
    discount_total_minor: i64,
    currency: &'static Currency,
) -> CartLevelDiscounts<'static> {
    CartLevelDiscounts {
        coupon_total: Money::from_minor(discount_total_minor.max(0), currency),
        points_redeemed: count(metadata, "points_to_redeem"),
        points_discount: amount(metadata, "points_discount_amount", currency),
        membership_promo_discount: amount(metadata, "applied_membership_promo_discount", currency),
        membership_promo_name: text(metadata, "applied_membership_promo_name"),
        tier_discount: amount(metadata, "tier_discount_amount", currency),
        tier_discount_percentage: percentage(metadata, "tier_discount_percentage"),
        tier_name: text(metadata, "tier_name"),
        free_shipping_applied: flag(metadata, "free_shipping_applied"),
        original_shipping_cost: amount(metadata, "original_shipping_cost", currency),
    }
}

/// Reads a boolean flag; anything but a literal `true` reads as false.
fn flag(metadata: &Value, key: &str) -> bool {
    metadata.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Reads a minor-unit amount, clamped at zero; malformed values read as
/// zero.
fn amount<'a>(metadata: &Value, key: &str, currency: &'a Currency) -> Money<'a, Currency> {
    let minor = metadata.get(key).and_then(minor_units).unwrap_or(0);

    Money::from_minor(minor.max(0), currency)
}

/// Reads an amount that is meaningfully absent, as opposed to zero.
fn optional_amount<'a>(
    metadata: &Value,
    key: &str,
    currency: &'a Currency,
) -> Option<Money<'a, Currency>> {
    let minor = metadata.get(key).and_then(minor_units)?;

    Some(Money::from_minor(minor.max(0), currency))
}

/// Interprets a JSON number as minor units, rounding floats half away
/// from zero.
fn minor_units(value: &Value) -> Option<i64> {
    if let Some(minor) = value.as_i64() {
        return Some(minor);
    }

    value.as_f64().and_then(|float| {
        Decimal::from_f64_retain(float)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    })
}

/// Reads a non-negative count, saturating at `u32::MAX`.
fn count(metadata: &Value, key: &str) -> u32 {
    metadata
        .get(key)
        .and_then(Value::as_u64)
        .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Reads a non-empty string field.
fn text(metadata: &Value, key: &str) -> Option<String> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Reads a percentage given in percent points (e.g. `10` for 10%) as a
/// fraction.
fn percentage(metadata: &Value, key: &str) -> Option<Percentage> {
    let points = metadata
        .get(key)
        .and_then(Value::as_f64)
        .filter(|p| p.is_finite() && *p >= 0.0)?;

    Some(Percentage::from(points / 100.0))
}
