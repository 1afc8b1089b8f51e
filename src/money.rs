//! Clamped minor-unit arithmetic
//!
//! All engine arithmetic happens on minor units (pence/cents) and is
//! clamped at zero: discount metadata that would drive a value negative is
//! absorbed as a zero rather than surfaced as an error, since an
//! undercounted discount overcharges recoverably while a failed total
//! computation blocks checkout outright.

use std::num::NonZeroU32;

use rusty_money::{Money, iso::Currency};

/// Subtracts `rhs` from `lhs`, clamping the result at zero.
///
/// Both values are assumed to share a currency; the snapshot provider
/// guarantees a single currency per computation, so no cross-check is
/// performed here.
pub fn sub_or_zero<'a>(
    lhs: &Money<'a, Currency>,
    rhs: &Money<'_, Currency>,
) -> Money<'a, Currency> {
    let minor = lhs.to_minor_units().saturating_sub(rhs.to_minor_units());

    Money::from_minor(minor.max(0), lhs.currency())
}

/// Multiplies a per-unit amount by a line quantity.
pub fn scale<'a>(unit: &Money<'a, Currency>, quantity: NonZeroU32) -> Money<'a, Currency> {
    let minor = unit
        .to_minor_units()
        .saturating_mul(i64::from(quantity.get()));

    Money::from_minor(minor, unit.currency())
}

/// Clamps a value at zero, rejecting negative prices from corrupt metadata.
pub fn floor_zero<'a>(value: &Money<'a, Currency>) -> Money<'a, Currency> {
    Money::from_minor(value.to_minor_units().max(0), value.currency())
}
