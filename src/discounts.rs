//! Discount aggregation and cart-level resolution
//!
//! Stage two folds the per-line resolved prices into per-category totals;
//! stage three turns the cart-level metadata into the amounts actually
//! subtracted, applying the anti-double-counting rule between the coupon
//! total and the promotional-item category.

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{
    cart::CartLevelDiscounts,
    items::{DiscountKind, LineItem},
    money,
    pricing::{BasePriceSource, resolve_line_price},
};

/// Per-category item discount totals folded over all lines.
///
/// The three categories are mutually exclusive by the one-kind-per-line
/// invariant of [`DiscountKind`], so no double counting can occur here.
#[derive(Debug, Clone)]
pub struct ItemDiscountTotals<'a> {
    original_subtotal: Money<'a, Currency>,
    promotional: Money<'a, Currency>,
    variant_sale: Money<'a, Currency>,
    wholesale_tier: Money<'a, Currency>,

    promotional_lines: SmallVec<[usize; 10]>,
    variant_sale_lines: SmallVec<[usize; 10]>,
    wholesale_tier_lines: SmallVec<[usize; 10]>,
}

impl<'a> ItemDiscountTotals<'a> {
    /// `Σ original_unit × quantity` over all lines.
    pub fn original_subtotal(&self) -> &Money<'a, Currency> {
        &self.original_subtotal
    }

    /// Total discount over lines carrying a promotional reward.
    pub fn promotional_discount(&self) -> &Money<'a, Currency> {
        &self.promotional
    }

    /// Total discount over lines carrying a variant markdown.
    pub fn variant_sale_discount(&self) -> &Money<'a, Currency> {
        &self.variant_sale
    }

    /// Total discount over lines on wholesale tier pricing.
    pub fn wholesale_tier_discount(&self) -> &Money<'a, Currency> {
        &self.wholesale_tier
    }

    /// The subtotal with all three per-item categories subtracted.
    pub fn subtotal_after_item_discounts(&self) -> Money<'a, Currency> {
        let after = money::sub_or_zero(&self.original_subtotal, &self.promotional);
        let after = money::sub_or_zero(&after, &self.variant_sale);

        money::sub_or_zero(&after, &self.wholesale_tier)
    }

    /// Indexes of lines that contributed to the promotional category.
    pub fn promotional_lines(&self) -> &[usize] {
        &self.promotional_lines
    }

    /// Indexes of lines that contributed to the variant-sale category.
    pub fn variant_sale_lines(&self) -> &[usize] {
        &self.variant_sale_lines
    }

    /// Indexes of lines that contributed to the wholesale-tier category.
    pub fn wholesale_tier_lines(&self) -> &[usize] {
        &self.wholesale_tier_lines
    }
}

/// Folds all lines into per-category discount totals.
///
/// `currency` determines the currency of the totals for an empty cart;
/// the snapshot provider guarantees it matches the lines.
pub fn aggregate_line_discounts<'a>(
    lines: &[LineItem<'a>],
    base_prices: &impl BasePriceSource,
    currency: &'static Currency,
) -> ItemDiscountTotals<'a> {
    let mut original_subtotal: i64 = 0;
    let mut promotional: i64 = 0;
    let mut variant_sale: i64 = 0;
    let mut wholesale_tier: i64 = 0;

    let mut promotional_lines = SmallVec::new();
    let mut variant_sale_lines = SmallVec::new();
    let mut wholesale_tier_lines = SmallVec::new();

    for (idx, line) in lines.iter().enumerate() {
        let resolved = resolve_line_price(line, base_prices);

        let line_original = money::scale(resolved.original_unit(), line.quantity());
        original_subtotal = original_subtotal.saturating_add(line_original.to_minor_units());

        let discount = resolved.line_discount().to_minor_units();

        match line.discount() {
            DiscountKind::None => {}
            DiscountKind::Promotional { .. } => {
                promotional = promotional.saturating_add(discount);
                promotional_lines.push(idx);
            }
            DiscountKind::VariantSale { .. } => {
                variant_sale = variant_sale.saturating_add(discount);
                variant_sale_lines.push(idx);
            }
            DiscountKind::WholesaleTier => {
                wholesale_tier = wholesale_tier.saturating_add(discount);
                wholesale_tier_lines.push(idx);
            }
        }
    }

    ItemDiscountTotals {
        original_subtotal: Money::from_minor(original_subtotal, currency),
        promotional: Money::from_minor(promotional, currency),
        variant_sale: Money::from_minor(variant_sale, currency),
        wholesale_tier: Money::from_minor(wholesale_tier, currency),
        promotional_lines,
        variant_sale_lines,
        wholesale_tier_lines,
    }
}

/// Cart-level discount amounts ready to subtract, plus the display
/// context that travels with them.
#[derive(Debug, Clone, PartialEq)]
pub struct CartDiscounts<'a> {
    coupon: Money<'a, Currency>,
    points: Money<'a, Currency>,
    points_redeemed: u32,
    membership_promo: Money<'a, Currency>,
    membership_promo_name: Option<String>,
    tier: Money<'a, Currency>,
    tier_percentage: Option<Percentage>,
    tier_name: Option<String>,
    free_shipping_applied: bool,
    original_shipping_cost: Money<'a, Currency>,
    effective_shipping: Money<'a, Currency>,
}

impl<'a> CartDiscounts<'a> {
    /// The coupon discount after de-duplication against the promotional
    /// category.
    pub fn coupon_discount(&self) -> &Money<'a, Currency> {
        &self.coupon
    }

    /// The loyalty-points discount, passed through unchanged.
    pub fn points_discount(&self) -> &Money<'a, Currency> {
        &self.points
    }

    /// Loyalty points redeemed against this cart.
    pub fn points_redeemed(&self) -> u32 {
        self.points_redeemed
    }

    /// The membership-promotion discount, passed through unchanged.
    pub fn membership_promo_discount(&self) -> &Money<'a, Currency> {
        &self.membership_promo
    }

    /// Display name of the membership promotion, when one applied.
    pub fn membership_promo_name(&self) -> Option<&str> {
        self.membership_promo_name.as_deref()
    }

    /// The tier discount, passed through unchanged.
    pub fn tier_discount(&self) -> &Money<'a, Currency> {
        &self.tier
    }

    /// The tier discount as a fraction, for display.
    pub fn tier_percentage(&self) -> Option<Percentage> {
        self.tier_percentage
    }

    /// Display name of the membership tier, when one applied.
    pub fn tier_name(&self) -> Option<&str> {
        self.tier_name.as_deref()
    }

    /// Whether the free-shipping override applied.
    pub fn free_shipping_applied(&self) -> bool {
        self.free_shipping_applied
    }

    /// The shipping cost before the free-shipping override.
    pub fn original_shipping_cost(&self) -> &Money<'a, Currency> {
        &self.original_shipping_cost
    }

    /// The shipping cost actually charged.
    pub fn effective_shipping(&self) -> &Money<'a, Currency> {
        &self.effective_shipping
    }

    /// True when both a membership promo and a tier discount are present.
    ///
    /// The two are mutually exclusive in practice but nothing upstream
    /// enforces it; both are subtracted when both are set. Callers that
    /// consider simultaneous application a data defect can check here
    /// before charging.
    pub fn has_overlapping_membership_discounts(&self) -> bool {
        self.membership_promo.to_minor_units() > 0 && self.tier.to_minor_units() > 0
    }
}

/// Resolves the cart-level discount amounts from the cart metadata.
///
/// `promotional_discount` is the per-item promotional category total from
/// [`aggregate_line_discounts`]; the upstream automatic-discount
/// mechanism folds the same amount into the recorded coupon total, so it
/// is subtracted back out here: `coupon = max(0, coupon_total −
/// promotional)`. A coupon total smaller than the promotional discount it
/// should contain resolves to a zero coupon, never a negative one.
pub fn resolve_cart_discounts<'a>(
    cart: &CartLevelDiscounts<'a>,
    promotional_discount: &Money<'_, Currency>,
    shipping_total: &Money<'a, Currency>,
) -> CartDiscounts<'a> {
    let coupon = money::sub_or_zero(&cart.coupon_total, promotional_discount);

    let effective_shipping = if cart.free_shipping_applied {
        Money::from_minor(0, shipping_total.currency())
    } else {
        money::floor_zero(shipping_total)
    };

    CartDiscounts {
        coupon,
        points: money::floor_zero(&cart.points_discount),
        points_redeemed: cart.points_redeemed,
        membership_promo: money::floor_zero(&cart.membership_promo_discount),
        membership_promo_name: cart.membership_promo_name.clone(),
        tier: money::floor_zero(&cart.tier_discount),
        tier_percentage: cart.tier_discount_percentage,
        tier_name: cart.tier_name.clone(),
        free_shipping_applied: cart.free_shipping_applied,
        original_shipping_cost: money::floor_zero(&cart.original_shipping_cost),
        effective_shipping,
    }
}
