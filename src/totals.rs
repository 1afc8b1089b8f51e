//! Order totals
//!
//! The final breakdown assembled from the item and cart-level discount
//! stages. [`OrderTotals`] is the only value ever rendered or charged:
//! the admin order detail, the storefront confirmation and the
//! payment-amount adjustment all consume the same computation, so the
//! number shown to the customer is by construction the number sent to
//! the payment processor.

use std::io;

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};
use smallvec::{SmallVec, smallvec};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{Alignment, Color, Style, Theme, object::{Columns, Rows}},
};
use thiserror::Error;

use crate::{
    cart::CartSnapshot,
    discounts::{CartDiscounts, ItemDiscountTotals, aggregate_line_discounts, resolve_cart_discounts},
    money,
    pricing::BasePriceSource,
};

/// Errors that can occur when rendering a totals breakdown.
#[derive(Debug, Error)]
pub enum TotalsRenderError {
    /// The output sink failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The complete totals breakdown for a cart or order.
///
/// Derived, never stored as source of truth: recompute from a fresh
/// snapshot whenever any input changes. Every monetary field is clamped
/// at zero.
#[derive(Debug, Clone)]
pub struct OrderTotals<'a> {
    original_subtotal: Money<'a, Currency>,
    subtotal_after_item_discounts: Money<'a, Currency>,

    promotional_discount: Money<'a, Currency>,
    variant_sale_discount: Money<'a, Currency>,
    wholesale_tier_discount: Money<'a, Currency>,

    coupon_discount: Money<'a, Currency>,
    points_discount: Money<'a, Currency>,
    points_redeemed: u32,
    membership_promo_discount: Money<'a, Currency>,
    membership_promo_name: Option<String>,
    tier_discount: Money<'a, Currency>,
    tier_percentage: Option<Percentage>,
    tier_name: Option<String>,

    shipping: Money<'a, Currency>,
    free_shipping_applied: bool,
    original_shipping_cost: Money<'a, Currency>,

    tax: Money<'a, Currency>,
    grand_total: Money<'a, Currency>,

    currency: &'static Currency,
}

impl<'a> OrderTotals<'a> {
    /// Runs the full pipeline over a snapshot.
    ///
    /// Pure and idempotent: identical snapshots always produce identical
    /// breakdowns, wherever and however often this is called.
    pub fn compute(snapshot: &CartSnapshot<'a>, base_prices: &impl BasePriceSource) -> Self {
        let items = aggregate_line_discounts(snapshot.lines(), base_prices, snapshot.currency());

        let cart = resolve_cart_discounts(
            snapshot.cart_level(),
            items.promotional_discount(),
            snapshot.shipping_total(),
        );

        compose_totals(&items, &cart, snapshot.tax_total(), snapshot.currency())
    }

    /// `Σ original_unit × quantity` over all lines.
    pub fn original_subtotal(&self) -> &Money<'a, Currency> {
        &self.original_subtotal
    }

    /// The subtotal with the three per-item categories subtracted.
    pub fn subtotal_after_item_discounts(&self) -> &Money<'a, Currency> {
        &self.subtotal_after_item_discounts
    }

    /// Total discount over promotional reward lines.
    pub fn promotional_discount(&self) -> &Money<'a, Currency> {
        &self.promotional_discount
    }

    /// Total discount over variant markdown lines.
    pub fn variant_sale_discount(&self) -> &Money<'a, Currency> {
        &self.variant_sale_discount
    }

    /// Total discount over wholesale tier lines.
    pub fn wholesale_tier_discount(&self) -> &Money<'a, Currency> {
        &self.wholesale_tier_discount
    }

    /// The coupon discount after de-duplication.
    pub fn coupon_discount(&self) -> &Money<'a, Currency> {
        &self.coupon_discount
    }

    /// The loyalty-points discount.
    pub fn points_discount(&self) -> &Money<'a, Currency> {
        &self.points_discount
    }

    /// Loyalty points redeemed against this cart.
    pub fn points_redeemed(&self) -> u32 {
        self.points_redeemed
    }

    /// The membership-promotion discount.
    pub fn membership_promo_discount(&self) -> &Money<'a, Currency> {
        &self.membership_promo_discount
    }

    /// Display name of the membership promotion, when one applied.
    pub fn membership_promo_name(&self) -> Option<&str> {
        self.membership_promo_name.as_deref()
    }

    /// The tier discount.
    pub fn tier_discount(&self) -> &Money<'a, Currency> {
        &self.tier_discount
    }

    /// The tier discount as a fraction, for display.
    pub fn tier_percentage(&self) -> Option<Percentage> {
        self.tier_percentage
    }

    /// Display name of the membership tier, when one applied.
    pub fn tier_name(&self) -> Option<&str> {
        self.tier_name.as_deref()
    }

    /// The shipping cost actually charged (zero under free shipping).
    pub fn shipping(&self) -> &Money<'a, Currency> {
        &self.shipping
    }

    /// Whether the free-shipping override applied.
    pub fn free_shipping_applied(&self) -> bool {
        self.free_shipping_applied
    }

    /// The shipping cost before the free-shipping override, kept for
    /// struck-through display.
    pub fn original_shipping_cost(&self) -> &Money<'a, Currency> {
        &self.original_shipping_cost
    }

    /// The tax amount, as supplied by the external tax collaborator.
    pub fn tax(&self) -> &Money<'a, Currency> {
        &self.tax
    }

    /// The amount to charge.
    pub fn grand_total(&self) -> &Money<'a, Currency> {
        &self.grand_total
    }

    /// The grand total in the currency's minor unit, the form the
    /// payment-capture collaborator expects.
    pub fn charge_amount(&self) -> i64 {
        self.grand_total.to_minor_units()
    }

    /// The currency of every monetary field.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// The sum of all seven discount categories.
    pub fn total_discount(&self) -> Money<'a, Currency> {
        let minor = [
            &self.promotional_discount,
            &self.variant_sale_discount,
            &self.wholesale_tier_discount,
            &self.coupon_discount,
            &self.points_discount,
            &self.membership_promo_discount,
            &self.tier_discount,
        ]
        .iter()
        .fold(0_i64, |acc, m| acc.saturating_add(m.to_minor_units()));

        Money::from_minor(minor, self.currency)
    }

    /// The total discount as a fraction of the original subtotal.
    pub fn total_discount_percent(&self) -> Percentage {
        let subtotal_minor = self.original_subtotal.to_minor_units();

        if subtotal_minor == 0 {
            return Percentage::from(0.0);
        }

        // Ratio in decimal space to avoid integer truncation.
        let discount = Decimal::from_i64(self.total_discount().to_minor_units())
            .unwrap_or(Decimal::ZERO);
        let subtotal = Decimal::from_i64(subtotal_minor).unwrap_or(Decimal::ONE);

        Percentage::from(discount / subtotal)
    }

    /// Renders the breakdown as a terminal table, one row per non-zero
    /// category, followed by a savings summary.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalsRenderError`] if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), TotalsRenderError> {
        let mut builder = Builder::default();
        let mut rows: SmallVec<[[String; 2]; 16]> = smallvec![];

        rows.push(["Subtotal".to_string(), format!("{}", self.original_subtotal)]);

        push_discount_row(&mut rows, "Promotional items", &self.promotional_discount);
        push_discount_row(&mut rows, "Variant sale", &self.variant_sale_discount);
        push_discount_row(&mut rows, "Wholesale pricing", &self.wholesale_tier_discount);
        push_discount_row(&mut rows, "Coupon", &self.coupon_discount);

        if self.points_discount.to_minor_units() > 0 {
            rows.push([
                format!("Points ({} pts)", self.points_redeemed),
                format!("-{}", self.points_discount),
            ]);
        }

        push_discount_row(
            &mut rows,
            self.membership_promo_name.as_deref().unwrap_or("Membership promo"),
            &self.membership_promo_discount,
        );

        push_discount_row(&mut rows, &self.tier_label(), &self.tier_discount);

        rows.push(["Shipping".to_string(), self.shipping_cell()]);
        rows.push(["Tax".to_string(), format!("{}", self.tax)]);
        rows.push(["Total".to_string(), format!("{}", self.grand_total)]);

        let total_row = rows.len();

        for row in rows {
            builder.push_record(row);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(total_row - 1, separator);

        table.with(theme);
        table.modify(Columns::last(), Alignment::right());
        table.modify(Rows::last(), Color::BOLD);

        writeln!(out, "\n{table}")?;

        self.write_summary(&mut out)?;

        Ok(())
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), TotalsRenderError> {
        let savings = self.total_discount();

        if savings.to_minor_units() > 0 {
            let points = percent_points(self.total_discount_percent());

            writeln!(out, " Savings: ({points:.2}%) {savings}")?;
        }

        Ok(())
    }

    fn tier_label(&self) -> String {
        let name = self.tier_name.as_deref().unwrap_or("Tier discount");

        match self.tier_percentage {
            Some(percentage) => format!("{name} ({:.2}%)", percent_points(percentage)),
            None => name.to_string(),
        }
    }

    fn shipping_cell(&self) -> String {
        if self.free_shipping_applied {
            // Struck-through original cost, shown but not charged.
            format!("\x1b[9m{}\x1b[0m FREE", self.original_shipping_cost)
        } else {
            format!("{}", self.shipping)
        }
    }
}

fn push_discount_row(
    rows: &mut SmallVec<[[String; 2]; 16]>,
    label: &str,
    amount: &Money<'_, Currency>,
) {
    if amount.to_minor_units() > 0 {
        rows.push([label.to_string(), format!("-{amount}")]);
    }
}

/// Converts a fractional percentage to percent points for display.
fn percent_points(percentage: Percentage) -> Decimal {
    ((percentage * Decimal::ONE) * Decimal::from_i64(100).unwrap_or(Decimal::ZERO)).round_dp(2)
}

/// Assembles the final breakdown and enforces the zero floor.
///
/// The charged amount is
/// `max(0, subtotal_after_item_discounts + shipping + tax − coupon −
/// points − membership promo − tier)`, with every intermediate clamped at
/// zero. This exact expression backs every display surface and the
/// payment path.
pub fn compose_totals<'a>(
    items: &ItemDiscountTotals<'a>,
    cart: &CartDiscounts<'a>,
    tax: &Money<'a, Currency>,
    currency: &'static Currency,
) -> OrderTotals<'a> {
    let subtotal_after = items.subtotal_after_item_discounts();
    let tax = money::floor_zero(tax);

    let grand_total = subtotal_after
        .to_minor_units()
        .saturating_add(cart.effective_shipping().to_minor_units())
        .saturating_add(tax.to_minor_units())
        .saturating_sub(cart.coupon_discount().to_minor_units())
        .saturating_sub(cart.points_discount().to_minor_units())
        .saturating_sub(cart.membership_promo_discount().to_minor_units())
        .saturating_sub(cart.tier_discount().to_minor_units())
        .max(0);

    OrderTotals {
        original_subtotal: *items.original_subtotal(),
        subtotal_after_item_discounts: subtotal_after,
        promotional_discount: *items.promotional_discount(),
        variant_sale_discount: *items.variant_sale_discount(),
        wholesale_tier_discount: *items.wholesale_tier_discount(),
        coupon_discount: *cart.coupon_discount(),
        points_discount: *cart.points_discount(),
        points_redeemed: cart.points_redeemed(),
        membership_promo_discount: *cart.membership_promo_discount(),
        membership_promo_name: cart.membership_promo_name().map(ToString::to_string),
        tier_discount: *cart.tier_discount(),
        tier_percentage: cart.tier_percentage(),
        tier_name: cart.tier_name().map(ToString::to_string),
        shipping: *cart.effective_shipping(),
        free_shipping_applied: cart.free_shipping_applied(),
        original_shipping_cost: *cart.original_shipping_cost(),
        tax,
        grand_total: Money::from_minor(grand_total, currency),
        currency,
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{
        cart::CartLevelDiscounts,
        items::{DiscountKind, LineItem},
        pricing::NoBasePrices,
    };

    use super::*;

    fn qty(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
    }

    fn sale_snapshot() -> CartSnapshot<'static> {
        let lines = vec![LineItem::with_discount(
            "v1",
            Money::from_minor(4500, USD),
            qty(2),
            DiscountKind::VariantSale {
                discount_per_unit: Money::from_minor(500, USD),
                original_unit_price: Some(Money::from_minor(5000, USD)),
            },
        )];

        CartSnapshot::new(
            lines,
            CartLevelDiscounts::none(USD),
            Money::from_minor(1000, USD),
            Money::from_minor(300, USD),
            USD,
        )
    }

    #[test]
    fn grand_total_adds_shipping_and_tax_after_discounts() {
        let totals = sale_snapshot().totals(&NoBasePrices);

        assert_eq!(totals.original_subtotal(), &Money::from_minor(10000, USD));
        assert_eq!(totals.variant_sale_discount(), &Money::from_minor(1000, USD));
        assert_eq!(
            totals.subtotal_after_item_discounts(),
            &Money::from_minor(9000, USD)
        );
        assert_eq!(totals.grand_total(), &Money::from_minor(10300, USD));
        assert_eq!(totals.charge_amount(), 10300);
    }

    #[test]
    fn grand_total_clamps_at_zero() {
        let mut cart = CartLevelDiscounts::none(USD);
        cart.coupon_total = Money::from_minor(50000, USD);

        let snapshot = CartSnapshot::new(
            vec![LineItem::new("v1", Money::from_minor(1000, USD), qty(1))],
            cart,
            Money::from_minor(500, USD),
            Money::from_minor(100, USD),
            USD,
        );

        let totals = snapshot.totals(&NoBasePrices);

        assert_eq!(totals.grand_total(), &Money::from_minor(0, USD));
    }

    #[test]
    fn every_field_is_non_negative() {
        let mut cart = CartLevelDiscounts::none(USD);
        cart.coupon_total = Money::from_minor(-300, USD);
        cart.points_discount = Money::from_minor(-100, USD);
        cart.tier_discount = Money::from_minor(-100, USD);

        let snapshot = CartSnapshot::new(
            vec![LineItem::new("v1", Money::from_minor(-1000, USD), qty(1))],
            cart,
            Money::from_minor(-500, USD),
            Money::from_minor(-100, USD),
            USD,
        );

        let totals = snapshot.totals(&NoBasePrices);

        for field in [
            totals.original_subtotal(),
            totals.subtotal_after_item_discounts(),
            totals.promotional_discount(),
            totals.variant_sale_discount(),
            totals.wholesale_tier_discount(),
            totals.coupon_discount(),
            totals.points_discount(),
            totals.membership_promo_discount(),
            totals.tier_discount(),
            totals.shipping(),
            totals.tax(),
            totals.grand_total(),
        ] {
            assert!(field.to_minor_units() >= 0, "negative field in breakdown");
        }
    }

    #[test]
    fn recomputation_is_idempotent() {
        let snapshot = sale_snapshot();

        let first = snapshot.totals(&NoBasePrices);
        let second = snapshot.totals(&NoBasePrices);

        assert_eq!(first.grand_total(), second.grand_total());
        assert_eq!(first.charge_amount(), second.charge_amount());
        assert_eq!(first.total_discount(), second.total_discount());
    }

    #[test]
    fn total_discount_sums_all_categories() {
        let mut cart = CartLevelDiscounts::none(USD);
        cart.coupon_total = Money::from_minor(700, USD);
        cart.points_discount = Money::from_minor(100, USD);

        let lines = vec![LineItem::with_discount(
            "pwp",
            Money::from_minor(800, USD),
            qty(1),
            DiscountKind::Promotional {
                discount_per_unit: Money::from_minor(200, USD),
            },
        )];

        let snapshot = CartSnapshot::new(
            lines,
            cart,
            Money::from_minor(0, USD),
            Money::from_minor(0, USD),
            USD,
        );

        let totals = snapshot.totals(&NoBasePrices);

        // promotional 200 + coupon (700 − 200) + points 100
        assert_eq!(totals.total_discount(), Money::from_minor(800, USD));
    }

    #[test]
    fn total_discount_percent_on_empty_cart_is_zero() {
        let snapshot = CartSnapshot::new(
            [],
            CartLevelDiscounts::none(USD),
            Money::from_minor(0, USD),
            Money::from_minor(0, USD),
            USD,
        );

        let totals = snapshot.totals(&NoBasePrices);

        assert_eq!(
            percent_points(totals.total_discount_percent()),
            Decimal::ZERO
        );
    }

    #[test]
    fn write_to_lists_non_zero_categories_only() -> TestResult {
        let mut cart = CartLevelDiscounts::none(USD);
        cart.free_shipping_applied = true;
        cart.original_shipping_cost = Money::from_minor(1000, USD);
        cart.tier_discount = Money::from_minor(500, USD);
        cart.tier_name = Some("Gold".to_string());
        cart.tier_discount_percentage = Some(Percentage::from(0.10));

        let snapshot = CartSnapshot::new(
            vec![LineItem::new("v1", Money::from_minor(5000, USD), qty(1))],
            cart,
            Money::from_minor(1000, USD),
            Money::from_minor(0, USD),
            USD,
        );

        let totals = snapshot.totals(&NoBasePrices);
        let mut rendered = Vec::new();

        totals.write_to(&mut rendered)?;

        let rendered = String::from_utf8(rendered)?;

        assert!(rendered.contains("Gold (10.00%)"), "tier row missing");
        assert!(rendered.contains("FREE"), "free shipping marker missing");
        assert!(!rendered.contains("Coupon"), "zero coupon row rendered");
        assert!(rendered.contains("Savings"), "savings summary missing");

        Ok(())
    }

    #[test]
    fn percent_points_converts_fractions() {
        assert_eq!(
            percent_points(Percentage::from(0.25)),
            Decimal::from_i64(25).unwrap_or(Decimal::ZERO)
        );
    }
}
