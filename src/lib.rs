//! Tally
//!
//! Tally is a pure order and cart total computation engine: it turns a
//! snapshot of line items and cart-level discount metadata into a single,
//! audit-consistent totals breakdown, so that every display surface and
//! the payment-charging path compute bit-identical numbers from the same
//! rules.
//!
//! The pipeline has four stages, each a stateless function over immutable
//! inputs:
//!
//! 1. [`pricing::resolve_line_price`] — per-line original/effective price
//!    resolution from the line's [`items::DiscountKind`].
//! 2. [`discounts::aggregate_line_discounts`] — per-category item
//!    discount totals.
//! 3. [`discounts::resolve_cart_discounts`] — cart-level amounts, with
//!    coupon de-duplication against the promotional category and the
//!    free-shipping override.
//! 4. [`totals::compose_totals`] — the final [`totals::OrderTotals`]
//!    breakdown, clamped at zero.
//!
//! [`totals::OrderTotals::compute`] (or [`cart::CartSnapshot::totals`])
//! chains all four; call it afresh on every render or charge attempt.

pub mod cart;
pub mod discounts;
pub mod fixtures;
pub mod items;
pub mod metadata;
pub mod money;
pub mod prelude;
pub mod pricing;
pub mod totals;
