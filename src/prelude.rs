//! Tally prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{CartLevelDiscounts, CartSnapshot},
    discounts::{
        CartDiscounts, ItemDiscountTotals, aggregate_line_discounts, resolve_cart_discounts,
    },
    fixtures::{CartFixture, FixtureError, LineFixture},
    items::{DiscountKind, LineItem},
    pricing::{BasePriceSource, NoBasePrices, ResolvedLinePrice, resolve_line_price},
    totals::{OrderTotals, TotalsRenderError, compose_totals},
};
