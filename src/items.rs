//! Line items

use std::num::NonZeroU32;

use rusty_money::{Money, iso::Currency};

/// The discount mechanism attached to a single line. At most one applies
/// per line.
///
/// Upstream systems record this as three independent boolean metadata
/// flags; decoding them into a closed variant (see [`crate::metadata`])
/// makes "which branch applies" an exhaustive match rather than an
/// ordered flag check repeated at every call site.
///
/// The meaning of the line's stored unit price differs per variant, which
/// is why price resolution lives in [`crate::pricing`] instead of reading
/// the stored price directly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DiscountKind<'a> {
    /// No per-item discount; the stored unit price is the full price.
    #[default]
    None,

    /// A purchase-with-purchase reward item. The stored unit price is
    /// already the discounted price the customer pays.
    Promotional {
        /// Per-unit discount already baked into the stored unit price.
        discount_per_unit: Money<'a, Currency>,
    },

    /// An admin-set variant markdown (percentage or fixed amount).
    VariantSale {
        /// Per-unit markdown amount.
        discount_per_unit: Money<'a, Currency>,

        /// The pre-markdown unit price, when it was captured. Records
        /// created before original-price capture existed leave this
        /// unset and the original is reconstructed from the markdown.
        original_unit_price: Option<Money<'a, Currency>>,
    },

    /// Quantity-tier wholesale pricing. The stored unit price already is
    /// the tier price; the undiscounted price comes from an external
    /// base-price lookup.
    WholesaleTier,
}

/// One product line in a cart or order snapshot.
///
/// A read-only value taken at computation time; totals are always derived
/// from lines afresh, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem<'a> {
    variant_id: String,
    unit_price: Money<'a, Currency>,
    quantity: NonZeroU32,
    discount: DiscountKind<'a>,
}

impl<'a> LineItem<'a> {
    /// Creates a full-price line.
    pub fn new(
        variant_id: impl Into<String>,
        unit_price: Money<'a, Currency>,
        quantity: NonZeroU32,
    ) -> Self {
        Self::with_discount(variant_id, unit_price, quantity, DiscountKind::None)
    }

    /// Creates a line with the given discount kind.
    pub fn with_discount(
        variant_id: impl Into<String>,
        unit_price: Money<'a, Currency>,
        quantity: NonZeroU32,
        discount: DiscountKind<'a>,
    ) -> Self {
        Self {
            variant_id: variant_id.into(),
            unit_price,
            quantity,
            discount,
        }
    }

    /// Returns the variant identifier of the line.
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Returns the stored per-unit price of the line.
    ///
    /// Whether this is the full or the discounted price depends on the
    /// line's [`DiscountKind`].
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Returns the line quantity.
    pub fn quantity(&self) -> NonZeroU32 {
        self.quantity
    }

    /// Returns the discount kind attached to the line.
    pub fn discount(&self) -> DiscountKind<'a> {
        self.discount
    }
}
