//! Fixtures
//!
//! YAML-defined cart snapshots for tests and demos. A fixture mirrors
//! what the snapshot provider hands the engine: raw line rows with their
//! metadata blobs, the order-level `discount_total`, shipping and tax,
//! and an optional base-price catalog for wholesale lines.

use std::{fs, path::Path};

use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::CartSnapshot,
    items::LineItem,
    metadata,
};

/// Fixture parsing errors.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading a fixture file.
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A line with quantity zero; such a line cannot exist in a cart.
    #[error("Line {0} has zero quantity")]
    ZeroQuantity(String),
}

/// One raw line row in a fixture. Amounts are minor units.
#[derive(Debug, Clone, Deserialize)]
pub struct LineFixture {
    /// Variant identifier, also the base-price catalog key.
    pub variant_id: String,

    /// Stored per-unit price in minor units.
    pub unit_price: i64,

    /// Line quantity.
    pub quantity: u32,

    /// The line's metadata blob, as the ORM would hand it over.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A cart snapshot defined in YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct CartFixture {
    /// ISO alpha currency code for every amount in the fixture.
    pub currency: String,

    /// Quoted shipping cost in minor units.
    #[serde(default)]
    pub shipping_total: i64,

    /// Tax amount in minor units.
    #[serde(default)]
    pub tax_total: i64,

    /// The order's recorded `discount_total` (raw coupon total).
    #[serde(default)]
    pub discount_total: i64,

    /// The line rows.
    #[serde(default)]
    pub lines: Vec<LineFixture>,

    /// The cart-level metadata blob.
    #[serde(default)]
    pub metadata: serde_json::Value,

    /// Undiscounted base unit prices by variant id, in minor units.
    #[serde(default)]
    pub base_prices: FxHashMap<String, i64>,
}

impl CartFixture {
    /// Parses a fixture from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the YAML is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Reads and parses a fixture file.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// The fixture currency.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::UnknownCurrency`] for an unrecognized code.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        iso::find(&self.currency).ok_or_else(|| FixtureError::UnknownCurrency(self.currency.clone()))
    }

    /// Builds the cart snapshot the fixture describes.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] for an unknown currency or a
    /// zero-quantity line.
    pub fn snapshot(&self) -> Result<CartSnapshot<'static>, FixtureError> {
        let currency = self.currency()?;

        let lines = self
            .lines
            .iter()
            .map(|line| {
                metadata::line_item(
                    line.variant_id.clone(),
                    line.unit_price,
                    line.quantity,
                    &line.metadata,
                    currency,
                )
                .ok_or_else(|| FixtureError::ZeroQuantity(line.variant_id.clone()))
            })
            .collect::<Result<Vec<LineItem<'static>>, FixtureError>>()?;

        let cart_level = metadata::cart_level_discounts(&self.metadata, self.discount_total, currency);

        Ok(CartSnapshot::new(
            lines,
            cart_level,
            Money::from_minor(self.shipping_total, currency),
            Money::from_minor(self.tax_total, currency),
            currency,
        ))
    }

    /// Builds the base-price catalog for wholesale lines.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::UnknownCurrency`] for an unrecognized code.
    pub fn base_price_catalog(
        &self,
    ) -> Result<FxHashMap<String, Money<'static, Currency>>, FixtureError> {
        let currency = self.currency()?;

        Ok(self
            .base_prices
            .iter()
            .map(|(variant_id, minor)| {
                (variant_id.clone(), Money::from_minor(*minor, currency))
            })
            .collect())
    }
}
