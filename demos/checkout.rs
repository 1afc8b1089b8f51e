//! Checkout Totals Example
//!
//! Computes and renders the totals breakdown for an order snapshot, then
//! prints the amount the payment collaborator would capture. By default a
//! built-in sample order is used; pass `--fixture <path>` to load a YAML
//! cart fixture instead.
//!
//! Run with: `cargo run --example checkout`

use std::io;

use anyhow::Result;
use clap::Parser;

use tally::prelude::*;

const SAMPLE_ORDER: &str = r#"
currency: USD
shipping_total: 1000
tax_total: 450
discount_total: 700
lines:
  - variant_id: tote-bag
    unit_price: 2000
    quantity: 1
  - variant_id: gift-mug
    unit_price: 800
    quantity: 1
    metadata:
      is_pwp_item: true
      pwp_discount_amount: 200
  - variant_id: candle-sale
    unit_price: 4500
    quantity: 2
    metadata:
      is_variant_discount: true
      variant_discount_amount: 500
      original_unit_price: 5000
  - variant_id: soap-bar
    unit_price: 900
    quantity: 10
    metadata:
      is_bulk_price: true
metadata:
  points_to_redeem: 150
  points_discount_amount: 150
  tier_discount_amount: 250
  tier_discount_percentage: 10
  tier_name: "Gold"
  free_shipping_applied: true
  original_shipping_cost: 1000
base_prices:
  soap-bar: 1000
"#;

/// Arguments for the checkout example
#[derive(Debug, Parser)]
struct CheckoutArgs {
    /// Path to a YAML cart fixture; omit to use the built-in sample order
    #[clap(short, long)]
    fixture: Option<String>,
}

/// Checkout Totals Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let args = CheckoutArgs::parse();

    let fixture = match args.fixture {
        Some(path) => CartFixture::from_path(path)?,
        None => CartFixture::from_yaml(SAMPLE_ORDER)?,
    };

    let snapshot = fixture.snapshot()?;
    let base_prices = fixture.base_price_catalog()?;

    let totals = snapshot.totals(&base_prices);

    totals.write_to(io::stdout())?;

    if totals.free_shipping_applied() {
        println!(
            " Free shipping applied (was {})",
            totals.original_shipping_cost()
        );
    }

    println!(
        "\n Charge amount: {} minor units ({})",
        totals.charge_amount(),
        totals.grand_total()
    );

    Ok(())
}
