//! Catalog product types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product offered in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
	/// Catalog reference orders point at.
	#[serde(rename = "ref", alias = "productRef")]
	pub product_ref: String,
	pub name: String,
	#[serde(alias = "unit_price")]
	pub unit_price: Decimal,
	/// Inactive products stay listed but cannot be ordered.
	#[serde(default = "default_active")]
	pub active: bool,
}

fn default_active() -> bool {
	true
}

impl Product {
	pub fn new(product_ref: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
		Self {
			product_ref: product_ref.into(),
			name: name.into(),
			unit_price,
			active: true,
		}
	}

	/// Price of `quantity` units, `None` if it overflows.
	pub fn price_for(&self, quantity: u32) -> Option<Decimal> {
		self.unit_price.checked_mul(Decimal::from(quantity))
	}
}
