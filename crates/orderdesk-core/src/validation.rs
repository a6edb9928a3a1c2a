//! Order input validation.
//!
//! Validation is a pure check over a draft (or patch) and the catalog product
//! it references. The caller resolves the product first, so a catalog outage
//! surfaces as an error of its own instead of a rule violation. Every rule is
//! evaluated and all violations are reported together.

use orderdesk_types::{OrderDraft, OrderPatch, Product, QuantityInput};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// A broken validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
	/// Wire name of the offending field.
	pub field: &'static str,
	pub message: String,
}

impl Violation {
	pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
		Self {
			field,
			message: message.into(),
		}
	}
}

impl fmt::Display for Violation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.message)
	}
}

/// Joins violation messages into a single report.
pub fn describe(violations: &[Violation]) -> String {
	violations
		.iter()
		.map(|v| v.message.as_str())
		.collect::<Vec<_>>()
		.join("; ")
}

/// Which quantity bound applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
	/// Customer-facing submissions: quantity is capped.
	#[default]
	Public,
	/// Staff entry: no upper quantity bound.
	Staff,
}

const MIN_NAME_LEN: usize = 2;
const MIN_ADDRESS_LEN: usize = 5;
const MOBILE_DIGITS: std::ops::RangeInclusive<usize> = 10..=15;

/// Largest order total accepted, whether supplied or computed.
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Field rules for order creation and updates.
#[derive(Debug, Clone)]
pub struct OrderValidator {
	public_max_quantity: u32,
}

impl Default for OrderValidator {
	fn default() -> Self {
		Self::new(100)
	}
}

impl OrderValidator {
	pub fn new(public_max_quantity: u32) -> Self {
		Self {
			public_max_quantity,
		}
	}

	/// Checks a creation draft. `product` is the catalog entry resolved for
	/// `draft.product_ref`, if any.
	pub fn validate(
		&self,
		draft: &OrderDraft,
		product: Option<&Product>,
		mode: ValidationMode,
	) -> Vec<Violation> {
		let mut violations = Vec::new();

		match draft.customer_name.as_deref() {
			Some(name) => push(&mut violations, check_customer_name(name)),
			None => violations.push(Violation::new("customerName", "customer name is required")),
		}
		match draft.address.as_deref() {
			Some(address) => push(&mut violations, check_address(address)),
			None => violations.push(Violation::new("address", "address is required")),
		}
		match draft.mobile_number.as_deref() {
			Some(mobile) => push(&mut violations, check_mobile_number(mobile)),
			None => violations.push(Violation::new("mobileNumber", "mobile number is required")),
		}
		match draft.product_ref.as_deref() {
			Some(product_ref) => push(&mut violations, check_product(product_ref, product)),
			None => violations.push(Violation::new("productRef", "product is required")),
		}
		match &draft.quantity {
			Some(quantity) => push(&mut violations, self.check_quantity(quantity, mode)),
			None => violations.push(Violation::new("quantity", "quantity is required")),
		}
		push(&mut violations, check_total_amount(draft.total_amount));

		violations
	}

	/// Checks only the fields present in a patch.
	pub fn validate_patch(
		&self,
		patch: &OrderPatch,
		product: Option<&Product>,
		mode: ValidationMode,
	) -> Vec<Violation> {
		let mut violations = Vec::new();

		if let Some(name) = patch.customer_name.as_deref() {
			push(&mut violations, check_customer_name(name));
		}
		if let Some(address) = patch.address.as_deref() {
			push(&mut violations, check_address(address));
		}
		if let Some(mobile) = patch.mobile_number.as_deref() {
			push(&mut violations, check_mobile_number(mobile));
		}
		if let Some(product_ref) = patch.product_ref.as_deref() {
			push(&mut violations, check_product(product_ref, product));
		}
		if let Some(quantity) = &patch.quantity {
			push(&mut violations, self.check_quantity(quantity, mode));
		}
		push(&mut violations, check_total_amount(patch.total_amount));

		violations
	}

	fn check_quantity(&self, quantity: &QuantityInput, mode: ValidationMode) -> Option<Violation> {
		let Some(value) = quantity.as_integer() else {
			return Some(Violation::new("quantity", "quantity must be a whole number"));
		};
		if value < 1 {
			return Some(Violation::new("quantity", "quantity must be at least 1"));
		}
		match mode {
			ValidationMode::Public if value > i64::from(self.public_max_quantity) => Some(
				Violation::new(
					"quantity",
					format!("quantity must not exceed {}", self.public_max_quantity),
				),
			),
			_ if u32::try_from(value).is_err() => {
				Some(Violation::new("quantity", "quantity is too large"))
			},
			_ => None,
		}
	}
}

/// Parses a quantity that already passed validation.
pub fn parse_quantity(quantity: &QuantityInput) -> Option<u32> {
	quantity
		.as_integer()
		.and_then(|value| u32::try_from(value).ok())
		.filter(|value| *value >= 1)
}

fn push(violations: &mut Vec<Violation>, violation: Option<Violation>) {
	violations.extend(violation);
}

fn check_customer_name(name: &str) -> Option<Violation> {
	(name.trim().chars().count() < MIN_NAME_LEN).then(|| {
		Violation::new(
			"customerName",
			format!("customer name must be at least {} characters", MIN_NAME_LEN),
		)
	})
}

fn check_address(address: &str) -> Option<Violation> {
	(address.trim().chars().count() < MIN_ADDRESS_LEN).then(|| {
		Violation::new(
			"address",
			format!("address must be at least {} characters", MIN_ADDRESS_LEN),
		)
	})
}

fn check_mobile_number(mobile: &str) -> Option<Violation> {
	let digits: String = mobile
		.chars()
		.filter(|c| !matches!(c, ' ' | '-' | '+'))
		.collect();
	let valid = digits.chars().all(|c| c.is_ascii_digit()) && MOBILE_DIGITS.contains(&digits.len());
	(!valid).then(|| {
		Violation::new(
			"mobileNumber",
			format!(
				"mobile number must contain {} to {} digits",
				MOBILE_DIGITS.start(),
				MOBILE_DIGITS.end()
			),
		)
	})
}

fn check_product(product_ref: &str, product: Option<&Product>) -> Option<Violation> {
	let product_ref = product_ref.trim();
	if product_ref.is_empty() {
		return Some(Violation::new("productRef", "product is required"));
	}
	match product {
		None => Some(Violation::new(
			"productRef",
			format!("product {} does not exist", product_ref),
		)),
		Some(p) if !p.active => Some(Violation::new(
			"productRef",
			format!("product {} is not available", product_ref),
		)),
		Some(_) => None,
	}
}

fn check_total_amount(total: Option<Decimal>) -> Option<Violation> {
	total.and_then(check_order_total)
}

/// Checks a total against the accepted range `[0, MAX_ORDER_TOTAL]`.
pub(crate) fn check_order_total(total: Decimal) -> Option<Violation> {
	if total < Decimal::ZERO {
		Some(Violation::new("totalAmount", "total amount must not be negative"))
	} else if total > MAX_ORDER_TOTAL {
		Some(Violation::new(
			"totalAmount",
			format!("total amount must not exceed {}", MAX_ORDER_TOTAL),
		))
	} else {
		None
	}
}
