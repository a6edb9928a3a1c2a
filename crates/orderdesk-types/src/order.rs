//! Order types for the order desk system.
//!
//! This module defines the order record, the finite status set that governs
//! its fulfillment lifecycle, and the payloads used to create and modify
//! orders.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A customer order as persisted by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Opaque identifier assigned by the repository.
	pub id: String,
	/// Human-readable business identifier, e.g. `ORD20240315042`.
	pub order_code: String,
	pub customer_name: String,
	pub address: String,
	pub mobile_number: String,
	/// Catalog reference of the ordered product.
	pub product_ref: String,
	/// Product name captured when the order was placed.
	pub product_name: String,
	pub quantity: u32,
	pub status: OrderStatus,
	pub total_amount: Decimal,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Order {
	/// Customer identity used by analytics: the (name, mobile) pair.
	pub fn customer_key(&self) -> (&str, &str) {
		(&self.customer_name, &self.mobile_number)
	}

	/// UTC calendar day on which the order was created.
	pub fn created_date(&self) -> NaiveDate {
		self.created_at.date_naive()
	}
}

/// Status of an order in the fulfillment pipeline.
///
/// Variants are declared in pipeline order, so the derived `Ord` follows the
/// canonical lifecycle. `Cancelled` sits outside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
	/// Order submitted, not yet acknowledged by staff.
	Placed,
	/// Order acknowledged by staff.
	Received,
	/// Goods issued from stock.
	Issued,
	/// Parcel handed to the courier.
	SentToCourier,
	/// Courier is moving the parcel.
	InTransit,
	/// Parcel delivered to the customer.
	Delivered,
	/// Order cancelled.
	Cancelled,
}

/// Error returned when a status string is outside the finite status set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
	/// Every member of the status set.
	pub const ALL: [OrderStatus; 7] = [
		OrderStatus::Placed,
		OrderStatus::Received,
		OrderStatus::Issued,
		OrderStatus::SentToCourier,
		OrderStatus::InTransit,
		OrderStatus::Delivered,
		OrderStatus::Cancelled,
	];

	/// Statuses handled by the courier subsystem.
	pub const COURIER: [OrderStatus; 3] = [
		OrderStatus::SentToCourier,
		OrderStatus::InTransit,
		OrderStatus::Delivered,
	];

	/// The status every new order starts in.
	pub const fn initial() -> Self {
		OrderStatus::Placed
	}

	/// Returns the canonical wire representation.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Placed => "placed",
			OrderStatus::Received => "received",
			OrderStatus::Issued => "issued",
			OrderStatus::SentToCourier => "sent-to-courier",
			OrderStatus::InTransit => "in-transit",
			OrderStatus::Delivered => "delivered",
			OrderStatus::Cancelled => "cancelled",
		}
	}

	/// Whether the status belongs to the courier subset.
	pub fn is_courier(&self) -> bool {
		Self::COURIER.contains(self)
	}

	/// Position in the pipeline, `None` for `Cancelled`.
	pub fn rank(&self) -> Option<u8> {
		match self {
			OrderStatus::Placed => Some(0),
			OrderStatus::Received => Some(1),
			OrderStatus::Issued => Some(2),
			OrderStatus::SentToCourier => Some(3),
			OrderStatus::InTransit => Some(4),
			OrderStatus::Delivered => Some(5),
			OrderStatus::Cancelled => None,
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderStatus {
	type Err = UnknownStatus;

	/// Parses a status case-insensitively, accepting `-`, `_` or spaces as
	/// word separators. `pending` is the legacy name of `placed`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
		match normalized.as_str() {
			"placed" | "pending" => Ok(OrderStatus::Placed),
			"received" => Ok(OrderStatus::Received),
			"issued" => Ok(OrderStatus::Issued),
			"sent-to-courier" => Ok(OrderStatus::SentToCourier),
			"in-transit" => Ok(OrderStatus::InTransit),
			"delivered" => Ok(OrderStatus::Delivered),
			"cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
			_ => Err(UnknownStatus(s.to_string())),
		}
	}
}

impl<'de> Deserialize<'de> for OrderStatus {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

/// Quantity as submitted by a client: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
	Integer(i64),
	Float(f64),
	Text(String),
}

impl QuantityInput {
	/// Returns the value as an integer if it represents one.
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			QuantityInput::Integer(n) => Some(*n),
			QuantityInput::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
			QuantityInput::Float(_) => None,
			QuantityInput::Text(s) => s.trim().parse().ok(),
		}
	}
}

impl From<i64> for QuantityInput {
	fn from(value: i64) -> Self {
		QuantityInput::Integer(value)
	}
}

/// Unvalidated order creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
	pub customer_name: Option<String>,
	pub address: Option<String>,
	pub mobile_number: Option<String>,
	#[serde(alias = "productId")]
	pub product_ref: Option<String>,
	pub quantity: Option<QuantityInput>,
	/// Explicit total; computed from the catalog price when absent.
	pub total_amount: Option<Decimal>,
	pub notes: Option<String>,
}

/// Unvalidated partial update request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
	pub customer_name: Option<String>,
	pub address: Option<String>,
	pub mobile_number: Option<String>,
	#[serde(alias = "productId")]
	pub product_ref: Option<String>,
	pub quantity: Option<QuantityInput>,
	pub status: Option<String>,
	pub total_amount: Option<Decimal>,
	pub notes: Option<String>,
	/// Recompute `total_amount` from quantity and the current catalog price.
	#[serde(default)]
	pub recalculate_total: bool,
}

/// Validated fields handed to the repository on creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
	pub order_code: String,
	pub customer_name: String,
	pub address: String,
	pub mobile_number: String,
	pub product_ref: String,
	pub product_name: String,
	pub quantity: u32,
	pub status: OrderStatus,
	pub total_amount: Decimal,
	pub notes: Option<String>,
	pub created_at: DateTime<Utc>,
}

impl NewOrder {
	/// Materializes the record under the given identifier.
	pub fn into_order(self, id: String) -> Order {
		Order {
			id,
			order_code: self.order_code,
			customer_name: self.customer_name,
			address: self.address,
			mobile_number: self.mobile_number,
			product_ref: self.product_ref,
			product_name: self.product_name,
			quantity: self.quantity,
			status: self.status,
			total_amount: self.total_amount,
			notes: self.notes,
			created_at: self.created_at,
			updated_at: self.created_at,
		}
	}
}

/// Validated field changes applied by the repository.
///
/// `order_code`, `id` and `created_at` are deliberately absent: they never
/// change after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderUpdate {
	pub customer_name: Option<String>,
	pub address: Option<String>,
	pub mobile_number: Option<String>,
	pub product_ref: Option<String>,
	pub product_name: Option<String>,
	pub quantity: Option<u32>,
	pub status: Option<OrderStatus>,
	pub total_amount: Option<Decimal>,
	/// `Some(None)` clears the notes.
	pub notes: Option<Option<String>>,
}

impl OrderUpdate {
	/// An update that only changes the status.
	pub fn status(status: OrderStatus) -> Self {
		Self {
			status: Some(status),
			..Default::default()
		}
	}

	/// Applies the changes and stamps `updated_at`.
	pub fn apply_to(self, order: &mut Order, now: DateTime<Utc>) {
		if let Some(v) = self.customer_name {
			order.customer_name = v;
		}
		if let Some(v) = self.address {
			order.address = v;
		}
		if let Some(v) = self.mobile_number {
			order.mobile_number = v;
		}
		if let Some(v) = self.product_ref {
			order.product_ref = v;
		}
		if let Some(v) = self.product_name {
			order.product_name = v;
		}
		if let Some(v) = self.quantity {
			order.quantity = v;
		}
		if let Some(v) = self.status {
			order.status = v;
		}
		if let Some(v) = self.total_amount {
			order.total_amount = v;
		}
		if let Some(v) = self.notes {
			order.notes = v;
		}
		order.updated_at = now;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_wire_format() {
		let json = serde_json::to_string(&OrderStatus::SentToCourier).unwrap();
		assert_eq!(json, "\"sent-to-courier\"");

		let parsed: OrderStatus = serde_json::from_str("\"in_transit\"").unwrap();
		assert_eq!(parsed, OrderStatus::InTransit);
	}

	#[test]
	fn test_status_aliases() {
		assert_eq!("pending".parse::<OrderStatus>(), Ok(OrderStatus::Placed));
		assert_eq!("Sent to Courier".parse::<OrderStatus>(), Ok(OrderStatus::SentToCourier));
		assert_eq!("RECEIVED".parse::<OrderStatus>(), Ok(OrderStatus::Received));
		assert!("shipped".parse::<OrderStatus>().is_err());
	}

	#[test]
	fn test_status_rank_follows_pipeline() {
		let ranked: Vec<u8> = OrderStatus::ALL.iter().filter_map(|s| s.rank()).collect();
		assert_eq!(ranked, vec![0, 1, 2, 3, 4, 5]);
		assert_eq!(OrderStatus::Cancelled.rank(), None);
		assert_eq!(OrderStatus::initial(), OrderStatus::Placed);
	}

	#[test]
	fn test_quantity_input_parsing() {
		assert_eq!(QuantityInput::Integer(3).as_integer(), Some(3));
		assert_eq!(QuantityInput::Text(" 12 ".into()).as_integer(), Some(12));
		assert_eq!(QuantityInput::Text("two".into()).as_integer(), None);
		assert_eq!(QuantityInput::Float(2.5).as_integer(), None);

		let draft: OrderDraft =
			serde_json::from_str(r#"{"customerName":"Ann","quantity":"4","productId":"P1"}"#)
				.unwrap();
		assert_eq!(draft.quantity.and_then(|q| q.as_integer()), Some(4));
		assert_eq!(draft.product_ref.as_deref(), Some("P1"));
	}
}
