//! Derived analytics and courier report types.
//!
//! These are the response shapes of the aggregation engine. Every numeric
//! field defaults to zero so an empty order set produces a fully populated
//! report.

use crate::{CustomerTotals, Order, OrderStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
	pub total_orders: u64,
	/// Orders still in `placed`.
	pub pending: u64,
	pub received: u64,
	pub issued: u64,
	/// Orders anywhere in the courier subset.
	pub courier: u64,
	pub cancelled: u64,
	/// Orders created on the current UTC day.
	pub today: u64,
	/// Orders created in the current UTC calendar month.
	pub this_month: u64,
	pub total_revenue: Decimal,
}

/// One day of the trailing daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
	pub date: NaiveDate,
	pub order_count: u64,
	pub revenue: Decimal,
}

/// One calendar month of the trailing monthly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
	/// `YYYY-MM`.
	pub month: String,
	pub order_count: u64,
	pub revenue: Decimal,
	pub average_order_value: Decimal,
}

/// Number of customers whose first order fell on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomersBucket {
	pub date: NaiveDate,
	pub new_customers: u64,
}

/// Customer rankings and acquisition series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAnalytics {
	pub top_customers: Vec<CustomerTotals>,
	pub new_customers: Vec<NewCustomersBucket>,
}

/// Lifecycle checkpoints shown on a delivery timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimelineStage {
	Placed,
	Processed,
	SentToCourier,
	InTransit,
	Delivered,
}

impl TimelineStage {
	pub const ALL: [TimelineStage; 5] = [
		TimelineStage::Placed,
		TimelineStage::Processed,
		TimelineStage::SentToCourier,
		TimelineStage::InTransit,
		TimelineStage::Delivered,
	];

	/// Minimum status rank at which this checkpoint counts as reached.
	pub fn rank(&self) -> u8 {
		match self {
			TimelineStage::Placed => 0,
			TimelineStage::Processed => 1,
			TimelineStage::SentToCourier => 3,
			TimelineStage::InTransit => 4,
			TimelineStage::Delivered => 5,
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			TimelineStage::Placed => "Order placed",
			TimelineStage::Processed => "Order processed",
			TimelineStage::SentToCourier => "Handed to courier",
			TimelineStage::InTransit => "In transit",
			TimelineStage::Delivered => "Delivered",
		}
	}
}

/// A single checkpoint on a delivery timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineCheckpoint {
	pub stage: TimelineStage,
	pub label: String,
	pub completed: bool,
	/// Approximate time the checkpoint was reached.
	pub timestamp: Option<DateTime<Utc>>,
}

/// Reconstructed delivery timeline of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryTimeline {
	pub order_id: String,
	pub order_code: String,
	pub status: OrderStatus,
	pub checkpoints: Vec<TimelineCheckpoint>,
}

/// Courier counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierStats {
	pub total: u64,
	pub sent_to_courier: u64,
	pub in_transit: u64,
	pub delivered: u64,
	/// Delivered orders whose last update fell on the current UTC day.
	pub delivered_today: u64,
	pub average_delivery_days: f64,
}

/// Outcome of one order in a bulk courier update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAdvanceItem {
	pub order_id: String,
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order: Option<Order>,
}

/// Per-order report of a bulk courier update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAdvanceReport {
	pub status: OrderStatus,
	pub succeeded: usize,
	pub failed: usize,
	pub results: Vec<BulkAdvanceItem>,
}
