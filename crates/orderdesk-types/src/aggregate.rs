//! Aggregate rows produced by repository grouping queries.
//!
//! The free functions compute each grouping over an in-memory slice. They
//! back the default query implementations of the order repository and are
//! the reference semantics for any backend that pushes grouping down to its
//! store.

use crate::{Order, OrderStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors raised while folding orders into aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
	/// A running revenue total left the representable range.
	#[error("Revenue overflow while aggregating {0}")]
	Overflow(String),
}

fn checked_sum(total: Decimal, amount: Decimal, scope: &str) -> Result<Decimal, AggregateError> {
	total
		.checked_add(amount)
		.ok_or_else(|| AggregateError::Overflow(scope.to_string()))
}

/// Number of orders per status. Statuses without orders are absent.
pub type StatusCounts = BTreeMap<OrderStatus, u64>;

/// Order count and revenue over some set of orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTotals {
	pub order_count: u64,
	pub revenue: Decimal,
}

impl RevenueTotals {
	fn add(&mut self, order: &Order) -> Result<(), AggregateError> {
		self.revenue = checked_sum(self.revenue, order.total_amount, "revenue")?;
		self.order_count += 1;
		Ok(())
	}
}

/// Per-product totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTotals {
	pub product_ref: String,
	/// Name snapshot from the most recent order of this product.
	pub product_name: String,
	pub total_quantity: u64,
	pub order_count: u64,
	pub revenue: Decimal,
}

/// Per-customer totals, keyed by (name, mobile number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerTotals {
	pub customer_name: String,
	pub mobile_number: String,
	pub order_count: u64,
	pub total_spent: Decimal,
	pub first_order_at: DateTime<Utc>,
	pub last_order_at: DateTime<Utc>,
}

/// Counts orders per status.
pub fn count_by_status(orders: &[Order]) -> StatusCounts {
	let mut counts = StatusCounts::new();
	for order in orders {
		*counts.entry(order.status).or_insert(0) += 1;
	}
	counts
}

/// Sums orders created in the half-open window `[start, end)`.
pub fn sum_in_range(
	orders: &[Order],
	start: DateTime<Utc>,
	end: DateTime<Utc>,
) -> Result<RevenueTotals, AggregateError> {
	let mut totals = RevenueTotals::default();
	for order in orders
		.iter()
		.filter(|o| o.created_at >= start && o.created_at < end)
	{
		totals.add(order)?;
	}
	Ok(totals)
}

/// Groups orders by product reference, sorted by reference.
pub fn group_by_product(orders: &[Order]) -> Result<Vec<ProductTotals>, AggregateError> {
	let mut groups: BTreeMap<&str, (ProductTotals, DateTime<Utc>)> = BTreeMap::new();
	for order in orders {
		let (entry, latest) = groups.entry(order.product_ref.as_str()).or_insert_with(|| {
			(
				ProductTotals {
					product_ref: order.product_ref.clone(),
					product_name: order.product_name.clone(),
					total_quantity: 0,
					order_count: 0,
					revenue: Decimal::ZERO,
				},
				order.created_at,
			)
		});
		entry.total_quantity += u64::from(order.quantity);
		entry.order_count += 1;
		entry.revenue = checked_sum(entry.revenue, order.total_amount, &order.product_ref)?;
		if order.created_at > *latest {
			*latest = order.created_at;
			entry.product_name = order.product_name.clone();
		}
	}
	Ok(groups.into_values().map(|(totals, _)| totals).collect())
}

/// Groups orders by customer identity, sorted by (name, mobile).
pub fn group_by_customer(orders: &[Order]) -> Result<Vec<CustomerTotals>, AggregateError> {
	let mut groups: HashMap<(&str, &str), CustomerTotals> = HashMap::new();
	for order in orders {
		let entry = groups
			.entry(order.customer_key())
			.or_insert_with(|| CustomerTotals {
				customer_name: order.customer_name.clone(),
				mobile_number: order.mobile_number.clone(),
				order_count: 0,
				total_spent: Decimal::ZERO,
				first_order_at: order.created_at,
				last_order_at: order.created_at,
			});
		entry.order_count += 1;
		entry.total_spent = checked_sum(entry.total_spent, order.total_amount, &order.customer_name)?;
		entry.first_order_at = entry.first_order_at.min(order.created_at);
		entry.last_order_at = entry.last_order_at.max(order.created_at);
	}
	let mut customers: Vec<CustomerTotals> = groups.into_values().collect();
	customers.sort_by(|a, b| {
		a.customer_name
			.cmp(&b.customer_name)
			.then_with(|| a.mobile_number.cmp(&b.mobile_number))
	});
	Ok(customers)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone};

	fn order(product: &str, customer: &str, amount: i64, hours: i64) -> Order {
		let created = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::hours(hours);
		Order {
			id: format!("{product}-{customer}-{hours}"),
			order_code: format!("ORD{hours}"),
			customer_name: customer.to_string(),
			address: "1 Main Street".to_string(),
			mobile_number: "0770000000".to_string(),
			product_ref: product.to_string(),
			product_name: format!("{product}-name-{hours}"),
			quantity: 2,
			status: OrderStatus::Placed,
			total_amount: Decimal::new(amount, 0),
			notes: None,
			created_at: created,
			updated_at: created,
		}
	}

	#[test]
	fn test_sum_in_range_is_half_open() {
		let orders = vec![order("A", "Ann", 100, 0), order("A", "Ann", 50, 24)];
		let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
		let totals = sum_in_range(&orders, start, start + Duration::days(1)).unwrap();
		assert_eq!(totals.order_count, 1);
		assert_eq!(totals.revenue, Decimal::new(100, 0));
	}

	#[test]
	fn test_group_by_product_keeps_latest_name() {
		let orders = vec![
			order("A", "Ann", 100, 5),
			order("A", "Bob", 200, 1),
			order("B", "Ann", 10, 2),
		];
		let groups = group_by_product(&orders).unwrap();
		assert_eq!(groups.len(), 2);
		assert_eq!(groups[0].product_ref, "A");
		assert_eq!(groups[0].product_name, "A-name-5");
		assert_eq!(groups[0].total_quantity, 4);
		assert_eq!(groups[0].revenue, Decimal::new(300, 0));
	}

	#[test]
	fn test_group_by_customer_tracks_first_order() {
		let orders = vec![order("A", "Ann", 100, 5), order("B", "Ann", 20, 1)];
		let customers = group_by_customer(&orders).unwrap();
		assert_eq!(customers.len(), 1);
		assert_eq!(customers[0].order_count, 2);
		assert_eq!(customers[0].total_spent, Decimal::new(120, 0));
		assert_eq!(customers[0].first_order_at, orders[1].created_at);
	}

	#[test]
	fn test_revenue_overflow_is_an_error() {
		let mut first = order("A", "Ann", 0, 0);
		first.total_amount = Decimal::MAX;
		let mut second = order("A", "Ann", 0, 1);
		second.total_amount = Decimal::MAX;
		let orders = vec![first, second];

		let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
		assert!(matches!(
			sum_in_range(&orders, start, start + Duration::days(1)),
			Err(AggregateError::Overflow(_))
		));
		assert!(group_by_product(&orders).is_err());
		assert!(group_by_customer(&orders).is_err());
	}
}
