//! Order listing filters.
//!
//! A filter is evaluated in memory by the storage-backed repository. Backends
//! that can push predicates down to their store must produce the same result
//! set and ordering.

use crate::{Order, OrderStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound applied to any requested listing limit.
pub const MAX_LIST_LIMIT: usize = 1000;

/// Inclusive range of UTC calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
	pub start: NaiveDate,
	pub end: NaiveDate,
}

impl DateRange {
	pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
		Self { start, end }
	}

	pub fn contains(&self, day: NaiveDate) -> bool {
		self.start <= day && day <= self.end
	}
}

/// Criteria for listing orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFilter {
	/// Exact status match.
	pub status: Option<OrderStatus>,
	/// Any-of status match; empty means no restriction.
	#[serde(default)]
	pub statuses: Vec<OrderStatus>,
	/// Case-insensitive substring over customer name, mobile number and order code.
	pub search: Option<String>,
	/// Inclusive creation-date window.
	pub date_range: Option<DateRange>,
	/// Maximum number of results, clamped to [`MAX_LIST_LIMIT`]. `None` is unbounded.
	pub limit: Option<usize>,
}

impl OrderFilter {
	pub fn with_status(mut self, status: OrderStatus) -> Self {
		self.status = Some(status);
		self
	}

	pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
		self.statuses = statuses.into_iter().collect();
		self
	}

	pub fn with_search(mut self, search: impl Into<String>) -> Self {
		self.search = Some(search.into());
		self
	}

	pub fn with_date_range(mut self, range: DateRange) -> Self {
		self.date_range = Some(range);
		self
	}

	pub fn with_limit(mut self, limit: usize) -> Self {
		self.limit = Some(limit);
		self
	}

	/// The limit after clamping, if any.
	pub fn effective_limit(&self) -> Option<usize> {
		self.limit.map(|l| l.clamp(1, MAX_LIST_LIMIT))
	}

	/// Whether a single order satisfies every criterion.
	pub fn matches(&self, order: &Order) -> bool {
		if let Some(status) = self.status {
			if order.status != status {
				return false;
			}
		}
		if !self.statuses.is_empty() && !self.statuses.contains(&order.status) {
			return false;
		}
		if let Some(range) = &self.date_range {
			if !range.contains(order.created_date()) {
				return false;
			}
		}
		match self.search.as_deref().map(str::trim) {
			Some(term) if !term.is_empty() => {
				let needle = term.to_lowercase();
				order.customer_name.to_lowercase().contains(&needle)
					|| order.mobile_number.to_lowercase().contains(&needle)
					|| order.order_code.to_lowercase().contains(&needle)
			},
			_ => true,
		}
	}

	/// Filters, orders newest first and truncates to the effective limit.
	pub fn apply(&self, orders: impl IntoIterator<Item = Order>) -> Vec<Order> {
		let mut matched: Vec<Order> = orders.into_iter().filter(|o| self.matches(o)).collect();
		matched.sort_by(|a, b| {
			b.created_at
				.cmp(&a.created_at)
				.then_with(|| b.order_code.cmp(&a.order_code))
		});
		if let Some(limit) = self.effective_limit() {
			matched.truncate(limit);
		}
		matched
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone, Utc};
	use rust_decimal::Decimal;

	fn order(code: &str, name: &str, status: OrderStatus, days_ago: i64) -> Order {
		let created = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap() - Duration::days(days_ago);
		Order {
			id: code.to_lowercase(),
			order_code: code.to_string(),
			customer_name: name.to_string(),
			address: "12 Harbour Road".to_string(),
			mobile_number: "0701234567".to_string(),
			product_ref: "P1".to_string(),
			product_name: "Tea".to_string(),
			quantity: 1,
			status,
			total_amount: Decimal::new(100, 0),
			notes: None,
			created_at: created,
			updated_at: created,
		}
	}

	#[test]
	fn test_search_is_case_insensitive() {
		let filter = OrderFilter::default().with_search("ANN");
		assert!(filter.matches(&order("ORD1", "Joanna", OrderStatus::Placed, 0)));
		assert!(!filter.matches(&order("ORD2", "Bob", OrderStatus::Placed, 0)));

		let by_code = OrderFilter::default().with_search("ord2");
		assert!(by_code.matches(&order("ORD2", "Bob", OrderStatus::Placed, 0)));
	}

	#[test]
	fn test_date_range_is_inclusive() {
		let range = DateRange::new(
			NaiveDate::from_ymd_opt(2024, 3, 13).unwrap(),
			NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
		);
		let filter = OrderFilter::default().with_date_range(range);
		assert!(!filter.matches(&order("A", "Ann", OrderStatus::Placed, 0)));
		assert!(filter.matches(&order("B", "Ann", OrderStatus::Placed, 1)));
		assert!(filter.matches(&order("C", "Ann", OrderStatus::Placed, 2)));
		assert!(!filter.matches(&order("D", "Ann", OrderStatus::Placed, 3)));
	}

	#[test]
	fn test_apply_orders_newest_first_and_clamps_limit() {
		let orders = vec![
			order("A", "Ann", OrderStatus::Placed, 3),
			order("B", "Ann", OrderStatus::Delivered, 1),
			order("C", "Ann", OrderStatus::InTransit, 2),
		];
		let listed = OrderFilter::default()
			.with_statuses(OrderStatus::COURIER)
			.apply(orders.clone());
		let codes: Vec<_> = listed.iter().map(|o| o.order_code.as_str()).collect();
		assert_eq!(codes, vec!["B", "C"]);

		assert_eq!(OrderFilter::default().with_limit(5000).effective_limit(), Some(MAX_LIST_LIMIT));
		assert_eq!(OrderFilter::default().with_limit(1).apply(orders).len(), 1);
	}
}
