//! Courier subsystem.
//!
//! A view over the orders that have left the warehouse: listing, table-checked
//! status advancement (single and bulk), counters and delivery timelines.

use crate::analytics::{average_delivery_days, delivery_timeline};
use crate::state::OrderStateMachine;
use crate::OrderError;
use chrono::{DateTime, Utc};
use orderdesk_storage::OrderRepository;
use orderdesk_types::{
	BulkAdvanceItem, BulkAdvanceReport, CourierStats, DeliveryTimeline, Order, OrderFilter,
	OrderStatus,
};
use std::sync::Arc;

pub struct CourierService {
	repository: Arc<dyn OrderRepository>,
	state: Arc<OrderStateMachine>,
}

impl CourierService {
	pub fn new(repository: Arc<dyn OrderRepository>, state: Arc<OrderStateMachine>) -> Self {
		Self { repository, state }
	}

	/// Orders in the courier subset, newest first, optionally narrowed to one
	/// status and a search term. A status outside the subset matches nothing.
	pub async fn get_courier_orders(
		&self,
		status: Option<OrderStatus>,
		search: Option<&str>,
	) -> Result<Vec<Order>, OrderError> {
		let mut filter = OrderFilter::default().with_statuses(OrderStatus::COURIER);
		if let Some(status) = status {
			if !status.is_courier() {
				return Ok(Vec::new());
			}
			filter = filter.with_status(status);
		}
		if let Some(search) = search {
			filter = filter.with_search(search);
		}
		Ok(self.repository.list(&filter).await?)
	}

	pub async fn advance(&self, order_id: &str, status: OrderStatus) -> Result<Order, OrderError> {
		self.state.advance_courier_status(order_id, status).await
	}

	/// Advances each order independently. Failures are reported per order and
	/// never stop the batch.
	pub async fn bulk_advance(&self, order_ids: &[String], status: OrderStatus) -> BulkAdvanceReport {
		let mut results = Vec::with_capacity(order_ids.len());
		for order_id in order_ids {
			let item = match self.state.advance_courier_status(order_id, status).await {
				Ok(order) => BulkAdvanceItem {
					order_id: order_id.clone(),
					success: true,
					error: None,
					order: Some(order),
				},
				Err(e) => {
					tracing::warn!(order_id = %order_id, error = %e, "Bulk courier update failed for order");
					BulkAdvanceItem {
						order_id: order_id.clone(),
						success: false,
						error: Some(e.to_string()),
						order: None,
					}
				},
			};
			results.push(item);
		}

		let succeeded = results.iter().filter(|r| r.success).count();
		tracing::info!(
			status = %status,
			succeeded,
			failed = results.len() - succeeded,
			"Bulk courier update finished"
		);
		BulkAdvanceReport {
			status,
			succeeded,
			failed: results.len() - succeeded,
			results,
		}
	}

	/// Courier counters as of `now`.
	pub async fn courier_stats(&self, now: DateTime<Utc>) -> Result<CourierStats, OrderError> {
		let orders = self
			.repository
			.list(&OrderFilter::default().with_statuses(OrderStatus::COURIER))
			.await?;
		let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count() as u64;
		let today = now.date_naive();

		Ok(CourierStats {
			total: orders.len() as u64,
			sent_to_courier: count(OrderStatus::SentToCourier),
			in_transit: count(OrderStatus::InTransit),
			delivered: count(OrderStatus::Delivered),
			delivered_today: orders
				.iter()
				.filter(|o| o.status == OrderStatus::Delivered && o.updated_at.date_naive() == today)
				.count() as u64,
			average_delivery_days: average_delivery_days(&orders),
		})
	}

	pub async fn timeline(&self, order_id: &str) -> Result<DeliveryTimeline, OrderError> {
		let order = self
			.repository
			.find_by_id(order_id)
			.await?
			.ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;
		Ok(delivery_timeline(&order))
	}
}
