//! Order state machine implementation.
//!
//! Two entry points share the same persistence path but enforce different
//! rules. [`OrderStateMachine::set_status`] accepts any member of the status
//! set. [`OrderStateMachine::advance_courier_status`] only accepts moves
//! listed in the courier transition table:
//!
//! ```text
//! sent-to-courier -> in-transit | delivered
//! in-transit      -> delivered
//! delivered       -> (terminal)
//! ```

use crate::OrderError;
use once_cell::sync::Lazy;
use orderdesk_storage::OrderRepository;
use orderdesk_types::{Order, OrderStatus};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Static courier transition table: each courier state maps to its allowed
/// next states.
static COURIER_TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OrderStatus::SentToCourier,
		HashSet::from([OrderStatus::InTransit, OrderStatus::Delivered]),
	);
	m.insert(
		OrderStatus::InTransit,
		HashSet::from([OrderStatus::Delivered]),
	);
	m.insert(OrderStatus::Delivered, HashSet::new()); // terminal
	m
});

/// Checks a move against the courier transition table.
///
/// Pairs whose source lies outside the courier subset are never valid, and
/// no state maps to itself.
pub fn is_valid_courier_transition(from: OrderStatus, to: OrderStatus) -> bool {
	COURIER_TRANSITIONS
		.get(&from)
		.is_some_and(|allowed| allowed.contains(&to))
}

/// Manages order status changes.
pub struct OrderStateMachine {
	repository: Arc<dyn OrderRepository>,
}

impl OrderStateMachine {
	pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
		Self { repository }
	}

	/// Sets any status from the status set. No transition guard applies, and
	/// setting the current status again only refreshes `updated_at`.
	pub async fn set_status(
		&self,
		order_id: &str,
		new_status: OrderStatus,
	) -> Result<Order, OrderError> {
		let order = self
			.repository
			.update_status(order_id, new_status)
			.await?
			.ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

		tracing::info!(order_id = %order_id, status = %new_status, "Order status set");
		Ok(order)
	}

	/// Parses `raw` and sets it as the status.
	pub async fn set_status_str(&self, order_id: &str, raw: &str) -> Result<Order, OrderError> {
		let status: OrderStatus = raw.parse()?;
		self.set_status(order_id, status).await
	}

	/// Moves an order along the courier pipeline.
	pub async fn advance_courier_status(
		&self,
		order_id: &str,
		new_status: OrderStatus,
	) -> Result<Order, OrderError> {
		let order = self
			.repository
			.find_by_id(order_id)
			.await?
			.ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

		if !is_valid_courier_transition(order.status, new_status) {
			tracing::debug!(
				order_id = %order_id,
				from = %order.status,
				to = %new_status,
				"Rejected courier transition"
			);
			return Err(OrderError::InvalidTransition {
				from: order.status,
				to: new_status,
			});
		}

		let updated = self
			.repository
			.update_status(order_id, new_status)
			.await?
			.ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

		tracing::info!(
			order_id = %order_id,
			from = %order.status,
			to = %new_status,
			"Courier status advanced"
		);
		Ok(updated)
	}
}
