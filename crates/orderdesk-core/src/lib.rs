//! Core of the order desk system.
//!
//! This crate holds the order lifecycle logic: input validation, the status
//! transition engine, order creation and maintenance, the aggregation engine
//! behind dashboards and analytics, and the courier subsystem. Everything is
//! written against the [`OrderRepository`](orderdesk_storage::OrderRepository)
//! and [`ProductCatalog`](orderdesk_storage::ProductCatalog) traits, and the
//! [`builder`] wires them to a configured storage backend.

use orderdesk_config::Config;
use orderdesk_storage::ProductCatalog;
use std::sync::Arc;

pub mod analytics;
pub mod builder;
pub mod courier;
pub mod engine;
mod error;
pub mod state;
pub mod validation;

#[cfg(test)]
mod testing;

pub use analytics::AnalyticsService;
pub use builder::{BuilderError, OrderDeskBuilder, OrderDeskFactories};
pub use courier::CourierService;
pub use engine::OrderEngine;
pub use error::OrderError;
pub use state::OrderStateMachine;
pub use validation::{ValidationMode, Violation};

/// A fully wired order desk.
///
/// All services share one repository; the desk itself holds no order state.
pub struct OrderDesk {
	config: Config,
	engine: OrderEngine,
	state: Arc<OrderStateMachine>,
	analytics: AnalyticsService,
	courier: CourierService,
	catalog: Arc<dyn ProductCatalog>,
}

impl OrderDesk {
	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn engine(&self) -> &OrderEngine {
		&self.engine
	}

	pub fn state(&self) -> &OrderStateMachine {
		&self.state
	}

	pub fn analytics(&self) -> &AnalyticsService {
		&self.analytics
	}

	pub fn courier(&self) -> &CourierService {
		&self.courier
	}

	pub fn catalog(&self) -> &dyn ProductCatalog {
		self.catalog.as_ref()
	}
}
