//! Order engine.
//!
//! Coordinates the validator, the product catalog, the code generator and the
//! repository for order creation, lookup, field updates and deletion.

pub mod code;

use crate::validation::{
	check_order_total, parse_quantity, OrderValidator, ValidationMode, Violation, MAX_ORDER_TOTAL,
};
use rust_decimal::Decimal;
use crate::OrderError;
use chrono::Utc;
use code::OrderCodeGenerator;
use orderdesk_config::OrdersConfig;
use orderdesk_storage::{OrderRepository, ProductCatalog, StorageError};
use orderdesk_types::{
	NewOrder, Order, OrderDraft, OrderFilter, OrderPatch, OrderStatus, OrderUpdate, Product,
};
use std::sync::Arc;

/// Order creation and maintenance.
pub struct OrderEngine {
	repository: Arc<dyn OrderRepository>,
	catalog: Arc<dyn ProductCatalog>,
	validator: OrderValidator,
	codes: OrderCodeGenerator,
	code_max_attempts: u32,
	default_list_limit: usize,
}

impl OrderEngine {
	pub fn new(
		repository: Arc<dyn OrderRepository>,
		catalog: Arc<dyn ProductCatalog>,
		config: &OrdersConfig,
	) -> Self {
		Self {
			repository,
			catalog,
			validator: OrderValidator::new(config.public_max_quantity),
			codes: OrderCodeGenerator::new(config.code_prefix.clone()),
			code_max_attempts: config.code_max_attempts,
			default_list_limit: config.default_list_limit,
		}
	}

	async fn resolve_product(&self, product_ref: Option<&str>) -> Result<Option<Product>, OrderError> {
		match product_ref.map(str::trim).filter(|r| !r.is_empty()) {
			Some(product_ref) => self.catalog.find_by_ref(product_ref).await.map_err(|e| {
				OrderError::DependencyUnavailable(format!("product catalog: {}", e))
			}),
			None => Ok(None),
		}
	}

	/// Validates a draft and persists it in the initial status.
	///
	/// The total is `quantity × unit_price` unless the draft carries one.
	pub async fn create_order(
		&self,
		draft: OrderDraft,
		mode: ValidationMode,
	) -> Result<Order, OrderError> {
		let product = self.resolve_product(draft.product_ref.as_deref()).await?;

		let violations = self.validator.validate(&draft, product.as_ref(), mode);
		if !violations.is_empty() {
			return Err(OrderError::ValidationFailed(violations));
		}

		let Some(product) = product else {
			return Err(OrderError::ValidationFailed(vec![Violation::new(
				"productRef",
				"product is required",
			)]));
		};
		let Some(quantity) = draft.quantity.as_ref().and_then(parse_quantity) else {
			return Err(OrderError::ValidationFailed(vec![Violation::new(
				"quantity",
				"quantity is required",
			)]));
		};

		let created_at = Utc::now();
		let total_amount = match draft.total_amount {
			Some(total) => total,
			None => priced_total(&product, quantity)?,
		};

		for attempt in 1..=self.code_max_attempts {
			let order_code = self.codes.candidate(created_at.date_naive());
			if self.repository.find_by_code(&order_code).await?.is_some() {
				tracing::debug!(order_code = %order_code, attempt, "Order code taken, retrying");
				continue;
			}

			let new_order = NewOrder {
				order_code,
				customer_name: trimmed(draft.customer_name.as_deref()),
				address: trimmed(draft.address.as_deref()),
				mobile_number: trimmed(draft.mobile_number.as_deref()),
				product_ref: product.product_ref.clone(),
				product_name: product.name.clone(),
				quantity,
				status: OrderStatus::initial(),
				total_amount,
				notes: notes(draft.notes.as_deref()),
				created_at,
			};

			match self.repository.create(new_order).await {
				Ok(order) => {
					tracing::info!(
						order_id = %order.id,
						order_code = %order.order_code,
						total = %order.total_amount,
						"Order created"
					);
					return Ok(order);
				},
				Err(StorageError::Conflict(reason)) => {
					tracing::debug!(attempt, reason = %reason, "Order code claimed concurrently, retrying");
				},
				Err(e) => return Err(e.into()),
			}
		}

		tracing::warn!(attempts = self.code_max_attempts, "Order code space exhausted");
		Err(OrderError::CodeSpaceExhausted(self.code_max_attempts))
	}

	pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderError> {
		self.repository
			.find_by_id(order_id)
			.await?
			.ok_or_else(|| OrderError::NotFound(order_id.to_string()))
	}

	pub async fn get_order_by_code(&self, order_code: &str) -> Result<Order, OrderError> {
		self.repository
			.find_by_code(order_code)
			.await?
			.ok_or_else(|| OrderError::NotFound(order_code.to_string()))
	}

	/// Lists orders, newest first. A filter without a limit gets the
	/// configured default.
	pub async fn list_orders(&self, mut filter: OrderFilter) -> Result<Vec<Order>, OrderError> {
		if filter.limit.is_none() {
			filter.limit = Some(self.default_list_limit);
		}
		Ok(self.repository.list(&filter).await?)
	}

	/// Applies a partial update.
	///
	/// A product change re-snapshots the product name. The total only changes
	/// when the patch carries one or asks for `recalculate_total`. A status in
	/// the patch is checked for membership only.
	pub async fn update_order(&self, order_id: &str, patch: OrderPatch) -> Result<Order, OrderError> {
		let status = patch
			.status
			.as_deref()
			.map(str::parse::<OrderStatus>)
			.transpose()?;

		let existing = self.get_order(order_id).await?;
		let product = self.resolve_product(patch.product_ref.as_deref()).await?;

		let violations = self
			.validator
			.validate_patch(&patch, product.as_ref(), ValidationMode::Staff);
		if !violations.is_empty() {
			return Err(OrderError::ValidationFailed(violations));
		}

		let quantity = patch.quantity.as_ref().and_then(parse_quantity);
		let total_amount = match patch.total_amount {
			Some(total) => Some(total),
			None if patch.recalculate_total => {
				let priced = match &product {
					Some(product) => Some(product.clone()),
					None => self.resolve_product(Some(&existing.product_ref)).await?,
				};
				let Some(priced) = priced else {
					return Err(OrderError::ValidationFailed(vec![Violation::new(
						"productRef",
						format!(
							"product {} does not exist, total cannot be recalculated",
							existing.product_ref
						),
					)]));
				};
				Some(priced_total(&priced, quantity.unwrap_or(existing.quantity))?)
			},
			None => None,
		};

		let update = OrderUpdate {
			customer_name: patch.customer_name.as_deref().map(|s| s.trim().to_string()),
			address: patch.address.as_deref().map(|s| s.trim().to_string()),
			mobile_number: patch.mobile_number.as_deref().map(|s| s.trim().to_string()),
			product_ref: product.as_ref().map(|p| p.product_ref.clone()),
			product_name: product.as_ref().map(|p| p.name.clone()),
			quantity,
			status,
			total_amount,
			notes: patch.notes.as_deref().map(|n| notes(Some(n))),
		};

		let order = self
			.repository
			.update(order_id, update)
			.await?
			.ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

		tracing::info!(order_id = %order_id, "Order updated");
		Ok(order)
	}

	/// Hard-deletes an order.
	pub async fn delete_order(&self, order_id: &str) -> Result<(), OrderError> {
		if !self.repository.delete(order_id).await? {
			return Err(OrderError::NotFound(order_id.to_string()));
		}
		tracing::info!(order_id = %order_id, "Order deleted");
		Ok(())
	}
}

fn trimmed(value: Option<&str>) -> String {
	value.map(str::trim).unwrap_or_default().to_string()
}

/// `quantity × unit_price`, rejected when it leaves the accepted range.
fn priced_total(product: &Product, quantity: u32) -> Result<Decimal, OrderError> {
	let violation = match product.price_for(quantity) {
		Some(total) => match check_order_total(total) {
			None => return Ok(total),
			Some(violation) => violation,
		},
		None => Violation::new(
			"totalAmount",
			format!("total amount must not exceed {}", MAX_ORDER_TOTAL),
		),
	};
	Err(OrderError::ValidationFailed(vec![violation]))
}

fn notes(value: Option<&str>) -> Option<String> {
	value
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{catalog_with, memory_repository, new_order, tea, FailingCatalog};
	use orderdesk_types::QuantityInput;
	use rust_decimal::Decimal;

	async fn engine() -> OrderEngine {
		OrderEngine::new(
			memory_repository(),
			catalog_with(vec![tea()]).await,
			&OrdersConfig::default(),
		)
	}

	fn draft(quantity: i64) -> OrderDraft {
		OrderDraft {
			customer_name: Some("  Ann Perera ".into()),
			address: Some("12 Harbour Road".into()),
			mobile_number: Some("070-123-4567".into()),
			product_ref: Some("TEA-01".into()),
			quantity: Some(QuantityInput::Integer(quantity)),
			total_amount: None,
			notes: Some("  ".into()),
		}
	}

	#[tokio::test]
	async fn test_create_starts_placed_with_computed_total() {
		let engine = engine().await;
		let order = engine
			.create_order(draft(3), ValidationMode::Public)
			.await
			.unwrap();

		assert_eq!(order.status, OrderStatus::Placed);
		assert_eq!(order.total_amount, Decimal::new(750, 2));
		assert_eq!(order.customer_name, "Ann Perera");
		assert_eq!(order.product_name, "Ceylon Tea");
		assert_eq!(order.notes, None);
		assert!(order.order_code.starts_with(&format!(
			"ORD{}",
			order.created_at.format("%Y%m%d")
		)));
		assert_eq!(engine.get_order(&order.id).await.unwrap(), order);
		assert_eq!(engine.get_order_by_code(&order.order_code).await.unwrap(), order);
	}

	#[tokio::test]
	async fn test_explicit_total_is_kept() {
		let engine = engine().await;
		let mut with_total = draft(2);
		with_total.total_amount = Some(Decimal::new(4, 0));
		let order = engine
			.create_order(with_total, ValidationMode::Public)
			.await
			.unwrap();
		assert_eq!(order.total_amount, Decimal::new(4, 0));
	}

	#[tokio::test]
	async fn test_oversized_totals_are_rejected() {
		let engine = engine().await;
		let mut explicit = draft(1);
		explicit.total_amount = Some(Decimal::MAX);
		for mode in [ValidationMode::Public, ValidationMode::Staff] {
			assert!(matches!(
				engine.create_order(explicit.clone(), mode).await,
				Err(OrderError::ValidationFailed(_))
			));
		}

		let mut pricey = tea();
		pricey.unit_price = Decimal::MAX;
		let engine = OrderEngine::new(
			memory_repository(),
			catalog_with(vec![pricey]).await,
			&OrdersConfig::default(),
		);
		let err = engine
			.create_order(draft(2), ValidationMode::Staff)
			.await
			.unwrap_err();
		match err {
			OrderError::ValidationFailed(violations) => {
				assert_eq!(violations[0].field, "totalAmount")
			},
			other => panic!("unexpected error: {other}"),
		}
		assert!(engine
			.list_orders(OrderFilter::default())
			.await
			.unwrap()
			.is_empty());
	}

	#[tokio::test]
	async fn test_create_reports_violations() {
		let engine = engine().await;
		let mut bad = draft(101);
		bad.mobile_number = Some("12345".into());

		let err = engine
			.create_order(bad.clone(), ValidationMode::Public)
			.await
			.unwrap_err();
		match err {
			OrderError::ValidationFailed(violations) => assert_eq!(violations.len(), 2),
			other => panic!("unexpected error: {other}"),
		}

		bad.mobile_number = Some("0701234567".into());
		let order = engine
			.create_order(bad, ValidationMode::Staff)
			.await
			.unwrap();
		assert_eq!(order.quantity, 101);
	}

	#[tokio::test]
	async fn test_catalog_outage_is_a_dependency_error() {
		let engine = OrderEngine::new(
			memory_repository(),
			Arc::new(FailingCatalog),
			&OrdersConfig::default(),
		);
		assert!(matches!(
			engine.create_order(draft(1), ValidationMode::Public).await,
			Err(OrderError::DependencyUnavailable(_))
		));
	}

	#[tokio::test]
	async fn test_code_space_exhaustion() {
		let repository = memory_repository();
		let day = Utc::now();
		let prefix = OrderCodeGenerator::default();
		for suffix in 0..OrderCodeGenerator::SUFFIX_SPACE {
			let code = prefix.format(day.date_naive(), suffix);
			repository
				.create(new_order(&code, "Ann", "0701234567", "TEA-01", 1, day))
				.await
				.unwrap();
		}

		let config = OrdersConfig {
			code_max_attempts: 5,
			..Default::default()
		};
		let engine = OrderEngine::new(repository, catalog_with(vec![tea()]).await, &config);
		assert!(matches!(
			engine.create_order(draft(1), ValidationMode::Public).await,
			Err(OrderError::CodeSpaceExhausted(5))
		));
	}

	#[tokio::test]
	async fn test_update_resnapshots_product_and_recalculates() {
		let mut green = tea();
		green.product_ref = "TEA-02".into();
		green.name = "Green Tea".into();
		green.unit_price = Decimal::new(400, 2);

		let engine = OrderEngine::new(
			memory_repository(),
			catalog_with(vec![tea(), green]).await,
			&OrdersConfig::default(),
		);
		let order = engine
			.create_order(draft(2), ValidationMode::Public)
			.await
			.unwrap();

		let kept_total = engine
			.update_order(
				&order.id,
				OrderPatch {
					quantity: Some(QuantityInput::Integer(4)),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(kept_total.quantity, 4);
		assert_eq!(kept_total.total_amount, order.total_amount);

		let switched = engine
			.update_order(
				&order.id,
				OrderPatch {
					product_ref: Some("TEA-02".into()),
					recalculate_total: true,
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(switched.product_name, "Green Tea");
		assert_eq!(switched.total_amount, Decimal::new(1600, 2));
		assert_eq!(switched.order_code, order.order_code);
		assert_eq!(switched.created_at, order.created_at);
	}

	#[tokio::test]
	async fn test_update_trims_and_clears_notes() {
		let engine = engine().await;
		let order = engine
			.create_order(draft(1), ValidationMode::Public)
			.await
			.unwrap();

		let noted = engine
			.update_order(
				&order.id,
				OrderPatch {
					notes: Some("  leave at gate ".into()),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(noted.notes.as_deref(), Some("leave at gate"));

		let cleared = engine
			.update_order(
				&order.id,
				OrderPatch {
					notes: Some("   ".into()),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(cleared.notes, None);
	}

	#[tokio::test]
	async fn test_update_status_and_validation() {
		let engine = engine().await;
		let order = engine
			.create_order(draft(1), ValidationMode::Public)
			.await
			.unwrap();

		let updated = engine
			.update_order(
				&order.id,
				OrderPatch {
					status: Some("delivered".into()),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Delivered);

		assert!(matches!(
			engine
				.update_order(
					&order.id,
					OrderPatch {
						status: Some("lost".into()),
						..Default::default()
					},
				)
				.await,
			Err(OrderError::InvalidStatus(_))
		));
		assert!(matches!(
			engine
				.update_order(
					&order.id,
					OrderPatch {
						customer_name: Some("A".into()),
						..Default::default()
					},
				)
				.await,
			Err(OrderError::ValidationFailed(_))
		));
		assert!(matches!(
			engine.update_order("missing", OrderPatch::default()).await,
			Err(OrderError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_delete_and_list() {
		let engine = engine().await;
		let first = engine
			.create_order(draft(1), ValidationMode::Public)
			.await
			.unwrap();
		engine
			.create_order(draft(2), ValidationMode::Public)
			.await
			.unwrap();

		assert_eq!(engine.list_orders(OrderFilter::default()).await.unwrap().len(), 2);
		engine.delete_order(&first.id).await.unwrap();
		assert!(matches!(
			engine.delete_order(&first.id).await,
			Err(OrderError::NotFound(_))
		));
		assert_eq!(engine.list_orders(OrderFilter::default()).await.unwrap().len(), 1);
	}
}
