//! Builder for constructing an order desk.
//!
//! Creates the configured storage backends through factory functions, wraps
//! the primary one in the order repository and product catalog, seeds the
//! catalog from configuration and wires the services together.

use crate::analytics::AnalyticsService;
use crate::courier::CourierService;
use crate::engine::OrderEngine;
use crate::state::OrderStateMachine;
use crate::OrderDesk;
use orderdesk_config::Config;
use orderdesk_storage::{
	OrderRepository, ProductCatalog, StorageError, StorageInterface, StorageOrderRepository,
	StorageProductCatalog, StorageService,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while building an order desk.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Catalog seeding failed: {0}")]
	Seed(String),
}

/// Factory functions keyed by the implementation name used in configuration.
pub struct OrderDeskFactories<SF> {
	pub storage_factories: HashMap<String, SF>,
}

/// Builder for constructing an [`OrderDesk`] with pluggable storage.
pub struct OrderDeskBuilder {
	config: Config,
}

impl OrderDeskBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub async fn build<SF>(self, factories: OrderDeskFactories<SF>) -> Result<OrderDesk, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let Some(factory) = factories.storage_factories.get(name) else {
				tracing::warn!(component = "storage", implementation = %name, "Unknown implementation, skipping");
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					storage_impls.insert(name.clone(), implementation);
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has no known implementation",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let repository: Arc<dyn OrderRepository> =
			Arc::new(StorageOrderRepository::new(storage.clone()));
		let catalog: Arc<dyn ProductCatalog> = Arc::new(StorageProductCatalog::new(storage));

		for product in &self.config.catalog.products {
			catalog
				.upsert(product.clone())
				.await
				.map_err(|e| BuilderError::Seed(format!("{}: {}", product.product_ref, e)))?;
		}
		tracing::info!(
			component = "catalog",
			products = self.config.catalog.products.len(),
			"Seeded"
		);

		let state = Arc::new(OrderStateMachine::new(repository.clone()));
		Ok(OrderDesk {
			engine: OrderEngine::new(repository.clone(), catalog.clone(), &self.config.orders),
			analytics: AnalyticsService::new(repository.clone()),
			courier: CourierService::new(repository, state.clone()),
			state,
			catalog,
			config: self.config,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::validation::ValidationMode;
	use orderdesk_storage::get_all_implementations;
	use orderdesk_types::{OrderDraft, OrderStatus, QuantityInput};
	use rust_decimal::Decimal;

	fn factories() -> OrderDeskFactories<orderdesk_storage::StorageFactory> {
		OrderDeskFactories {
			storage_factories: get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	const CONFIG: &str = r#"
[service]
id = "desk-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[[catalog.products]]
ref = "TEA-01"
name = "Ceylon Tea"
unit_price = "2.50"
"#;

	#[tokio::test]
	async fn test_build_seeds_catalog_and_wires_services() {
		let config: Config = CONFIG.parse().unwrap();
		let desk = OrderDeskBuilder::new(config)
			.build(factories())
			.await
			.unwrap();

		let products = desk.catalog().list().await.unwrap();
		assert_eq!(products.len(), 1);

		let order = desk
			.engine()
			.create_order(
				OrderDraft {
					customer_name: Some("Ann Perera".into()),
					address: Some("12 Harbour Road".into()),
					mobile_number: Some("0701234567".into()),
					product_ref: Some("TEA-01".into()),
					quantity: Some(QuantityInput::Integer(2)),
					..Default::default()
				},
				ValidationMode::Public,
			)
			.await
			.unwrap();
		assert_eq!(order.total_amount, Decimal::new(500, 2));

		desk.state()
			.set_status(&order.id, OrderStatus::SentToCourier)
			.await
			.unwrap();
		let stats = desk.courier().courier_stats(chrono::Utc::now()).await.unwrap();
		assert_eq!(stats.sent_to_courier, 1);
	}

	#[tokio::test]
	async fn test_unknown_primary_fails() {
		let mut config: Config = CONFIG.parse().unwrap();
		config.storage.primary = "redis".into();
		config
			.storage
			.implementations
			.insert("redis".into(), toml::Value::Table(Default::default()));

		assert!(matches!(
			OrderDeskBuilder::new(config).build(factories()).await,
			Err(BuilderError::Config(_))
		));
	}
}
