//! Shared fixtures for unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orderdesk_storage::{
	implementations::memory::MemoryStorage, OrderRepository, ProductCatalog, StorageError,
	StorageOrderRepository, StorageProductCatalog, StorageService,
};
use orderdesk_types::{NewOrder, Order, OrderFilter, OrderStatus, OrderUpdate, Product};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_CODE: AtomicU32 = AtomicU32::new(1);

pub(crate) fn memory_repository() -> Arc<dyn OrderRepository> {
	Arc::new(StorageOrderRepository::new(Arc::new(StorageService::new(
		Box::new(MemoryStorage::new()),
	))))
}

pub(crate) async fn catalog_with(products: Vec<Product>) -> Arc<dyn ProductCatalog> {
	let catalog = StorageProductCatalog::new(Arc::new(StorageService::new(Box::new(
		MemoryStorage::new(),
	))));
	for product in products {
		catalog.upsert(product).await.unwrap();
	}
	Arc::new(catalog)
}

pub(crate) fn tea() -> Product {
	Product::new("TEA-01", "Ceylon Tea", Decimal::new(250, 2))
}

pub(crate) fn new_order(
	code: &str,
	name: &str,
	mobile: &str,
	product_ref: &str,
	amount: i64,
	created_at: DateTime<Utc>,
) -> NewOrder {
	NewOrder {
		order_code: code.to_string(),
		customer_name: name.to_string(),
		address: "12 Harbour Road".to_string(),
		mobile_number: mobile.to_string(),
		product_ref: product_ref.to_string(),
		product_name: format!("{} product", product_ref),
		quantity: 1,
		status: OrderStatus::Placed,
		total_amount: Decimal::new(amount, 0),
		notes: None,
		created_at,
	}
}

/// An order record that was never persisted.
pub(crate) fn order_record(code: &str, status: OrderStatus, created_at: DateTime<Utc>) -> Order {
	let mut new = new_order(code, "Ann", "0701234567", "TEA-01", 100, created_at);
	new.status = status;
	new.into_order(code.to_lowercase())
}

pub(crate) async fn order_at(
	repository: &Arc<dyn OrderRepository>,
	code: &str,
	status: OrderStatus,
	created_at: DateTime<Utc>,
) -> Order {
	let mut new = new_order(code, "Ann", "0701234567", "TEA-01", 100, created_at);
	new.status = status;
	repository.create(new).await.unwrap()
}

pub(crate) async fn seed_order(repository: &Arc<dyn OrderRepository>, status: OrderStatus) -> Order {
	let code = format!("SEED{:05}", NEXT_CODE.fetch_add(1, Ordering::Relaxed));
	order_at(repository, &code, status, Utc::now()).await
}

/// Repository whose every call fails.
pub(crate) struct FailingRepository;

fn offline() -> StorageError {
	StorageError::Backend("connection refused".into())
}

#[async_trait]
impl OrderRepository for FailingRepository {
	async fn create(&self, _order: NewOrder) -> Result<Order, StorageError> {
		Err(offline())
	}

	async fn find_by_id(&self, _id: &str) -> Result<Option<Order>, StorageError> {
		Err(offline())
	}

	async fn find_by_code(&self, _code: &str) -> Result<Option<Order>, StorageError> {
		Err(offline())
	}

	async fn list(&self, _filter: &OrderFilter) -> Result<Vec<Order>, StorageError> {
		Err(offline())
	}

	async fn update(&self, _id: &str, _update: OrderUpdate) -> Result<Option<Order>, StorageError> {
		Err(offline())
	}

	async fn delete(&self, _id: &str) -> Result<bool, StorageError> {
		Err(offline())
	}
}

/// Catalog whose every call fails.
pub(crate) struct FailingCatalog;

#[async_trait]
impl ProductCatalog for FailingCatalog {
	async fn find_by_ref(&self, _product_ref: &str) -> Result<Option<Product>, StorageError> {
		Err(offline())
	}

	async fn list(&self) -> Result<Vec<Product>, StorageError> {
		Err(offline())
	}

	async fn upsert(&self, _product: Product) -> Result<(), StorageError> {
		Err(offline())
	}
}
