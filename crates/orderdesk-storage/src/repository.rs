//! Order repository abstraction and its storage-backed implementation.

use crate::{optional, StorageError, StorageService};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orderdesk_types::{
	aggregate, CustomerTotals, NewOrder, Order, OrderFilter, OrderStatus, OrderUpdate,
	ProductTotals, RevenueTotals, StatusCounts, StorageKey,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Persistence contract for orders.
///
/// The aggregate queries have default implementations computed over
/// [`list`](OrderRepository::list); backends with a query engine can push
/// them down instead.
#[async_trait]
pub trait OrderRepository: Send + Sync {
	/// Persists a new order and assigns its id. Fails with
	/// [`StorageError::Conflict`] if the order code is already taken.
	async fn create(&self, order: NewOrder) -> Result<Order, StorageError>;

	async fn find_by_id(&self, id: &str) -> Result<Option<Order>, StorageError>;

	async fn find_by_code(&self, code: &str) -> Result<Option<Order>, StorageError>;

	/// Lists matching orders, newest first.
	async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError>;

	/// Applies field changes and refreshes `updated_at`. Returns `None` when
	/// the order does not exist.
	async fn update(&self, id: &str, update: OrderUpdate) -> Result<Option<Order>, StorageError>;

	async fn update_status(
		&self,
		id: &str,
		status: OrderStatus,
	) -> Result<Option<Order>, StorageError> {
		self.update(id, OrderUpdate::status(status)).await
	}

	/// Hard delete. Returns whether an order was removed.
	async fn delete(&self, id: &str) -> Result<bool, StorageError>;

	async fn count_by_status(&self) -> Result<StatusCounts, StorageError> {
		let orders = self.list(&OrderFilter::default()).await?;
		Ok(aggregate::count_by_status(&orders))
	}

	/// Count and revenue of orders created in `[start, end)`.
	async fn sum_by_date_range(
		&self,
		start: DateTime<Utc>,
		end: DateTime<Utc>,
	) -> Result<RevenueTotals, StorageError> {
		let orders = self.list(&OrderFilter::default()).await?;
		Ok(aggregate::sum_in_range(&orders, start, end)?)
	}

	async fn group_by_product(&self) -> Result<Vec<ProductTotals>, StorageError> {
		let orders = self.list(&OrderFilter::default()).await?;
		Ok(aggregate::group_by_product(&orders)?)
	}

	async fn group_by_customer(&self) -> Result<Vec<CustomerTotals>, StorageError> {
		let orders = self.list(&OrderFilter::default()).await?;
		Ok(aggregate::group_by_customer(&orders)?)
	}

	/// Time of the first order of every distinct customer.
	async fn first_order_dates(&self) -> Result<Vec<DateTime<Utc>>, StorageError> {
		let customers = self.group_by_customer().await?;
		Ok(customers.into_iter().map(|c| c.first_order_at).collect())
	}
}

/// Order repository on top of a [`StorageService`].
///
/// Orders are stored under [`StorageKey::Orders`] by id, with a code to id
/// index under [`StorageKey::OrderCodes`]. Mutations take a single write lock
/// so each read-modify-write sequence is atomic.
pub struct StorageOrderRepository {
	storage: Arc<StorageService>,
	write_lock: Mutex<()>,
}

impl StorageOrderRepository {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			write_lock: Mutex::new(()),
		}
	}

	async fn load(&self, id: &str) -> Result<Option<Order>, StorageError> {
		optional(self.storage.retrieve(StorageKey::Orders.as_str(), id).await)
	}
}

#[async_trait]
impl OrderRepository for StorageOrderRepository {
	async fn create(&self, order: NewOrder) -> Result<Order, StorageError> {
		let _guard = self.write_lock.lock().await;

		let codes = StorageKey::OrderCodes.as_str();
		if self.storage.exists(codes, &order.order_code).await? {
			return Err(StorageError::Conflict(format!(
				"order code {} is already in use",
				order.order_code
			)));
		}

		let order = order.into_order(Uuid::new_v4().to_string());
		self.storage
			.store(StorageKey::Orders.as_str(), &order.id, &order)
			.await?;
		self.storage
			.store(codes, &order.order_code, &order.id)
			.await?;

		tracing::debug!(order_id = %order.id, order_code = %order.order_code, "Stored new order");
		Ok(order)
	}

	async fn find_by_id(&self, id: &str) -> Result<Option<Order>, StorageError> {
		self.load(id).await
	}

	async fn find_by_code(&self, code: &str) -> Result<Option<Order>, StorageError> {
		let id: Option<String> =
			optional(self.storage.retrieve(StorageKey::OrderCodes.as_str(), code).await)?;
		match id {
			Some(id) => self.load(&id).await,
			None => Ok(None),
		}
	}

	async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError> {
		let orders: Vec<Order> = self
			.storage
			.retrieve_all(StorageKey::Orders.as_str())
			.await?;
		Ok(filter.apply(orders))
	}

	async fn update(&self, id: &str, update: OrderUpdate) -> Result<Option<Order>, StorageError> {
		let _guard = self.write_lock.lock().await;

		let Some(mut order) = self.load(id).await? else {
			return Ok(None);
		};
		update.apply_to(&mut order, Utc::now());
		self.storage
			.update(StorageKey::Orders.as_str(), id, &order)
			.await?;
		Ok(Some(order))
	}

	async fn delete(&self, id: &str) -> Result<bool, StorageError> {
		let _guard = self.write_lock.lock().await;

		let Some(order) = self.load(id).await? else {
			return Ok(false);
		};
		self.storage
			.remove(StorageKey::Orders.as_str(), id)
			.await?;
		self.storage
			.remove(StorageKey::OrderCodes.as_str(), &order.order_code)
			.await?;
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::{file::FileStorage, memory::MemoryStorage};
	use chrono::{Duration, TimeZone};
	use orderdesk_types::DateRange;
	use rust_decimal::Decimal;
	use tempfile::TempDir;

	fn repository() -> StorageOrderRepository {
		StorageOrderRepository::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	fn new_order(code: &str, name: &str, amount: i64, created_at: DateTime<Utc>) -> NewOrder {
		NewOrder {
			order_code: code.to_string(),
			customer_name: name.to_string(),
			address: "42 Lake Drive".to_string(),
			mobile_number: "0712345678".to_string(),
			product_ref: "TEA-01".to_string(),
			product_name: "Ceylon Tea".to_string(),
			quantity: 1,
			status: OrderStatus::Placed,
			total_amount: Decimal::new(amount, 0),
			notes: None,
			created_at,
		}
	}

	#[tokio::test]
	async fn test_create_and_find() {
		let repo = repository();
		let now = Utc::now();
		let created = repo
			.create(new_order("ORD20240101001", "Ann", 100, now))
			.await
			.unwrap();

		assert!(!created.id.is_empty());
		assert_eq!(created.updated_at, created.created_at);
		assert_eq!(repo.find_by_id(&created.id).await.unwrap(), Some(created.clone()));
		assert_eq!(
			repo.find_by_code("ORD20240101001").await.unwrap(),
			Some(created)
		);
		assert_eq!(repo.find_by_code("ORD20240101999").await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_duplicate_code_is_a_conflict() {
		let repo = repository();
		let now = Utc::now();
		repo.create(new_order("ORD20240101001", "Ann", 100, now))
			.await
			.unwrap();
		assert!(matches!(
			repo.create(new_order("ORD20240101001", "Bob", 50, now)).await,
			Err(StorageError::Conflict(_))
		));
	}

	#[tokio::test]
	async fn test_update_status_refreshes_timestamp() {
		let repo = repository();
		let created_at = Utc::now() - Duration::days(2);
		let order = repo
			.create(new_order("ORD1", "Ann", 100, created_at))
			.await
			.unwrap();

		let updated = repo
			.update_status(&order.id, OrderStatus::Received)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Received);
		assert!(updated.updated_at > order.updated_at);
		assert_eq!(updated.created_at, order.created_at);

		assert_eq!(
			repo.update_status("missing", OrderStatus::Received)
				.await
				.unwrap(),
			None
		);
	}

	#[tokio::test]
	async fn test_delete_frees_the_code() {
		let repo = repository();
		let order = repo
			.create(new_order("ORD1", "Ann", 100, Utc::now()))
			.await
			.unwrap();

		assert!(repo.delete(&order.id).await.unwrap());
		assert!(!repo.delete(&order.id).await.unwrap());
		assert_eq!(repo.find_by_code("ORD1").await.unwrap(), None);
		repo.create(new_order("ORD1", "Bob", 10, Utc::now()))
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_list_and_default_aggregates() {
		let repo = repository();
		let day = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
		repo.create(new_order("ORD1", "Ann", 100, day)).await.unwrap();
		repo.create(new_order("ORD2", "Bob", 200, day + Duration::hours(1)))
			.await
			.unwrap();
		repo.create(new_order("ORD3", "Ann", 300, day - Duration::days(1)))
			.await
			.unwrap();

		let listed = repo.list(&OrderFilter::default()).await.unwrap();
		let codes: Vec<_> = listed.iter().map(|o| o.order_code.as_str()).collect();
		assert_eq!(codes, vec!["ORD2", "ORD1", "ORD3"]);

		let on_day = OrderFilter::default()
			.with_date_range(DateRange::new(day.date_naive(), day.date_naive()));
		assert_eq!(repo.list(&on_day).await.unwrap().len(), 2);

		let counts = repo.count_by_status().await.unwrap();
		assert_eq!(counts.get(&OrderStatus::Placed), Some(&3));

		let start = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
		let totals = repo
			.sum_by_date_range(start, start + Duration::days(1))
			.await
			.unwrap();
		assert_eq!(totals.order_count, 2);
		assert_eq!(totals.revenue, Decimal::new(300, 0));

		let customers = repo.group_by_customer().await.unwrap();
		assert_eq!(customers.len(), 2);
		assert_eq!(repo.first_order_dates().await.unwrap().len(), 2);
	}

	#[tokio::test]
	async fn test_file_backed_repository_persists() {
		let temp_dir = TempDir::new().unwrap();
		let open = || {
			StorageOrderRepository::new(Arc::new(StorageService::new(Box::new(
				FileStorage::new(temp_dir.path().to_path_buf()),
			))))
		};

		let order = open()
			.create(new_order("ORD1", "Ann", 100, Utc::now()))
			.await
			.unwrap();

		let reopened = open();
		assert_eq!(reopened.find_by_id(&order.id).await.unwrap(), Some(order.clone()));
		assert_eq!(reopened.find_by_code("ORD1").await.unwrap(), Some(order));
	}

	#[tokio::test]
	async fn test_file_backed_lookup_of_control_character_id_is_missing() {
		let temp_dir = TempDir::new().unwrap();
		let repo = StorageOrderRepository::new(Arc::new(StorageService::new(Box::new(
			FileStorage::new(temp_dir.path().to_path_buf()),
		))));

		assert_eq!(repo.find_by_id("a\0b").await.unwrap(), None);
		assert_eq!(repo.find_by_code("ORD\n1").await.unwrap(), None);
		assert!(!repo.delete("a\0b").await.unwrap());
	}
}
