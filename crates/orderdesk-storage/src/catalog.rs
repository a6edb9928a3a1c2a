//! Product catalog lookup.

use crate::{optional, StorageError, StorageService};
use async_trait::async_trait;
use orderdesk_types::{Product, StorageKey};
use std::sync::Arc;

/// Read access to the product catalog, plus the upsert used for seeding.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
	async fn find_by_ref(&self, product_ref: &str) -> Result<Option<Product>, StorageError>;

	/// All products, ordered by reference.
	async fn list(&self) -> Result<Vec<Product>, StorageError>;

	async fn upsert(&self, product: Product) -> Result<(), StorageError>;
}

/// Catalog stored under [`StorageKey::Products`].
pub struct StorageProductCatalog {
	storage: Arc<StorageService>,
}

impl StorageProductCatalog {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}
}

#[async_trait]
impl ProductCatalog for StorageProductCatalog {
	async fn find_by_ref(&self, product_ref: &str) -> Result<Option<Product>, StorageError> {
		optional(
			self.storage
				.retrieve(StorageKey::Products.as_str(), product_ref)
				.await,
		)
	}

	async fn list(&self) -> Result<Vec<Product>, StorageError> {
		self.storage
			.retrieve_all(StorageKey::Products.as_str())
			.await
	}

	async fn upsert(&self, product: Product) -> Result<(), StorageError> {
		self.storage
			.store(StorageKey::Products.as_str(), &product.product_ref, &product)
			.await
	}
}
