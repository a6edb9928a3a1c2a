//! Common types module for the order desk system.
//!
//! This module defines the core data types shared by the storage backends,
//! the order engine and the HTTP service. It provides a single place for the
//! order record, its status vocabulary, filters and derived analytics shapes.

/// Aggregate rows produced by repository grouping queries.
pub mod aggregate;
/// Derived analytics and courier report types.
pub mod analytics;
/// API error types for HTTP endpoints.
pub mod api;
/// Order listing filters.
pub mod filter;
/// The order record, its status set and creation/update payloads.
pub mod order;
/// Catalog product types.
pub mod product;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Storage namespaces.
pub mod storage;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use aggregate::*;
pub use analytics::*;
pub use api::*;
pub use filter::*;
pub use order::*;
pub use product::*;
pub use registry::*;
pub use storage::*;
pub use validation::*;
