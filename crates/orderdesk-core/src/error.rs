//! Error type shared by the order desk operations.

use crate::validation::{describe, Violation};
use orderdesk_storage::StorageError;
use orderdesk_types::{AggregateError, OrderStatus, UnknownStatus};
use thiserror::Error;

/// Errors returned by the order engine, the state machine and the
/// aggregation services.
#[derive(Debug, Error)]
pub enum OrderError {
	/// One or more input fields broke a validation rule.
	#[error("Validation failed: {}", describe(.0))]
	ValidationFailed(Vec<Violation>),
	#[error("Order not found: {0}")]
	NotFound(String),
	/// A status string outside the status set.
	#[error("Invalid status: {0}")]
	InvalidStatus(String),
	#[error("Invalid status transition from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	/// The repository or catalog failed.
	#[error("Dependency unavailable: {0}")]
	DependencyUnavailable(String),
	#[error("No unique order code found after {0} attempts")]
	CodeSpaceExhausted(u32),
	/// Stored orders could not be folded into an aggregate.
	#[error("Aggregation failed: {0}")]
	Aggregation(#[from] AggregateError),
}

impl From<StorageError> for OrderError {
	fn from(err: StorageError) -> Self {
		OrderError::DependencyUnavailable(err.to_string())
	}
}

impl From<UnknownStatus> for OrderError {
	fn from(err: UnknownStatus) -> Self {
		OrderError::InvalidStatus(err.0)
	}
}
