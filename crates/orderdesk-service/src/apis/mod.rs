//! HTTP handlers for the order desk API.

pub mod analytics;
pub mod courier;
pub mod orders;

use axum::{extract::rejection::JsonRejection, response::Json};
use orderdesk_core::{validation::describe, OrderError};
use orderdesk_types::{APIError, OrderStatus};

/// Maps an order desk error onto the HTTP error surface.
///
/// Collaborator failures are logged in full but reported with a generic
/// message.
pub fn api_error(err: OrderError) -> APIError {
	match err {
		OrderError::ValidationFailed(violations) => APIError::BadRequest {
			error_type: "VALIDATION_FAILED".to_string(),
			message: describe(&violations),
			details: serde_json::to_value(&violations).ok(),
		},
		OrderError::InvalidStatus(status) => APIError::BadRequest {
			error_type: "INVALID_STATUS".to_string(),
			message: format!("Unknown order status: {}", status),
			details: None,
		},
		OrderError::NotFound(id) => APIError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message: format!("Order not found: {}", id),
		},
		err @ OrderError::InvalidTransition { .. } => APIError::Conflict {
			error_type: "INVALID_TRANSITION".to_string(),
			message: err.to_string(),
		},
		err @ (OrderError::DependencyUnavailable(_) | OrderError::CodeSpaceExhausted(_)) => {
			tracing::error!(error = %err, "Order desk dependency failure");
			APIError::ServiceUnavailable {
				error_type: "SERVICE_UNAVAILABLE".to_string(),
				message: "The order service is temporarily unavailable".to_string(),
			}
		},
		err @ OrderError::Aggregation(_) => {
			tracing::error!(error = %err, "Order aggregation failed");
			APIError::InternalServerError {
				error_type: "AGGREGATION_FAILED".to_string(),
				message: "Order figures could not be computed".to_string(),
			}
		},
	}
}

/// Unwraps a JSON request body. A body that is not JSON or does not fit the
/// expected shape becomes a 400 error body.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, APIError> {
	body.map(|Json(value)| value).map_err(|rejection| {
		tracing::debug!(error = %rejection.body_text(), "Rejected request body");
		APIError::BadRequest {
			error_type: "INVALID_BODY".to_string(),
			message: rejection.body_text(),
			details: None,
		}
	})
}

/// Parses an optional status query or body value.
pub fn parse_status(raw: Option<&str>) -> Result<Option<OrderStatus>, APIError> {
	raw.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(|s| s.parse::<OrderStatus>())
		.transpose()
		.map_err(|e| api_error(e.into()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::StatusCode;
	use orderdesk_core::Violation;
	use orderdesk_types::AggregateError;

	#[test]
	fn test_error_status_mapping() {
		let cases = [
			(
				OrderError::ValidationFailed(vec![Violation {
					field: "quantity",
					message: "quantity must be at least 1".into(),
				}]),
				StatusCode::BAD_REQUEST,
			),
			(OrderError::InvalidStatus("lost".into()), StatusCode::BAD_REQUEST),
			(OrderError::NotFound("x".into()), StatusCode::NOT_FOUND),
			(
				OrderError::InvalidTransition {
					from: OrderStatus::Delivered,
					to: OrderStatus::InTransit,
				},
				StatusCode::CONFLICT,
			),
			(
				OrderError::DependencyUnavailable("disk full".into()),
				StatusCode::SERVICE_UNAVAILABLE,
			),
			(OrderError::CodeSpaceExhausted(20), StatusCode::SERVICE_UNAVAILABLE),
		];

		for (err, expected) in cases {
			assert_eq!(api_error(err).status_code(), expected);
		}
	}

	#[test]
	fn test_dependency_detail_is_not_exposed() {
		let body = api_error(OrderError::DependencyUnavailable("disk full".into()))
			.to_error_response();
		assert!(!body.message.contains("disk full"));
	}

	#[test]
	fn test_parse_status() {
		assert_eq!(parse_status(None).unwrap(), None);
		assert_eq!(parse_status(Some("")).unwrap(), None);
		assert_eq!(
			parse_status(Some("in-transit")).unwrap(),
			Some(OrderStatus::InTransit)
		);
		assert!(parse_status(Some("lost")).is_err());
	}
}
