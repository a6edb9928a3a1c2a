//! Courier endpoints.
//!
//! Status changes made here go through the courier transition table, unlike
//! the staff status endpoint in [`orders`](super::orders).

use crate::apis::{api_error, json_body, parse_status};
use crate::server::AppState;
use axum::{
	extract::{rejection::JsonRejection, Path, Query, State},
	response::Json,
};
use chrono::Utc;
use orderdesk_types::{
	APIError, BulkAdvanceReport, CourierStats, DeliveryTimeline, Order, OrderStatus,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CourierOrdersQuery {
	pub status: Option<String>,
	pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CourierStatusRequest {
	pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
	pub order_ids: Vec<String>,
	pub status: String,
}

fn required_status(raw: &str) -> Result<OrderStatus, APIError> {
	parse_status(Some(raw))?.ok_or_else(|| APIError::BadRequest {
		error_type: "INVALID_STATUS".to_string(),
		message: "status is required".to_string(),
		details: None,
	})
}

pub async fn list(
	State(state): State<AppState>,
	Query(query): Query<CourierOrdersQuery>,
) -> Result<Json<Vec<Order>>, APIError> {
	let status = parse_status(query.status.as_deref())?;
	let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
	state
		.desk
		.courier()
		.get_courier_orders(status, search)
		.await
		.map(Json)
		.map_err(api_error)
}

pub async fn advance(
	Path(id): Path<String>,
	State(state): State<AppState>,
	body: Result<Json<CourierStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, APIError> {
	let request = json_body(body)?;
	let status = required_status(&request.status)?;
	state
		.desk
		.courier()
		.advance(&id, status)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles POST /api/courier/orders/bulk-status.
///
/// Always answers 200 once the target status parses; per-order outcomes are
/// in the report.
pub async fn bulk_advance(
	State(state): State<AppState>,
	body: Result<Json<BulkStatusRequest>, JsonRejection>,
) -> Result<Json<BulkAdvanceReport>, APIError> {
	let request = json_body(body)?;
	let status = required_status(&request.status)?;
	if request.order_ids.is_empty() {
		return Err(APIError::BadRequest {
			error_type: "VALIDATION_FAILED".to_string(),
			message: "orderIds must not be empty".to_string(),
			details: None,
		});
	}
	Ok(Json(
		state
			.desk
			.courier()
			.bulk_advance(&request.order_ids, status)
			.await,
	))
}

pub async fn timeline(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<DeliveryTimeline>, APIError> {
	state
		.desk
		.courier()
		.timeline(&id)
		.await
		.map(Json)
		.map_err(api_error)
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<CourierStats>, APIError> {
	state
		.desk
		.courier()
		.courier_stats(Utc::now())
		.await
		.map(Json)
		.map_err(api_error)
}
