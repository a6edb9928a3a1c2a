//! Order endpoints: creation, lookup, listing, updates and deletion.

use crate::apis::{api_error, json_body, parse_status};
use crate::server::AppState;
use axum::{
	extract::{rejection::JsonRejection, Path, Query, State},
	http::StatusCode,
	response::Json,
};
use chrono::NaiveDate;
use orderdesk_core::ValidationMode;
use orderdesk_types::{APIError, DateRange, Order, OrderDraft, OrderFilter, OrderPatch, Product};
use serde::Deserialize;

/// Query parameters of `GET /orders`.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
	pub status: Option<String>,
	pub search: Option<String>,
	/// First creation day, inclusive.
	pub from: Option<NaiveDate>,
	/// Last creation day, inclusive.
	pub to: Option<NaiveDate>,
	pub limit: Option<usize>,
}

impl ListOrdersQuery {
	fn into_filter(self) -> Result<OrderFilter, APIError> {
		let mut filter = OrderFilter::default();
		if let Some(status) = parse_status(self.status.as_deref())? {
			filter = filter.with_status(status);
		}
		if let Some(search) = self.search {
			filter = filter.with_search(search);
		}
		if self.from.is_some() || self.to.is_some() {
			let range = DateRange::new(
				self.from.unwrap_or(NaiveDate::MIN),
				self.to.unwrap_or(NaiveDate::MAX),
			);
			if range.start > range.end {
				return Err(APIError::BadRequest {
					error_type: "INVALID_DATE_RANGE".to_string(),
					message: format!("from ({}) is after to ({})", range.start, range.end),
					details: None,
				});
			}
			filter = filter.with_date_range(range);
		}
		if let Some(limit) = self.limit {
			filter = filter.with_limit(limit);
		}
		Ok(filter)
	}
}

/// Body of `PUT /orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
	pub status: String,
}

/// Handles POST /api/orders: customer submissions, quantity capped.
pub async fn create_public(
	State(state): State<AppState>,
	body: Result<Json<OrderDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	create(state, json_body(body)?, ValidationMode::Public).await
}

/// Handles POST /api/admin/orders: staff entry, no quantity cap.
pub async fn create_staff(
	State(state): State<AppState>,
	body: Result<Json<OrderDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	create(state, json_body(body)?, ValidationMode::Staff).await
}

async fn create(
	state: AppState,
	draft: OrderDraft,
	mode: ValidationMode,
) -> Result<(StatusCode, Json<Order>), APIError> {
	let order = state
		.desk
		.engine()
		.create_order(draft, mode)
		.await
		.map_err(|e| {
			tracing::warn!(error = %e, "Order creation failed");
			api_error(e)
		})?;
	Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(
	State(state): State<AppState>,
	Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, APIError> {
	let filter = query.into_filter()?;
	let orders = state
		.desk
		.engine()
		.list_orders(filter)
		.await
		.map_err(api_error)?;
	Ok(Json(orders))
}

pub async fn get_by_id(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, APIError> {
	state
		.desk
		.engine()
		.get_order(&id)
		.await
		.map(Json)
		.map_err(api_error)
}

pub async fn get_by_code(
	Path(code): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, APIError> {
	state
		.desk
		.engine()
		.get_order_by_code(&code)
		.await
		.map(Json)
		.map_err(api_error)
}

pub async fn update(
	Path(id): Path<String>,
	State(state): State<AppState>,
	body: Result<Json<OrderPatch>, JsonRejection>,
) -> Result<Json<Order>, APIError> {
	let patch = json_body(body)?;
	state
		.desk
		.engine()
		.update_order(&id, patch)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles PUT /api/orders/{id}/status: any status, no transition guard.
pub async fn set_status(
	Path(id): Path<String>,
	State(state): State<AppState>,
	body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<Order>, APIError> {
	let request = json_body(body)?;
	state
		.desk
		.state()
		.set_status_str(&id, &request.status)
		.await
		.map(Json)
		.map_err(api_error)
}

pub async fn delete(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<StatusCode, APIError> {
	state
		.desk
		.engine()
		.delete_order(&id)
		.await
		.map_err(api_error)?;
	Ok(StatusCode::NO_CONTENT)
}

/// Handles GET /api/products.
pub async fn products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, APIError> {
	state
		.desk
		.catalog()
		.list()
		.await
		.map(Json)
		.map_err(|e| api_error(e.into()))
}
