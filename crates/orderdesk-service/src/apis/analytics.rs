//! Dashboard and analytics endpoints.

use crate::apis::api_error;
use crate::server::AppState;
use axum::{
	extract::{Query, State},
	response::Json,
};
use chrono::Utc;
use orderdesk_types::{
	APIError, CustomerAnalytics, DailyBucket, DashboardStats, MonthlyBucket, ProductTotals,
};
use serde::Deserialize;

/// Optional `limit` query parameter of the ranking endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
	pub limit: Option<usize>,
}

/// Handles GET /api/dashboard/stats.
///
/// Never fails: a storage outage yields a zeroed summary.
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardStats> {
	Json(
		state
			.desk
			.analytics()
			.dashboard_stats_or_zeroed(Utc::now())
			.await,
	)
}

pub async fn daily(State(state): State<AppState>) -> Result<Json<Vec<DailyBucket>>, APIError> {
	state
		.desk
		.analytics()
		.daily_series(Utc::now())
		.await
		.map(Json)
		.map_err(api_error)
}

pub async fn monthly(State(state): State<AppState>) -> Result<Json<Vec<MonthlyBucket>>, APIError> {
	state
		.desk
		.analytics()
		.monthly_series(Utc::now())
		.await
		.map(Json)
		.map_err(api_error)
}

pub async fn top_products(
	State(state): State<AppState>,
	Query(query): Query<RankingQuery>,
) -> Result<Json<Vec<ProductTotals>>, APIError> {
	state
		.desk
		.analytics()
		.top_products(query.limit)
		.await
		.map(Json)
		.map_err(api_error)
}

pub async fn customers(
	State(state): State<AppState>,
	Query(query): Query<RankingQuery>,
) -> Result<Json<CustomerAnalytics>, APIError> {
	state
		.desk
		.analytics()
		.customer_analytics(Utc::now(), query.limit)
		.await
		.map(Json)
		.map_err(api_error)
}
