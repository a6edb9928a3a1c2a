//! HTTP server for the order desk API.
//!
//! Routes are nested under `/api`; the shared state is the wired
//! [`OrderDesk`].

use crate::apis::{analytics, courier, orders};
use axum::{
	extract::DefaultBodyLimit,
	http::HeaderValue,
	response::Json,
	routing::{get, post, put},
	Router,
};
use orderdesk_config::ApiConfig;
use orderdesk_core::OrderDesk;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{AllowOrigin, Any, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub desk: Arc<OrderDesk>,
}

/// Builds the API router with its middleware stack.
pub fn router(desk: Arc<OrderDesk>, api_config: &ApiConfig) -> Router {
	let api = Router::new()
		.route("/health", get(health))
		.route("/products", get(orders::products))
		.route("/orders", post(orders::create_public).get(orders::list))
		.route("/admin/orders", post(orders::create_staff))
		.route(
			"/orders/{id}",
			get(orders::get_by_id)
				.put(orders::update)
				.delete(orders::delete),
		)
		.route("/orders/{id}/status", put(orders::set_status))
		.route("/orders/code/{code}", get(orders::get_by_code))
		.route("/dashboard/stats", get(analytics::dashboard))
		.route("/analytics/daily", get(analytics::daily))
		.route("/analytics/monthly", get(analytics::monthly))
		.route("/analytics/top-products", get(analytics::top_products))
		.route("/analytics/customers", get(analytics::customers))
		.route("/courier/orders", get(courier::list))
		.route("/courier/orders/bulk-status", post(courier::bulk_advance))
		.route("/courier/orders/{id}/status", put(courier::advance))
		.route("/courier/orders/{id}/timeline", get(courier::timeline))
		.route("/courier/stats", get(courier::stats));

	Router::new()
		.nest("/api", api)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(api_config))
				.layer(TimeoutLayer::new(Duration::from_secs(
					api_config.timeout_seconds,
				)))
				.layer(DefaultBodyLimit::max(api_config.max_request_size)),
		)
		.with_state(AppState { desk })
}

fn cors_layer(api_config: &ApiConfig) -> CorsLayer {
	let Some(cors) = &api_config.cors else {
		return CorsLayer::permissive();
	};

	let origins: Vec<HeaderValue> = cors
		.allowed_origins
		.iter()
		.filter_map(|origin| match origin.parse::<HeaderValue>() {
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
				None
			},
		})
		.collect();

	CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_methods(Any)
		.allow_headers(Any)
}

async fn health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	desk: Arc<OrderDesk>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(desk, &api_config);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order desk API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
