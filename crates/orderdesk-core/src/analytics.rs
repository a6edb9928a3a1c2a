//! Aggregation engine.
//!
//! Derives dashboard counters, time series and rankings by folding the
//! [`aggregate`](orderdesk_types::aggregate) helpers over the current order set. Nothing is cached.
//! Calendar days and months are UTC.

use crate::OrderError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use orderdesk_storage::OrderRepository;
use orderdesk_types::{
	aggregate, CustomerAnalytics, CustomerTotals, DailyBucket, DashboardStats, DeliveryTimeline,
	MonthlyBucket, NewCustomersBucket, Order, OrderFilter, OrderStatus, ProductTotals,
	TimelineCheckpoint, TimelineStage, MAX_LIST_LIMIT,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default size of ranked lists.
pub const DEFAULT_RANKING_LIMIT: usize = 5;
const DAILY_SERIES_DAYS: u32 = 7;
const MONTHLY_SERIES_MONTHS: u32 = 6;
const NEW_CUSTOMER_DAYS: u32 = 30;

/// Clamps a requested ranking size to `[1, MAX_LIST_LIMIT]`.
pub fn ranking_limit(requested: Option<usize>) -> usize {
	requested
		.unwrap_or(DEFAULT_RANKING_LIMIT)
		.clamp(1, MAX_LIST_LIMIT)
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
	Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN))
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// The month `back` months before the month of `day`, as (year, month).
fn months_back(day: NaiveDate, back: u32) -> (i32, u32) {
	let index = day.year() * 12 + day.month0() as i32 - back as i32;
	(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
	if month == 12 {
		(year + 1, 1)
	} else {
		(year, month + 1)
	}
}

/// Dashboard and analytics queries over an order repository.
///
/// Each query reads one snapshot of the order set and folds it, so every
/// figure in a response comes from the same state.
pub struct AnalyticsService {
	repository: Arc<dyn OrderRepository>,
}

impl AnalyticsService {
	pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
		Self { repository }
	}

	async fn snapshot(&self) -> Result<Vec<Order>, OrderError> {
		Ok(self.repository.list(&OrderFilter::default()).await?)
	}

	/// Status counters, today's and this month's order counts, and total
	/// revenue, as of `now`.
	pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> Result<DashboardStats, OrderError> {
		let orders = self.snapshot().await?;
		let counts = aggregate::count_by_status(&orders);
		let count = |status: OrderStatus| counts.get(&status).copied().unwrap_or(0);

		let today = now.date_naive();
		let today_start = start_of_day(today);
		let today_totals =
			aggregate::sum_in_range(&orders, today_start, today_start + Duration::days(1))?;

		let (year, month) = (today.year(), today.month());
		let (next_year, next) = next_month(year, month);
		let month_totals = aggregate::sum_in_range(
			&orders,
			start_of_day(first_of_month(year, month)),
			start_of_day(first_of_month(next_year, next)),
		)?;

		let all_time =
			aggregate::sum_in_range(&orders, DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)?;

		Ok(DashboardStats {
			total_orders: orders.len() as u64,
			pending: count(OrderStatus::Placed),
			received: count(OrderStatus::Received),
			issued: count(OrderStatus::Issued),
			courier: OrderStatus::COURIER.iter().map(|s| count(*s)).sum(),
			cancelled: count(OrderStatus::Cancelled),
			today: today_totals.order_count,
			this_month: month_totals.order_count,
			total_revenue: all_time.revenue,
		})
	}

	/// Like [`dashboard_stats`](Self::dashboard_stats), but any failure yields
	/// zeroed counters instead of an error.
	pub async fn dashboard_stats_or_zeroed(&self, now: DateTime<Utc>) -> DashboardStats {
		match self.dashboard_stats(now).await {
			Ok(stats) => stats,
			Err(e) => {
				tracing::error!(error = %e, "Failed to compute dashboard stats, returning zeros");
				DashboardStats::default()
			},
		}
	}

	/// One bucket per day for the trailing week including today, oldest
	/// first. Days without orders are present with zeros.
	pub async fn daily_series(&self, now: DateTime<Utc>) -> Result<Vec<DailyBucket>, OrderError> {
		let orders = self.snapshot().await?;
		let today = now.date_naive();
		let mut series = Vec::with_capacity(DAILY_SERIES_DAYS as usize);
		for back in (0..DAILY_SERIES_DAYS).rev() {
			let date = today - Duration::days(i64::from(back));
			let start = start_of_day(date);
			let totals = aggregate::sum_in_range(&orders, start, start + Duration::days(1))?;
			series.push(DailyBucket {
				date,
				order_count: totals.order_count,
				revenue: totals.revenue,
			});
		}
		Ok(series)
	}

	/// One bucket per calendar month for the trailing six months including
	/// the current one, most recent first.
	pub async fn monthly_series(&self, now: DateTime<Utc>) -> Result<Vec<MonthlyBucket>, OrderError> {
		let orders = self.snapshot().await?;
		let today = now.date_naive();
		let mut series = Vec::with_capacity(MONTHLY_SERIES_MONTHS as usize);
		for back in 0..MONTHLY_SERIES_MONTHS {
			let (year, month) = months_back(today, back);
			let (next_year, next) = next_month(year, month);
			let totals = aggregate::sum_in_range(
				&orders,
				start_of_day(first_of_month(year, month)),
				start_of_day(first_of_month(next_year, next)),
			)?;
			let average_order_value = if totals.order_count == 0 {
				Decimal::ZERO
			} else {
				(totals.revenue / Decimal::from(totals.order_count)).round_dp(2)
			};
			series.push(MonthlyBucket {
				month: format!("{:04}-{:02}", year, month),
				order_count: totals.order_count,
				revenue: totals.revenue,
				average_order_value,
			});
		}
		Ok(series)
	}

	/// Products ranked by revenue. Ties go to the product with more orders,
	/// then to the lower product reference.
	pub async fn top_products(&self, limit: Option<usize>) -> Result<Vec<ProductTotals>, OrderError> {
		let orders = self.snapshot().await?;
		let mut products = aggregate::group_by_product(&orders)?;
		products.sort_by(|a, b| {
			b.revenue
				.cmp(&a.revenue)
				.then_with(|| b.order_count.cmp(&a.order_count))
				.then_with(|| a.product_ref.cmp(&b.product_ref))
		});
		products.truncate(ranking_limit(limit));
		Ok(products)
	}

	/// Customers ranked by total spend, plus the number of first-time
	/// customers per day over the trailing 30 days.
	pub async fn customer_analytics(
		&self,
		now: DateTime<Utc>,
		limit: Option<usize>,
	) -> Result<CustomerAnalytics, OrderError> {
		let orders = self.snapshot().await?;
		let mut customers = aggregate::group_by_customer(&orders)?;

		let today = now.date_naive();
		let window_start = today - Duration::days(i64::from(NEW_CUSTOMER_DAYS - 1));
		let mut per_day: BTreeMap<NaiveDate, u64> = (0..NEW_CUSTOMER_DAYS)
			.map(|offset| (window_start + Duration::days(i64::from(offset)), 0))
			.collect();
		for customer in &customers {
			if let Some(count) = per_day.get_mut(&customer.first_order_at.date_naive()) {
				*count += 1;
			}
		}

		rank_customers(&mut customers);
		customers.truncate(ranking_limit(limit));

		Ok(CustomerAnalytics {
			top_customers: customers,
			new_customers: per_day
				.into_iter()
				.map(|(date, new_customers)| NewCustomersBucket {
					date,
					new_customers,
				})
				.collect(),
		})
	}
}

fn rank_customers(customers: &mut [CustomerTotals]) {
	customers.sort_by(|a, b| {
		b.total_spent
			.cmp(&a.total_spent)
			.then_with(|| b.order_count.cmp(&a.order_count))
			.then_with(|| a.customer_name.cmp(&b.customer_name))
	});
}

/// Reconstructs the delivery checkpoints of an order from its current
/// status.
///
/// There is no transition log, so every completed checkpoint after `placed`
/// carries the order's `updated_at`. A cancelled order has only reached
/// `placed`.
pub fn delivery_timeline(order: &Order) -> DeliveryTimeline {
	let reached = order.status.rank().unwrap_or(0);
	let checkpoints = TimelineStage::ALL
		.iter()
		.map(|stage| {
			let completed = reached >= stage.rank();
			let timestamp = match (completed, stage) {
				(false, _) => None,
				(true, TimelineStage::Placed) => Some(order.created_at),
				(true, _) => Some(order.updated_at),
			};
			TimelineCheckpoint {
				stage: *stage,
				label: stage.label().to_string(),
				completed,
				timestamp,
			}
		})
		.collect();

	DeliveryTimeline {
		order_id: order.id.clone(),
		order_code: order.order_code.clone(),
		status: order.status,
		checkpoints,
	}
}

/// Mean days from creation to last update over delivered orders, rounded to
/// one decimal. Zero when nothing has been delivered.
pub fn average_delivery_days(orders: &[Order]) -> f64 {
	let durations: Vec<f64> = orders
		.iter()
		.filter(|o| o.status == OrderStatus::Delivered)
		.map(|o| (o.updated_at - o.created_at).num_seconds() as f64 / 86_400.0)
		.collect();
	if durations.is_empty() {
		return 0.0;
	}
	let mean = durations.iter().sum::<f64>() / durations.len() as f64;
	(mean * 10.0).round() / 10.0
}
