use axum::{extract::State, Json};
use chrono::{Days, Local, NaiveDate};
use sqlx::PgPool;
use crate::state::AppState;
use crate::error::AppError;
use crate::dtos::stats::{DashboardStats, WeeklySalesResponse};
use crate::models::order::OrderStatus;
use crate::reports::PgReportStore;
use crate::reports::dashboard::{fetch_weekly_sales, income_on, percentage_change};

pub async fn get_stats(
    State(AppState { db_pool }): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let today = Local::now().date_naive();
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    let store = PgReportStore::new(db_pool.clone());

    let total_sales = sqlx::query_scalar::<_, i64>(
        r#"SELECT COALESCE(SUM(income), 0)::BIGINT FROM sales_reports"#,
    )
    .fetch_one(&db_pool)
    .await?;

    let total_orders = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM orders WHERE sales_report_id IS NOT NULL"#,
    )
    .fetch_one(&db_pool)
    .await?;

    let processing_orders = count_orders(&db_pool, Some(OrderStatus::Processing), None).await?;
    let completed_orders = count_orders(&db_pool, Some(OrderStatus::Completed), None).await?;

    let today_income = income_on(&store, today).await?;
    let yesterday_income = income_on(&store, yesterday).await?;

    let today_orders = count_orders(&db_pool, None, Some(today)).await?;
    let yesterday_orders = count_orders(&db_pool, None, Some(yesterday)).await?;

    let today_completed = count_orders(&db_pool, Some(OrderStatus::Completed), Some(today)).await?;
    let yesterday_completed = count_orders(&db_pool, Some(OrderStatus::Completed), Some(yesterday)).await?;

    Ok(Json(DashboardStats {
        total_sales,
        sales_change_percentage: percentage_change(today_income, yesterday_income),
        total_orders,
        orders_change_percentage: percentage_change(today_orders, yesterday_orders),
        completed_orders,
        completed_orders_change_percentage: percentage_change(today_completed, yesterday_completed),
        processing_orders,
    }))
}

pub async fn get_weekly_sales(
    State(AppState { db_pool }): State<AppState>,
) -> Result<Json<WeeklySalesResponse>, AppError> {
    let store = PgReportStore::new(db_pool);
    let days = fetch_weekly_sales(&store, Local::now().date_naive()).await?;
    let total = days.iter().map(|d| d.sales).sum();

    Ok(Json(WeeklySalesResponse { days, total }))
}

// Orders created on `day` (any day when None), optionally with a given status
async fn count_orders(
    db_pool: &PgPool,
    status: Option<OrderStatus>,
    day: Option<NaiveDate>,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM orders
        WHERE ($1::order_status IS NULL OR status = $1)
        AND ($2::DATE IS NULL OR created_at::DATE = $2)"#,
    )
    .bind(status)
    .bind(day)
    .fetch_one(db_pool)
    .await?;

    Ok(count)
}
