use std::collections::HashMap;

use axum::{extract::{Path, Query, State}, Json, Extension};
use axum::http::StatusCode;
use rand::Rng;
use sqlx::{PgPool, Postgres, Transaction};
use crate::state::AppState;
use crate::error::AppError;
use crate::dtos::order::{
    CreateOrderRequest, OrderItemRequest, UpdateOrderStatusRequest, OrderQuery, OrderResponse,
    OrderItemResponse, OrderListItem, OrderTrackingResponse,
};
use crate::middleware::auth::AuthContext;
use crate::models::order::{Order, OrderItemRow, OrderStatus};
use crate::reports::filter::{parse_date, SortDirection};

const CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const CODE_LENGTH: usize = 4;

const ORDER_COLUMNS: &str =
    "id, code, customer_name, note, total_price, status, sales_report_id, created_at";

pub fn generate_code<R: Rng>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[derive(sqlx::FromRow)]
struct MenuPriceRow {
    id: i64,
    price: i64,
}

/// Σ price × quantity over the requested items, priced from the menu.
fn order_total(items: &[OrderItemRequest], prices: &HashMap<i64, i64>) -> Result<i64, AppError> {
    items.iter().try_fold(0i64, |total, item| {
        let price = prices
            .get(&item.menu_id)
            .ok_or_else(|| AppError::not_found(format!("Menu {} not found", item.menu_id)))?;
        price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| AppError::validation("Order total is too large"))
    })
}

pub async fn create_order(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let customer_name = req.customer_name.trim();
    if customer_name.is_empty() {
        return Err(AppError::validation("Customer name is required"));
    }
    if req.items.is_empty() {
        return Err(AppError::validation("Order must contain at least one item"));
    }
    if req.items.iter().any(|i| i.quantity <= 0) {
        return Err(AppError::validation("Quantity must be greater than 0"));
    }

    let mut tx = db_pool.begin().await?;

    let menu_ids: Vec<i64> = req.items.iter().map(|i| i.menu_id).collect();
    let prices: HashMap<i64, i64> = sqlx::query_as::<_, MenuPriceRow>(
        r#"SELECT id, price FROM menus WHERE id = ANY($1)"#,
    )
    .bind(&menu_ids)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|m| (m.id, m.price))
    .collect();

    let total_price = order_total(&req.items, &prices)?;

    let code = unique_code(&mut tx).await?;

    let order = sqlx::query_as::<_, Order>(&format!(
        "INSERT INTO orders (code, customer_name, note, total_price)
        VALUES ($1, $2, $3, $4)
        RETURNING {ORDER_COLUMNS}"
    ))
    .bind(&code)
    .bind(customer_name)
    .bind(req.note.as_deref().map(str::trim).filter(|n| !n.is_empty()))
    .bind(total_price)
    .fetch_one(&mut *tx)
    .await?;

    for item in &req.items {
        sqlx::query(
            r#"INSERT INTO order_items (order_id, menu_id, quantity, price, note)
            VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(order.id)
        .bind(item.menu_id)
        .bind(item.quantity)
        .bind(prices[&item.menu_id])
        .bind(item.note.as_deref())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(order_id = order.id, code = %order.code, staff = %auth.username, total_price, "Order created");

    let items = fetch_order_items(&db_pool, order.id).await?;
    Ok((StatusCode::CREATED, Json(order_response(order, items))))
}

// Only whitelisted columns ever reach the ORDER BY
fn order_by_clause(sort_by: Option<&str>, sort_order: Option<&str>) -> String {
    let column = match sort_by.map(str::trim).unwrap_or_default() {
        "totalPrice" | "total_price" => "total_price",
        "customerName" | "customer_name" => "customer_name",
        "code" => "code",
        "status" => "status",
        _ => "created_at",
    };
    let direction = match SortDirection::parse(sort_order) {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    format!("{column} {direction}, id {direction}")
}

pub async fn list_orders(
    State(AppState { db_pool }): State<AppState>,
    Query(params): Query<OrderQuery>,
) -> Result<Json<Vec<OrderListItem>>, AppError> {
    let status = match params.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Some(
            s.parse::<OrderStatus>()
                .map_err(|_| AppError::validation(format!("Unknown order status '{s}'")))?,
        ),
        None => None,
    };
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let order_by = order_by_clause(params.sort_by.as_deref(), params.sort_order.as_deref());

    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders
        WHERE ($1::order_status IS NULL OR status = $1)
        AND ($2::TEXT IS NULL OR code ILIKE '%' || $2 || '%' OR customer_name ILIKE '%' || $2 || '%')
        AND ($3::DATE IS NULL OR created_at::DATE >= $3)
        AND ($4::DATE IS NULL OR created_at::DATE <= $4)
        ORDER BY {order_by}"
    ))
    .bind(status)
    .bind(search)
    .bind(parse_date(params.start_date.as_deref()))
    .bind(parse_date(params.end_date.as_deref()))
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(
        orders
            .into_iter()
            .map(|o| OrderListItem {
                id: o.id,
                code: o.code,
                customer_name: o.customer_name,
                total_price: o.total_price,
                status: o.status,
                created_at: o.created_at,
            })
            .collect(),
    ))
}

pub async fn get_order(
    State(AppState { db_pool }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, AppError> {
    fetch_order_by_id(&db_pool, id).await.map(Json)
}

// Public: customers look up their order by the short code
pub async fn track_order(
    State(AppState { db_pool }): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<OrderTrackingResponse>, AppError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE LOWER(code) = LOWER($1)"
    ))
    .bind(code.trim())
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Order not found"))?;

    let items = fetch_order_items(&db_pool, order.id).await?;

    Ok(Json(OrderTrackingResponse {
        code: order.code,
        customer_name: order.customer_name,
        status: order.status,
        total_price: order.total_price,
        created_at: order.created_at,
        items,
    }))
}

/// Moves an order out of `PROCESSING`. Completing it books the order into the
/// acting staff member's sales report for the order's day.
pub async fn update_order_status(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Order not found"))?;

    if order.status.is_final() {
        return Err(AppError::validation(match order.status {
            OrderStatus::Cancelled => "Order already cancelled",
            _ => "Order already completed",
        }));
    }

    sqlx::query(r#"UPDATE orders SET status = $2 WHERE id = $1"#)
        .bind(id)
        .bind(req.status)
        .execute(&mut *tx)
        .await?;

    if req.status == OrderStatus::Completed {
        let report_id = book_into_report(&mut tx, &order, auth.user_id).await?;
        tracing::info!(order_id = id, report_id, staff = %auth.username, "Order completed and booked");
    }

    tx.commit().await?;

    fetch_order_by_id(&db_pool, id).await.map(Json)
}

/// Removes an order. A completed order is first taken back out of the report
/// it was booked into, so the report keeps matching its orders.
pub async fn delete_order(
    State(AppState { db_pool }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let mut tx = db_pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Order not found"))?;

    if let Some(report_id) = order.sales_report_id {
        sqlx::query(
            r#"UPDATE sales_reports
            SET income = GREATEST(income - $2, 0),
                total_items_sold = GREATEST(total_items_sold - (
                    SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM order_items WHERE order_id = $3
                ), 0)
            WHERE id = $1"#,
        )
        .bind(report_id)
        .bind(order.total_price)
        .bind(order.id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(r#"DELETE FROM orders WHERE id = $1"#)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(order_id = id, code = %order.code, staff = %auth.username, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Upserts the (day, staff) report and attaches the order to it
async fn book_into_report(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
    staff_id: i64,
) -> Result<i64, AppError> {
    let total_items = sqlx::query_scalar::<_, i64>(
        r#"SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM order_items WHERE order_id = $1"#,
    )
    .bind(order.id)
    .fetch_one(&mut **tx)
    .await?;

    let report_id = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO sales_reports (date, income, total_items_sold, admin_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (date, admin_id) DO UPDATE
        SET income = sales_reports.income + EXCLUDED.income,
            total_items_sold = sales_reports.total_items_sold + EXCLUDED.total_items_sold
        RETURNING id"#,
    )
    .bind(order.created_at.date())
    .bind(order.total_price)
    .bind(total_items)
    .bind(staff_id)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(r#"UPDATE orders SET sales_report_id = $2 WHERE id = $1"#)
        .bind(order.id)
        .bind(report_id)
        .execute(&mut **tx)
        .await?;

    Ok(report_id)
}

// One retry on collision, then give up
async fn unique_code(tx: &mut Transaction<'_, Postgres>) -> Result<String, AppError> {
    for _ in 0..2 {
        let code = generate_code(&mut rand::thread_rng());
        let taken = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(SELECT 1 FROM orders WHERE code = $1)"#,
        )
        .bind(&code)
        .fetch_one(&mut **tx)
        .await?;

        if !taken {
            return Ok(code);
        }
        tracing::warn!(%code, "Order code collision, retrying");
    }
    Err(AppError::conflict("Failed to generate a unique order code"))
}

async fn fetch_order_items(db_pool: &PgPool, order_id: i64) -> Result<Vec<OrderItemResponse>, AppError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r#"SELECT oi.id, oi.menu_id, m.name AS menu_name, oi.quantity, oi.price, oi.note
        FROM order_items oi
        JOIN menus m ON oi.menu_id = m.id
        WHERE oi.order_id = $1
        ORDER BY oi.id"#,
    )
    .bind(order_id)
    .fetch_all(db_pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|item| OrderItemResponse {
            id: item.id,
            menu_id: item.menu_id,
            menu_name: item.menu_name,
            quantity: item.quantity,
            price: item.price,
            line_total: item.price.saturating_mul(i64::from(item.quantity)),
            note: item.note,
        })
        .collect())
}

// Helper function to fetch full order details
async fn fetch_order_by_id(db_pool: &PgPool, id: i64) -> Result<OrderResponse, AppError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Order not found"))?;

    let items = fetch_order_items(db_pool, id).await?;
    Ok(order_response(order, items))
}

fn order_response(order: Order, items: Vec<OrderItemResponse>) -> OrderResponse {
    OrderResponse {
        id: order.id,
        code: order.code,
        customer_name: order.customer_name,
        note: order.note,
        total_price: order.total_price,
        status: order.status,
        sales_report_id: order.sales_report_id,
        created_at: order.created_at,
        total_items: items.iter().map(|i| i64::from(i.quantity)).sum(),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn codes_are_short_lowercase_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = generate_code(&mut StdRng::seed_from_u64(7));
        let b = generate_code(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    fn item(menu_id: i64, quantity: i32) -> OrderItemRequest {
        OrderItemRequest { menu_id, quantity, note: None }
    }

    #[test]
    fn total_is_priced_from_the_menu() {
        let prices = HashMap::from([(3, 15_000), (4, 5_000)]);
        let total = order_total(&[item(3, 2), item(4, 3)], &prices).unwrap();
        assert_eq!(total, 45_000);

        let err = order_total(&[item(9, 1)], &prices).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn oversized_totals_are_rejected() {
        let prices = HashMap::from([(1, i64::MAX / 2), (2, i64::MAX)]);
        let err = order_total(&[item(2, 2)], &prices).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = order_total(&[item(1, 1), item(1, 1), item(1, 1)], &prices).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn order_listing_sorts_on_known_columns_only() {
        assert_eq!(order_by_clause(None, None), "created_at DESC, id DESC");
        assert_eq!(order_by_clause(Some("totalPrice"), Some("asc")), "total_price ASC, id ASC");
        assert_eq!(order_by_clause(Some("customer_name"), Some("DESC")), "customer_name DESC, id DESC");
        assert_eq!(
            order_by_clause(Some("id; DROP TABLE orders"), Some("asc")),
            "created_at ASC, id ASC"
        );
    }

    #[test]
    fn response_counts_items() {
        let order = Order {
            id: 1,
            code: "ab12".into(),
            customer_name: "Sari".into(),
            note: None,
            total_price: 45_000,
            status: OrderStatus::Processing,
            sales_report_id: None,
            created_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        };
        let items = vec![
            OrderItemResponse {
                id: 1, menu_id: 3, menu_name: "Nasi Goreng".into(), quantity: 2,
                price: 15_000, line_total: 30_000, note: None,
            },
            OrderItemResponse {
                id: 2, menu_id: 4, menu_name: "Es Teh".into(), quantity: 3,
                price: 5_000, line_total: 15_000, note: None,
            },
        ];
        let res = order_response(order, items);
        assert_eq!(res.total_items, 5);
        assert_eq!(res.items.iter().map(|i| i.line_total).sum::<i64>(), res.total_price);
    }
}
