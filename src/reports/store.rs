use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::sales_report::{OrderLine, OrderSummary, SalesReportRecord, SalesReportRow};
use super::filter::DateRange;

/// Read access to persisted sales reports.
///
/// Implementations return records ordered by date then id, with orders (and,
/// when `include_items` is set, their line items) already attached.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn fetch_reports(
        &self,
        range: DateRange,
        include_items: bool,
    ) -> Result<Vec<SalesReportRecord>, AppError>;

    /// Date of the oldest stored report, `None` when there are none.
    async fn earliest_report_date(&self) -> Result<Option<NaiveDate>, AppError>;
}

pub struct PgReportStore {
    db_pool: PgPool,
}

impl PgReportStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

// Reports, orders and lines are read from one snapshot so order counts agree
// with the report totals even while orders are being completed.
const SNAPSHOT_READ: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

#[derive(sqlx::FromRow)]
struct ReportOrderRow {
    id: i64,
    sales_report_id: i64,
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    order_id: i64,
    menu_name: String,
    quantity: i32,
}

/// Attaches orders to their reports and line items to their orders. Orders
/// keep the order they arrive in; ones without a matching report are dropped.
fn assemble(
    mut records: Vec<SalesReportRecord>,
    order_rows: Vec<ReportOrderRow>,
    line_rows: Vec<OrderLineRow>,
) -> Vec<SalesReportRecord> {
    let mut lines_by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for line in line_rows {
        lines_by_order.entry(line.order_id).or_default().push(OrderLine {
            menu_name: line.menu_name,
            quantity: line.quantity,
        });
    }

    let index: HashMap<i64, usize> =
        records.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
    for order in order_rows {
        if let Some(&i) = index.get(&order.sales_report_id) {
            records[i].orders.push(OrderSummary {
                id: order.id,
                items: lines_by_order.remove(&order.id).unwrap_or_default(),
            });
        }
    }
    records
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn fetch_reports(
        &self,
        range: DateRange,
        include_items: bool,
    ) -> Result<Vec<SalesReportRecord>, AppError> {
        let mut tx = self.db_pool.begin().await?;
        sqlx::query(SNAPSHOT_READ).execute(&mut *tx).await?;

        let rows = sqlx::query_as::<_, SalesReportRow>(
            r#"SELECT sr.id, sr.date, sr.income, sr.total_items_sold, u.username AS staff_name
            FROM sales_reports sr
            LEFT JOIN users u ON sr.admin_id = u.id
            WHERE ($1::DATE IS NULL OR sr.date >= $1)
            AND ($2::DATE IS NULL OR sr.date <= $2)
            ORDER BY sr.date ASC, sr.id ASC"#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&mut *tx)
        .await?;

        let records: Vec<SalesReportRecord> = rows.into_iter().map(Into::into).collect();
        if records.is_empty() {
            tx.commit().await?;
            return Ok(records);
        }

        let report_ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let order_rows = sqlx::query_as::<_, ReportOrderRow>(
            r#"SELECT id, sales_report_id
            FROM orders
            WHERE sales_report_id = ANY($1)
            ORDER BY id ASC"#,
        )
        .bind(&report_ids)
        .fetch_all(&mut *tx)
        .await?;

        let line_rows = if include_items && !order_rows.is_empty() {
            let order_ids: Vec<i64> = order_rows.iter().map(|o| o.id).collect();
            sqlx::query_as::<_, OrderLineRow>(
                r#"SELECT oi.order_id, m.name AS menu_name, oi.quantity
                FROM order_items oi
                JOIN menus m ON oi.menu_id = m.id
                WHERE oi.order_id = ANY($1)
                ORDER BY oi.id ASC"#,
            )
            .bind(&order_ids)
            .fetch_all(&mut *tx)
            .await?
        } else {
            Vec::new()
        };

        tx.commit().await?;

        let records = assemble(records, order_rows, line_rows);
        tracing::debug!(
            start = ?range.start,
            end = ?range.end,
            count = records.len(),
            "Fetched sales reports"
        );
        Ok(records)
    }

    async fn earliest_report_date(&self) -> Result<Option<NaiveDate>, AppError> {
        let earliest = sqlx::query_scalar::<_, Option<NaiveDate>>(
            r#"SELECT MIN(date) FROM sales_reports"#,
        )
        .fetch_one(&self.db_pool)
        .await?;
        Ok(earliest)
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-process store over a fixed set of records.
    pub struct MemoryReportStore {
        records: Vec<SalesReportRecord>,
        queries: AtomicUsize,
    }

    impl MemoryReportStore {
        pub fn new(records: Vec<SalesReportRecord>) -> Self {
            Self { records, queries: AtomicUsize::new(0) }
        }

        pub fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReportStore for MemoryReportStore {
        async fn fetch_reports(
            &self,
            range: DateRange,
            include_items: bool,
        ) -> Result<Vec<SalesReportRecord>, AppError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let mut out: Vec<SalesReportRecord> = self
                .records
                .iter()
                .filter(|r| range.contains(r.date))
                .cloned()
                .collect();
            out.sort_by_key(|r| (r.date, r.id));
            if !include_items {
                for order in out.iter_mut().flat_map(|r| r.orders.iter_mut()) {
                    order.items.clear();
                }
            }
            Ok(out)
        }

        async fn earliest_report_date(&self) -> Result<Option<NaiveDate>, AppError> {
            Ok(self.records.iter().map(|r| r.date).min())
        }
    }

    /// Store whose every query fails, for error propagation checks.
    pub struct FailingReportStore;

    #[async_trait]
    impl ReportStore for FailingReportStore {
        async fn fetch_reports(
            &self,
            _range: DateRange,
            _include_items: bool,
        ) -> Result<Vec<SalesReportRecord>, AppError> {
            Err(AppError::db(sqlx::Error::PoolTimedOut))
        }

        async fn earliest_report_date(&self) -> Result<Option<NaiveDate>, AppError> {
            Err(AppError::db(sqlx::Error::PoolTimedOut))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: i64, day: u32) -> SalesReportRecord {
        SalesReportRecord {
            id,
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            income: 0,
            items_sold: 0,
            staff_name: None,
            orders: Vec::new(),
        }
    }

    fn line(order_id: i64, menu_name: &str, quantity: i32) -> OrderLineRow {
        OrderLineRow { order_id, menu_name: menu_name.to_string(), quantity }
    }

    #[test]
    fn snapshot_is_repeatable_and_read_only() {
        assert!(SNAPSHOT_READ.contains("REPEATABLE READ"));
        assert!(SNAPSHOT_READ.contains("READ ONLY"));
    }

    #[test]
    fn orders_and_lines_land_on_their_reports() {
        let records = assemble(
            vec![report(1, 1), report(2, 2)],
            vec![
                ReportOrderRow { id: 10, sales_report_id: 2 },
                ReportOrderRow { id: 11, sales_report_id: 1 },
                ReportOrderRow { id: 12, sales_report_id: 2 },
                ReportOrderRow { id: 13, sales_report_id: 99 },
            ],
            vec![line(10, "Kopi", 2), line(12, "Es Teh", 1), line(10, "Roti", 1)],
        );

        assert_eq!(records[0].orders.len(), 1);
        assert!(records[0].orders[0].items.is_empty());
        let ids: Vec<i64> = records[1].orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![10, 12]);
        let names: Vec<&str> = records[1].orders[0].items.iter().map(|l| l.menu_name.as_str()).collect();
        assert_eq!(names, vec!["Kopi", "Roti"]);
        assert_eq!(records.iter().map(|r| r.orders.len()).sum::<usize>(), 3);
    }
}
