use chrono::NaiveDate;
use serde::Serialize;

/// One persisted (day, staff member) revenue rollup with its orders eagerly loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub income: i64,
    pub items_sold: i64,
    pub staff_name: Option<String>,
    pub orders: Vec<OrderSummary>,
}

/// A completed order attached to a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: i64,
    /// Empty unless line items were requested from the store.
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub menu_name: String,
    pub quantity: i32,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SalesReportRow {
    pub id: i64,
    pub date: NaiveDate,
    pub income: i64,
    pub total_items_sold: i64,
    pub staff_name: Option<String>,
}

impl From<SalesReportRow> for SalesReportRecord {
    fn from(row: SalesReportRow) -> Self {
        SalesReportRecord {
            id: row.id,
            date: row.date,
            income: row.income,
            items_sold: row.total_items_sold,
            staff_name: row.staff_name,
            orders: Vec::new(),
        }
    }
}
