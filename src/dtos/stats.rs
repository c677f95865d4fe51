use serde::Serialize;

use crate::reports::dashboard::DailySales;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_sales: i64,
    pub sales_change_percentage: f64,
    pub total_orders: i64,
    pub orders_change_percentage: f64,
    pub completed_orders: i64,
    pub completed_orders_change_percentage: f64,
    pub processing_orders: i64,
}

#[derive(Serialize)]
pub struct WeeklySalesResponse {
    pub days: Vec<DailySales>,
    pub total: i64,
}
