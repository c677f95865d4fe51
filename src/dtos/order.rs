use serde::{Deserialize, Serialize};
use chrono::NaiveDateTime;

use crate::models::order::OrderStatus;

// Request DTOs

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub note: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub menu_id: i64,
    pub quantity: i32,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

// Response DTOs

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i64,
    pub code: String,
    pub customer_name: String,
    pub note: Option<String>,
    pub total_price: i64,
    pub status: OrderStatus,
    pub sales_report_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub items: Vec<OrderItemResponse>,
    pub total_items: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: i64,
    pub menu_id: i64,
    pub menu_name: String,
    pub quantity: i32,
    pub price: i64,
    pub line_total: i64,
    pub note: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListItem {
    pub id: i64,
    pub code: String,
    pub customer_name: String,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: NaiveDateTime,
}

/// What a customer sees when tracking by code.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTrackingResponse {
    pub code: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub total_price: i64,
    pub created_at: NaiveDateTime,
    pub items: Vec<OrderItemResponse>,
}
