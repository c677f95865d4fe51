use serde::{Deserialize, Serialize};
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Completed and cancelled orders are final.
    pub fn is_final(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PROCESSING" => Ok(OrderStatus::Processing),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub code: String,
    pub customer_name: String,
    pub note: Option<String>,
    pub total_price: i64,
    pub status: OrderStatus,
    pub sales_report_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub menu_id: i64,
    pub menu_name: String,
    pub quantity: i32,
    pub price: i64,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("completed".parse::<OrderStatus>(), Ok(OrderStatus::Completed));
        assert_eq!("PROCESSING".parse::<OrderStatus>(), Ok(OrderStatus::Processing));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn only_processing_is_mutable() {
        assert!(!OrderStatus::Processing.is_final());
        assert!(OrderStatus::Completed.is_final());
        assert!(OrderStatus::Cancelled.is_final());
    }
}
