pub mod menu;
pub mod order;
pub mod sales_report;
pub mod user;
