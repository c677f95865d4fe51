pub mod menu;
pub mod order;
pub mod report;
pub mod stats;
pub mod user;
