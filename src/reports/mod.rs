//! Sales report rollups.
//!
//! Records come from a [`ReportStore`]; every operation here is a pure fold
//! over what the store returns, with "now" passed in by the caller.

pub mod aggregate;
pub mod dashboard;
pub mod filter;
pub mod period;
pub mod store;

pub use aggregate::{
    aggregate_by_day, aggregate_by_month, aggregate_by_year, compute_totals, list_reports,
    AggregatedPeriod, ReportTotals,
};
pub use filter::{DateRange, PeriodHint, ReportFilter, SortDirection, SortField};
pub use store::{PgReportStore, ReportStore};
