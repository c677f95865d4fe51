use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use crate::models::sales_report::SalesReportRecord;
use crate::reports::{AggregatedPeriod, DateRange, ReportFilter, SortDirection, SortField};
use crate::reports::filter::parse_date;

// Request DTOs

/// Query string of `GET /reports`. Everything is optional and lenient.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_by: Option<String>,
    pub sort_report: Option<String>,
    pub report_type: Option<String>,
}

impl ReportQuery {
    pub fn range(&self) -> DateRange {
        DateRange::new(
            parse_date(self.start_date.as_deref()),
            parse_date(self.end_date.as_deref()),
        )
    }

    pub fn filter(&self) -> ReportFilter {
        ReportFilter::with_range(self.range()).sorted_by(
            SortField::parse(self.sort_by.as_deref()),
            SortDirection::parse(self.sort_report.as_deref()),
        )
    }

    pub fn report_type(&self) -> ReportType {
        ReportType::parse(self.report_type.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    All,
    Daily,
    Monthly,
    Yearly,
}

impl ReportType {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).unwrap_or_default() {
            "daily" => ReportType::Daily,
            "monthly" => ReportType::Monthly,
            "yearly" => ReportType::Yearly,
            _ => ReportType::All,
        }
    }
}

// Response DTOs

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListItem {
    pub id: i64,
    pub date: NaiveDate,
    pub income: i64,
    pub total_items_sold: i64,
    pub total_transactions: usize,
    pub staff_name: Option<String>,
}

impl From<SalesReportRecord> for ReportListItem {
    fn from(r: SalesReportRecord) -> Self {
        ReportListItem {
            id: r.id,
            date: r.date,
            income: r.income,
            total_items_sold: r.items_sold,
            total_transactions: r.orders.len(),
            staff_name: r.staff_name,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ReportRows {
    Records(Vec<ReportListItem>),
    Periods(Vec<AggregatedPeriod>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub report_type: ReportType,
    pub reports: ReportRows,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_degrades_to_defaults() {
        let q = ReportQuery {
            start_date: Some("garbage".into()),
            end_date: Some("2024-05-01".into()),
            sort_by: Some("nonsense".into()),
            sort_report: None,
            report_type: Some("weekly".into()),
        };
        let filter = q.filter();
        assert_eq!(filter.range.start, None);
        assert_eq!(filter.range.end, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(filter.sort_field, SortField::Date);
        assert_eq!(filter.sort_direction, SortDirection::Desc);
        assert_eq!(q.report_type(), ReportType::All);
    }

    #[test]
    fn query_deserializes_camel_case() {
        let q: ReportQuery = serde_json::from_value(serde_json::json!({
            "startDate": "2024-01-01",
            "sortBy": "income",
            "sortReport": "asc",
            "reportType": "monthly"
        }))
        .unwrap();
        assert_eq!(q.report_type(), ReportType::Monthly);
        assert_eq!(q.filter().sort_field, SortField::Income);
        assert_eq!(q.filter().sort_direction, SortDirection::Asc);
    }
}
