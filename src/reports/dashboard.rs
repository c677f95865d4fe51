use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::error::AppError;
use crate::models::sales_report::SalesReportRecord;
use super::filter::DateRange;
use super::ReportStore;

/// Short weekday names indexed from Sunday.
pub const DAY_NAMES: [&str; 7] = ["Min", "Sen", "Sel", "Rab", "Kam", "Jum", "Sab"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySales {
    pub day: String,
    pub date: NaiveDate,
    pub sales: i64,
}

/// Change from `previous` to `current` in percent, one decimal. Zero when
/// there is nothing to compare against.
pub fn percentage_change(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    let pct = (current - previous) as f64 / previous as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

pub fn day_name(date: NaiveDate) -> &'static str {
    DAY_NAMES[date.weekday().num_days_from_sunday() as usize]
}

fn income_on_day(records: &[SalesReportRecord], date: NaiveDate) -> i64 {
    records.iter().filter(|r| r.date == date).map(|r| r.income).sum()
}

/// Seven days ending at `today`, oldest first; days without reports are zero.
pub fn weekly_sales(records: &[SalesReportRecord], today: NaiveDate) -> Vec<DailySales> {
    (0..7u64)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| DailySales {
            day: day_name(date).to_string(),
            date,
            sales: income_on_day(records, date),
        })
        .collect()
}

pub async fn fetch_weekly_sales<S>(store: &S, today: NaiveDate) -> Result<Vec<DailySales>, AppError>
where
    S: ReportStore + ?Sized,
{
    let start = today.checked_sub_days(Days::new(6)).unwrap_or(today);
    let records = store.fetch_reports(DateRange::between(start, today), false).await?;
    Ok(weekly_sales(&records, today))
}

/// Report income for one day summed across staff.
pub async fn income_on<S>(store: &S, date: NaiveDate) -> Result<i64, AppError>
where
    S: ReportStore + ?Sized,
{
    let records = store.fetch_reports(DateRange::between(date, date), false).await?;
    Ok(income_on_day(&records, date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::store::memory::MemoryReportStore;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(id: i64, date: NaiveDate, income: i64) -> SalesReportRecord {
        SalesReportRecord { id, date, income, items_sold: 1, staff_name: None, orders: vec![] }
    }

    #[test]
    fn zero_denominator_yields_zero() {
        assert_eq!(percentage_change(500, 0), 0.0);
        assert_eq!(percentage_change(0, 0), 0.0);
    }

    #[test]
    fn change_is_rounded_to_one_decimal() {
        assert_eq!(percentage_change(150, 100), 50.0);
        assert_eq!(percentage_change(50, 100), -50.0);
        assert_eq!(percentage_change(1, 3), -66.7);
        assert_eq!(percentage_change(0, 200), -100.0);
    }

    #[test]
    fn weekday_names() {
        // 2024-03-10 was a Sunday
        assert_eq!(day_name(d(2024, 3, 10)), "Min");
        assert_eq!(day_name(d(2024, 3, 11)), "Sen");
        assert_eq!(day_name(d(2024, 3, 16)), "Sab");
    }

    #[test]
    fn weekly_series_is_dense_and_oldest_first() {
        let today = d(2024, 3, 16);
        let records = vec![rec(1, d(2024, 3, 10), 100), rec(2, d(2024, 3, 16), 40), rec(3, d(2024, 3, 16), 60)];
        let week = weekly_sales(&records, today);

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, d(2024, 3, 10));
        assert_eq!(week[0].day, "Min");
        assert_eq!(week[0].sales, 100);
        assert_eq!(week[3].sales, 0);
        assert_eq!(week[6].date, today);
        assert_eq!(week[6].sales, 100);
    }

    #[tokio::test]
    async fn income_on_sums_across_staff() {
        let store = MemoryReportStore::new(vec![
            rec(1, d(2024, 3, 16), 40),
            rec(2, d(2024, 3, 16), 60),
            rec(3, d(2024, 3, 15), 7),
        ]);
        assert_eq!(income_on(&store, d(2024, 3, 16)).await.unwrap(), 100);
        assert_eq!(income_on(&store, d(2024, 3, 14)).await.unwrap(), 0);

        let week = fetch_weekly_sales(&store, d(2024, 3, 16)).await.unwrap();
        assert_eq!(week[5].sales, 7);
    }
}
