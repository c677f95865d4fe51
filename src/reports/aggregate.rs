use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::AppError;
use crate::models::sales_report::SalesReportRecord;
use super::filter::{DateRange, PeriodHint, ReportFilter, SortDirection, SortField};
use super::period;
use super::ReportStore;

/// A day, month or year of sales folded from one or more report records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPeriod {
    pub period_key: String,
    pub period_start: NaiveDateTime,
    pub income: i64,
    pub items_sold: i64,
    pub order_count: i64,
    /// Distinct known staff names, sorted.
    pub staff_names: Vec<String>,
    pub staff_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_menus: Vec<MenuSales>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSales {
    pub menu_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub total_income: i64,
    pub total_items_sold: i64,
    pub total_reports: i64,
    pub total_orders: i64,
}

#[derive(Default)]
struct PeriodAccumulator {
    income: i64,
    items_sold: i64,
    order_count: i64,
    staff: BTreeSet<String>,
    menus: HashMap<String, i64>,
}

impl PeriodAccumulator {
    fn add(&mut self, record: &SalesReportRecord) {
        self.income += record.income;
        self.items_sold += record.items_sold;
        self.order_count += record.orders.len() as i64;

        if let Some(name) = record.staff_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            self.staff.insert(name.to_string());
        }

        for line in record.orders.iter().flat_map(|o| o.items.iter()) {
            *self.menus.entry(line.menu_name.clone()).or_insert(0) += i64::from(line.quantity);
        }
    }

    fn finish(
        self,
        period_key: String,
        period_start: NaiveDateTime,
        display_name: Option<String>,
    ) -> AggregatedPeriod {
        let mut top_menus: Vec<MenuSales> = self
            .menus
            .into_iter()
            .map(|(menu_name, quantity)| MenuSales { menu_name, quantity })
            .collect();
        top_menus.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.menu_name.cmp(&b.menu_name)));

        AggregatedPeriod {
            period_key,
            period_start,
            income: self.income,
            items_sold: self.items_sold,
            order_count: self.order_count,
            staff_label: period::staff_label(&self.staff),
            staff_names: self.staff.into_iter().collect(),
            display_name,
            top_menus,
        }
    }
}

fn fold_period(
    records: &[SalesReportRecord],
    period_key: String,
    period_start: NaiveDateTime,
    display_name: Option<String>,
) -> AggregatedPeriod {
    let mut acc = PeriodAccumulator::default();
    for record in records {
        acc.add(record);
    }
    acc.finish(period_key, period_start, display_name)
}

fn apply_direction(ord: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Stable sort: equal keys keep their encounter order in both directions.
pub fn sort_records(records: &mut [SalesReportRecord], field: SortField, direction: SortDirection) {
    records.sort_by(|a, b| {
        let ord = match field {
            SortField::Date => a.date.cmp(&b.date),
            SortField::Income => a.income.cmp(&b.income),
            SortField::ItemsSold => a.items_sold.cmp(&b.items_sold),
            SortField::Id => a.id.cmp(&b.id),
            SortField::StaffName => a.staff_name.cmp(&b.staff_name),
        };
        apply_direction(ord, direction)
    });
}

/// Periods sort by summed income when asked, otherwise by their start instant.
pub fn sort_periods(periods: &mut [AggregatedPeriod], field: SortField, direction: SortDirection) {
    periods.sort_by(|a, b| {
        let ord = match field {
            SortField::Income => a.income.cmp(&b.income),
            _ => a.period_start.cmp(&b.period_start),
        };
        apply_direction(ord, direction)
    });
}

/// Groups records by calendar day, in first-encounter order.
pub fn group_by_day(records: &[SalesReportRecord]) -> Vec<AggregatedPeriod> {
    let mut order: Vec<NaiveDate> = Vec::new();
    let mut buckets: HashMap<NaiveDate, PeriodAccumulator> = HashMap::new();

    for record in records {
        buckets
            .entry(record.date)
            .or_insert_with(|| {
                order.push(record.date);
                PeriodAccumulator::default()
            })
            .add(record);
    }

    order
        .into_iter()
        .filter_map(|day| {
            let acc = buckets.remove(&day)?;
            Some(acc.finish(period::day_key(day), period::start_of_day(day), None))
        })
        .collect()
}

pub fn totals(records: &[SalesReportRecord]) -> ReportTotals {
    records.iter().fold(ReportTotals::default(), |mut t, r| {
        t.total_income += r.income;
        t.total_items_sold += r.items_sold;
        t.total_reports += 1;
        t.total_orders += r.orders.len() as i64;
        t
    })
}

/// Flat listing of report records inside the filter window.
pub async fn list_reports<S>(store: &S, filter: &ReportFilter) -> Result<Vec<SalesReportRecord>, AppError>
where
    S: ReportStore + ?Sized,
{
    let mut records = store.fetch_reports(filter.range, false).await?;
    sort_records(&mut records, filter.sort_field, filter.sort_direction);
    Ok(records)
}

pub async fn aggregate_by_day<S>(store: &S, filter: &ReportFilter) -> Result<Vec<AggregatedPeriod>, AppError>
where
    S: ReportStore + ?Sized,
{
    let records = store.fetch_reports(filter.range, false).await?;
    let mut periods = group_by_day(&records);
    sort_periods(&mut periods, filter.sort_field, filter.sort_direction);

    tracing::debug!(granularity = "daily", periods = periods.len(), "Aggregated sales reports");
    Ok(periods)
}

/// First year worth visiting: the requested start, but never before the oldest
/// stored report. `None` when the store holds nothing.
async fn first_year<S>(store: &S, requested: Option<NaiveDate>, default: i32) -> Result<Option<i32>, AppError>
where
    S: ReportStore + ?Sized,
{
    let Some(earliest) = store.earliest_report_date().await? else {
        return Ok(None);
    };
    Ok(Some(requested.map_or(default, |d| d.year()).max(earliest.year())))
}

/// One range query per calendar month from the start year through the end
/// year, stopping at the current month and skipping months outside the window.
pub async fn aggregate_by_month<S>(
    store: &S,
    filter: &ReportFilter,
    now: NaiveDateTime,
) -> Result<Vec<AggregatedPeriod>, AppError>
where
    S: ReportStore + ?Sized,
{
    let today = now.date();
    let not_future = DateRange::until(today);
    let end_year = filter.range.end.map_or(today.year(), |d| d.year()).min(today.year());

    let mut periods = Vec::new();
    let start_year = match first_year(store, filter.range.start, today.year()).await? {
        Some(year) if !filter.range.is_empty() => year,
        _ => return Ok(periods),
    };
    'years: for year in start_year..=end_year {
        for month0 in 0..12 {
            let Some((first, last)) = period::month_bounds(year, month0) else {
                continue;
            };
            if !not_future.overlaps(first, last) {
                break 'years;
            }
            if !filter.range.overlaps(first, last) {
                continue;
            }

            let records = store.fetch_reports(DateRange::between(first, last), true).await?;
            if records.is_empty() {
                continue;
            }
            periods.push(fold_period(
                &records,
                period::month_key(year, month0),
                period::start_of_day(first),
                Some(period::month_display_name(year, month0)),
            ));
        }
    }

    sort_periods(&mut periods, filter.sort_field, filter.sort_direction);
    tracing::debug!(granularity = "monthly", periods = periods.len(), "Aggregated sales reports");
    Ok(periods)
}

/// Same shape as the monthly rollup, one query per year; the default window
/// starts five years back.
pub async fn aggregate_by_year<S>(
    store: &S,
    filter: &ReportFilter,
    now: NaiveDateTime,
) -> Result<Vec<AggregatedPeriod>, AppError>
where
    S: ReportStore + ?Sized,
{
    let today = now.date();
    let not_future = DateRange::until(today);
    let end_year = filter.range.end.map_or(today.year(), |d| d.year());

    let mut periods = Vec::new();
    let start_year = match first_year(store, filter.range.start, today.year() - 5).await? {
        Some(year) if !filter.range.is_empty() => year,
        _ => return Ok(periods),
    };
    for year in start_year..=end_year {
        let Some((first, last)) = period::year_bounds(year) else {
            continue;
        };
        if !not_future.overlaps(first, last) {
            break;
        }
        if !filter.range.overlaps(first, last) {
            continue;
        }

        let records = store.fetch_reports(DateRange::between(first, last), true).await?;
        if records.is_empty() {
            continue;
        }
        periods.push(fold_period(
            &records,
            year.to_string(),
            period::start_of_day(first),
            Some(period::year_display_name(year)),
        ));
    }

    sort_periods(&mut periods, filter.sort_field, filter.sort_direction);
    tracing::debug!(granularity = "yearly", periods = periods.len(), "Aggregated sales reports");
    Ok(periods)
}

/// Sums over the filtered record set. With no explicit window the hint picks
/// today, this month or this year.
pub async fn compute_totals<S>(
    store: &S,
    range: DateRange,
    hint: PeriodHint,
    today: NaiveDate,
) -> Result<ReportTotals, AppError>
where
    S: ReportStore + ?Sized,
{
    let range = if range.is_unbounded() { hint.range(today) } else { range };
    let records = store.fetch_reports(range, false).await?;
    Ok(totals(&records))
}
