use chrono::{Datelike, NaiveDate};

use super::period;

/// Inclusive calendar-day window. A missing bound is open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start: Some(start), end: Some(end) }
    }

    /// Everything up to and including `end`.
    pub fn until(end: NaiveDate) -> Self {
        Self { start: None, end: Some(end) }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A window whose start lies after its end holds no day at all.
    pub fn is_empty(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// True when `[first, last]` shares at least one day with this window.
    pub fn overlaps(&self, first: NaiveDate, last: NaiveDate) -> bool {
        first <= last
            && !self.is_empty()
            && self.start.map_or(true, |s| last >= s)
            && self.end.map_or(true, |e| first <= e)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Anything other than `asc` sorts descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Date,
    Income,
    ItemsSold,
    Id,
    StaffName,
}

impl SortField {
    /// Unknown fields fall back to the date.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).unwrap_or_default() {
            "income" => SortField::Income,
            "itemsSold" | "items_sold" | "total_items_sold" => SortField::ItemsSold,
            "id" => SortField::Id,
            "staffName" | "staff_name" | "admin" => SortField::StaffName,
            _ => SortField::Date,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub range: DateRange,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

impl ReportFilter {
    pub fn with_range(range: DateRange) -> Self {
        Self { range, ..Self::default() }
    }

    pub fn sorted_by(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort_field = field;
        self.sort_direction = direction;
        self
    }
}

/// Implicit window used by totals when no explicit range is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PeriodHint {
    Daily,
    Monthly,
    Yearly,
    #[default]
    All,
}

impl PeriodHint {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).unwrap_or_default() {
            "daily" => PeriodHint::Daily,
            "monthly" => PeriodHint::Monthly,
            "yearly" => PeriodHint::Yearly,
            _ => PeriodHint::All,
        }
    }

    pub fn range(self, today: NaiveDate) -> DateRange {
        let bounds = match self {
            PeriodHint::Daily => Some((today, today)),
            PeriodHint::Monthly => period::month_bounds(today.year(), today.month0()),
            PeriodHint::Yearly => period::year_bounds(today.year()),
            PeriodHint::All => None,
        };
        bounds.map_or_else(DateRange::default, |(first, last)| DateRange::between(first, last))
    }
}

/// Lenient `YYYY-MM-DD` parsing; also accepts a full RFC 3339 timestamp and keeps its date.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<NaiveDate>()
        .ok()
        .or_else(|| chrono::DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| raw.get(..10).and_then(|d| d.parse::<NaiveDate>().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn overlap_is_inclusive_at_both_edges() {
        let window = DateRange::between(d(2024, 3, 15), d(2024, 4, 1));
        assert!(window.overlaps(d(2024, 3, 1), d(2024, 3, 15)));
        assert!(window.overlaps(d(2024, 4, 1), d(2024, 4, 30)));
        assert!(!window.overlaps(d(2024, 2, 1), d(2024, 2, 29)));
        assert!(!window.overlaps(d(2024, 4, 2), d(2024, 4, 30)));
    }

    #[test]
    fn open_bounds_overlap_everything_on_their_side() {
        assert!(DateRange::default().overlaps(d(1999, 1, 1), d(1999, 12, 31)));
        let until = DateRange::until(d(2024, 6, 10));
        assert!(until.overlaps(d(2024, 6, 1), d(2024, 6, 30)));
        assert!(!until.overlaps(d(2024, 7, 1), d(2024, 7, 31)));
    }

    #[test]
    fn inverted_window_overlaps_nothing() {
        let window = DateRange::between(d(2024, 3, 20), d(2024, 3, 10));
        assert!(window.is_empty());
        assert!(!window.overlaps(d(2024, 3, 1), d(2024, 3, 31)));
        assert!(!window.overlaps(d(2024, 1, 1), d(2024, 12, 31)));
        assert!(!DateRange::between(d(2024, 3, 10), d(2024, 3, 10)).is_empty());
        assert!(!DateRange::until(d(2024, 3, 10)).is_empty());
    }

    #[test]
    fn contains_respects_inclusive_end() {
        let window = DateRange::between(d(2024, 1, 1), d(2024, 1, 31));
        assert!(window.contains(d(2024, 1, 31)));
        assert!(!window.contains(d(2024, 2, 1)));
    }

    #[test]
    fn sort_parsing_defaults() {
        assert_eq!(SortField::parse(None), SortField::Date);
        assert_eq!(SortField::parse(Some("created_at")), SortField::Date);
        assert_eq!(SortField::parse(Some("income")), SortField::Income);
        assert_eq!(SortField::parse(Some("total_items_sold")), SortField::ItemsSold);
        assert_eq!(SortDirection::parse(None), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("ASC")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Desc);
    }

    #[test]
    fn malformed_dates_are_dropped() {
        assert_eq!(parse_date(Some("2024-03-09")), Some(d(2024, 3, 9)));
        assert_eq!(parse_date(Some("2024-03-09T17:00:00.000Z")), Some(d(2024, 3, 9)));
        assert_eq!(parse_date(Some("09/03/2024")), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn period_hint_ranges() {
        let today = d(2024, 2, 14);
        assert_eq!(PeriodHint::Daily.range(today), DateRange::between(today, today));
        assert_eq!(
            PeriodHint::Monthly.range(today),
            DateRange::between(d(2024, 2, 1), d(2024, 2, 29))
        );
        assert_eq!(
            PeriodHint::Yearly.range(today),
            DateRange::between(d(2024, 1, 1), d(2024, 12, 31))
        );
        assert!(PeriodHint::parse(Some("weekly")).range(today).is_unbounded());
    }
}
