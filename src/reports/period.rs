use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// First and last day of a month; `month0` is zero-based.
pub fn month_bounds(year: i32, month0: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
    let next = if month0 == 11 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month0 + 2, 1)?
    };
    Some((first, next.pred_opt()?))
}

pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((NaiveDate::from_ymd_opt(year, 1, 1)?, NaiveDate::from_ymd_opt(year, 12, 31)?))
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Day marker: epoch milliseconds of local midnight, read as if it were UTC.
pub fn day_key(date: NaiveDate) -> String {
    start_of_day(date).and_utc().timestamp_millis().to_string()
}

pub fn month_key(year: i32, month0: u32) -> String {
    format!("{year}-{month0}")
}

pub fn month_display_name(year: i32, month0: u32) -> String {
    let name = MONTH_NAMES.get(month0 as usize).copied().unwrap_or("?");
    format!("{name} {year}")
}

pub fn year_display_name(year: i32) -> String {
    format!("Tahun {year}")
}

pub const UNKNOWN_STAFF: &str = "-";

/// One known name is shown as-is, several collapse into "N Kasir".
pub fn staff_label(names: &BTreeSet<String>) -> String {
    match names.len() {
        0 => UNKNOWN_STAFF.to_string(),
        1 => names.iter().next().cloned().unwrap_or_default(),
        n => format!("{n} Kasir"),
    }
}
