//! Calendar arithmetic shared by the occurrence calculator and the horizon.

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

/// Parse an IANA timezone name. Unlike a lenient fallback, an unknown name
/// is reported so a show is never silently moved to another zone.
pub fn parse_tz(tz: &str) -> Option<chrono_tz::Tz> {
    tz.parse::<chrono_tz::Tz>().ok()
}

/// Map a 0 = Sunday .. 6 = Saturday weekday number.
pub fn weekday_from_sunday(n: i32) -> Option<Weekday> {
    match n {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// `(year, month)` shifted by `delta` months.
pub fn add_months(year: i32, month: u32, delta: i64) -> (i32, u32) {
    let index = i64::from(year) * 12 + i64::from(month) - 1 + delta;
    (index.div_euclid(12) as i32, index.rem_euclid(12) as u32 + 1)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = add_months(year, month, 1);
    match (first_of_month(year, month), first_of_month(ny, nm)) {
        (Some(start), Some(next)) => (next - start).num_days() as u32,
        _ => 0,
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
}

/// The `n`th (1-based) `weekday` of a month.
///
/// Returns `None` when stepping forward crosses into the following month,
/// e.g. a fifth Monday in a month that only has four.
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    if n == 0 {
        return None;
    }
    let first = first_of_month(year, month)?;
    let offset = (7 + weekday.num_days_from_sunday() - first.weekday().num_days_from_sunday()) % 7;
    let date = first.checked_add_signed(chrono::Duration::days(i64::from(offset + 7 * (n - 1))))?;
    (date.month() == month).then_some(date)
}

/// The last `weekday` of a month, found by walking back from its final day.
pub fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let mut date = last_day_of_month(year, month)?;
    for _ in 0..7 {
        if date.weekday() == weekday {
            return Some(date);
        }
        date = date.pred_opt()?;
    }
    None
}

/// Outcome of placing a wall-clock time on a date in a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalTime {
    Exact(DateTime<Utc>),
    /// Fall-back overlap; the earliest mapping was chosen.
    Ambiguous(DateTime<Utc>),
    /// Spring-forward gap; the wall-clock time does not exist that day.
    Missing,
}

/// Combine a calendar date with a wall-clock time in `tz`.
pub fn compose_local(date: NaiveDate, time: NaiveTime, tz: chrono_tz::Tz) -> LocalTime {
    match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => LocalTime::Exact(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => LocalTime::Ambiguous(earliest.with_timezone(&Utc)),
        LocalResult::None => LocalTime::Missing,
    }
}
