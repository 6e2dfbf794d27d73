//! Business-day and business-month windows
//!
//! Reports group invoices by the hall's local calendar, which is a fixed UTC
//! offset. Windows are half-open `[start, end)` instants in UTC.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::error::{ApiError, ApiResult};

/// Local midnight of `date` as a UTC instant
fn local_midnight(date: NaiveDate, offset: FixedOffset) -> ApiResult<DateTime<Utc>> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ApiError::Internal(format!("no midnight on {}", date)))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ApiError::Internal(format!("ambiguous local time on {}", date)))
}

pub fn day_window(date: NaiveDate, offset: FixedOffset) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date
        .succ_opt()
        .ok_or_else(|| ApiError::Validation(format!("date out of range: {}", date)))?;
    Ok((local_midnight(date, offset)?, local_midnight(next, offset)?))
}

pub fn month_window(
    year: i32,
    month: u32,
    offset: FixedOffset,
) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
    if !(1..=12).contains(&month) {
        return Err(ApiError::Validation(
            "month must be between 1 and 12".to_string(),
        ));
    }

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ApiError::Validation(format!("invalid year: {}", year)))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| ApiError::Validation(format!("invalid year: {}", year)))?;

    Ok((local_midnight(first, offset)?, local_midnight(next, offset)?))
}

/// Calendar date of `now` in business time
pub fn business_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// (year, month) of `now` in business time
pub fn business_month(now: DateTime<Utc>, offset: FixedOffset) -> (i32, u32) {
    let local = now.with_timezone(&offset);
    (local.year(), local.month())
}

/// `HH:MM` wall-clock rendering in business time
pub fn clock_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%H:%M").to_string()
}
