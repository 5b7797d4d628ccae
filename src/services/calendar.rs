//! Calendar-month arithmetic and the seasonal demand table.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

use crate::errors::ServiceError;

/// Demand multipliers indexed by zero-based calendar month.
///
/// Holiday season (Nov, Dec) ×1.5, summer (Jun to Aug) ×1.3,
/// slow season (Jan, Feb) ×0.7, everything else ×1.0.
pub const DEFAULT_SEASONAL_MULTIPLIERS: [f64; 12] =
    [0.7, 0.7, 1.0, 1.0, 1.0, 1.3, 1.3, 1.3, 1.0, 1.0, 1.5, 1.5];

/// Looks up the multiplier for a zero-based month, falling back to 1.0.
pub fn seasonal_multiplier(table: &[f64], month0: u32) -> f64 {
    table.get(month0 as usize).copied().unwrap_or(1.0)
}

/// The same instant `months` calendar months earlier.
///
/// The day of month is clamped to the length of the target month
/// (31 March minus one month is 28 or 29 February).
pub fn months_before(at: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, ServiceError> {
    at.checked_sub_months(Months::new(months)).ok_or_else(|| {
        ServiceError::InvalidInput(format!("{} minus {} months is out of range", at, months))
    })
}

/// The same instant `months` calendar months later, day clamped like [`months_before`].
pub fn months_after(at: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, ServiceError> {
    at.checked_add_months(Months::new(months)).ok_or_else(|| {
        ServiceError::InvalidInput(format!("{} plus {} months is out of range", at, months))
    })
}

/// First day of the calendar month containing `at` (UTC).
pub fn month_start(at: DateTime<Utc>) -> NaiveDate {
    let date = at.date_naive();
    date.with_day(1).unwrap_or(date)
}
