//! Stepped date sequences in the style of `GENERATE_DATE_ARRAY`.

use chrono::NaiveDate;

use crate::dates::DateLike;
use crate::error::Result;
use crate::unit::CalendarUnit;

/// Every date from `start` towards `end` (inclusive) in steps of `interval`
/// units.
///
/// Element *k* is `start + k * interval` units computed from `start`, so
/// month steps clamp to month end without accumulating drift
/// (Jan 31, Feb 29, Mar 31 in 2024). A zero interval, or one pointing away
/// from `end`, yields an empty vector.
///
/// # Errors
///
/// Returns [`crate::PeriodError::InvalidDateInput`] for malformed input.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use period_engine::{generate_date_array, CalendarUnit};
///
/// let dates = generate_date_array("2024-01-01", "2024-01-10", 2, CalendarUnit::Day).unwrap();
/// assert_eq!(dates.len(), 5);
/// assert_eq!(dates[4], NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
/// ```
pub fn generate_date_array(
    start: impl DateLike,
    end: impl DateLike,
    interval: i64,
    unit: CalendarUnit,
) -> Result<Vec<NaiveDate>> {
    let start = start.to_naive_date()?;
    let end = end.to_naive_date()?;

    if interval == 0 || (interval > 0 && start > end) || (interval < 0 && start < end) {
        return Ok(Vec::new());
    }

    let past_end = |date: NaiveDate| if interval > 0 { date > end } else { date < end };
    let mut dates = Vec::new();
    for k in 0_i64.. {
        // stepping beyond chrono's range also means stepping past `end`
        let Some(date) = k
            .checked_mul(interval)
            .and_then(|n| unit.step(start, n).ok())
        else {
            break;
        };
        if past_end(date) {
            break;
        }
        dates.push(date);
    }
    Ok(dates)
}

// ── Tests ───────────────────────────────────────────────────────────────────
