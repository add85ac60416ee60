//! Relative calendar period resolution.
//!
//! `resolve(unit, offset, anchor)` answers questions like "previous month"
//! or "the quarter after next" relative to an anchor date. The result is
//! always a complete period: both boundaries are the unit's natural ones.

use tracing::trace;

use crate::dates::DateLike;
use crate::error::Result;
use crate::range::DateRange;
use crate::unit::CalendarUnit;

/// Resolve the complete period `offset` units away from the one containing
/// `anchor`.
///
/// `offset == 0` is the period containing `anchor`; negative offsets are
/// earlier periods, positive ones later. Month, quarter and year steps move
/// the month/year component from the period start, so month lengths never
/// drift the result.
///
/// # Errors
///
/// Returns [`crate::PeriodError::InvalidDateInput`] for a malformed anchor,
/// or [`crate::PeriodError::DateOutOfRange`] if the target period falls
/// outside chrono's supported dates.
///
/// # Examples
///
/// ```
/// use period_engine::{resolve, CalendarUnit};
///
/// let q = resolve(CalendarUnit::Quarter, -1, "2024-06-15").unwrap();
/// assert_eq!(q.as_tuple(), ("2024-01-01".into(), "2024-03-31".into()));
/// ```
pub fn resolve(unit: CalendarUnit, offset: i64, anchor: impl DateLike) -> Result<DateRange> {
    let anchor = anchor.to_naive_date()?;
    let start = unit.step(unit.start_of(anchor)?, offset)?;
    let end = unit.end_of(start)?;
    trace!(%unit, offset, %anchor, %start, %end, "resolved period");
    DateRange::new(start, end)
}

/// String form of [`resolve`]: the unit is parsed case-insensitively and
/// the boundaries come back as ISO `YYYY-MM-DD` strings.
///
/// # Errors
///
/// Returns [`crate::PeriodError::InvalidUnit`] for an unrecognised unit,
/// plus anything [`resolve`] can return.
pub fn relative_date_frame(
    unit: &str,
    offset: i64,
    anchor: impl DateLike,
) -> Result<(String, String)> {
    let unit: CalendarUnit = unit.parse()?;
    Ok(resolve(unit, offset, anchor)?.as_tuple())
}

// ── Tests ───────────────────────────────────────────────────────────────────
