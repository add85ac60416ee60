//! Period sequence generation.
//!
//! Builds ordered runs of calendar periods (`recent_periods`,
//! `offset_buckets`) and fixed-size day chunks (`split_lookback`) for
//! incremental extraction jobs that walk backwards from an anchor date.

use serde::Serialize;
use tracing::debug;

use crate::dates::DateLike;
use crate::error::{PeriodError, Result};
use crate::range::DateRange;
use crate::resolver::resolve;
use crate::unit::{shift_days, CalendarUnit};

/// A date range tagged with the unit and offset that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    pub unit: CalendarUnit,
    pub offset: i64,
    #[serde(flatten)]
    pub range: DateRange,
    /// True when the end was clipped to the anchor date.
    pub trimmed: bool,
}

impl Period {
    pub fn start(&self) -> chrono::NaiveDate {
        self.range.start()
    }

    pub fn end(&self) -> chrono::NaiveDate {
        self.range.end()
    }

    /// Both boundaries are the unit's natural boundaries.
    pub fn is_complete(&self) -> bool {
        self.unit.is_start(self.range.start()) && self.unit.is_end(self.range.end())
    }

    pub fn is_trimmed(&self) -> bool {
        self.trimmed
    }
}

/// Options for [`recent_periods_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodOptions {
    /// Clip the newest period's end to the anchor when the anchor falls
    /// inside it.
    pub trim_last: bool,
}

impl Default for PeriodOptions {
    fn default() -> Self {
        Self { trim_last: true }
    }
}

/// The `count` most recent periods ending at `end_anchor`, newest first,
/// with the newest one trimmed to the anchor.
///
/// Uses default [`PeriodOptions`]. See [`recent_periods_with_options`].
///
/// # Errors
///
/// Same as [`recent_periods_with_options`].
pub fn recent_periods(
    unit: CalendarUnit,
    count: usize,
    end_anchor: impl DateLike,
) -> Result<Vec<Period>> {
    recent_periods_with_options(unit, count, end_anchor, &PeriodOptions::default())
}

/// The `count` most recent periods ending at `end_anchor`, newest first.
///
/// Offsets run `0, -1, …, -(count - 1)`. With `trim_last`, the offset-0
/// period ends at `end_anchor` unless the anchor is already the unit's
/// natural end. Older periods are always complete.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidCount`] if `count == 0`, or
/// [`PeriodError::DateOutOfRange`] if the oldest period falls outside
/// chrono's supported dates, plus anything [`resolve`] can return.
pub fn recent_periods_with_options(
    unit: CalendarUnit,
    count: usize,
    end_anchor: impl DateLike,
    opts: &PeriodOptions,
) -> Result<Vec<Period>> {
    if count == 0 {
        return Err(PeriodError::InvalidCount(
            "count must be >= 1 (got 0)".to_string(),
        ));
    }
    let anchor = end_anchor.to_naive_date()?;

    // fail before building anything when the oldest period is unreachable
    let oldest_offset = i64::try_from(count - 1).map(|n| -n).map_err(|_| {
        PeriodError::DateOutOfRange(format!("{count} {unit} periods before {anchor}"))
    })?;
    resolve(unit, oldest_offset, anchor)?;

    let mut periods = Vec::new();
    for step in 0..count {
        let offset = -i64::try_from(step)
            .map_err(|_| PeriodError::InvalidCount(format!("count {count} too large")))?;
        let range = resolve(unit, offset, anchor)?;
        let trim = offset == 0 && opts.trim_last && range.end() != anchor;
        let period = if trim {
            Period {
                unit,
                offset,
                range: DateRange::new(range.start(), anchor)?,
                trimmed: true,
            }
        } else {
            Period {
                unit,
                offset,
                range,
                trimmed: false,
            }
        };
        periods.push(period);
    }

    debug!(
        %unit,
        count,
        %anchor,
        trim_last = opts.trim_last,
        "generated recent periods"
    );
    Ok(periods)
}

/// One complete period per offset from `offset_start` to `offset_end`
/// inclusive, in iteration order.
///
/// Walks backwards when `offset_start >= offset_end` (the usual
/// `0, -1, -2, …` case) and forwards otherwise. Never trims.
///
/// # Errors
///
/// Same as [`resolve`].
pub fn offset_buckets(
    unit: CalendarUnit,
    offset_start: i64,
    offset_end: i64,
    end_anchor: impl DateLike,
) -> Result<Vec<Period>> {
    let anchor = end_anchor.to_naive_date()?;
    let offsets: Box<dyn Iterator<Item = i64>> = if offset_start >= offset_end {
        Box::new((offset_end..=offset_start).rev())
    } else {
        Box::new(offset_start..=offset_end)
    };

    let buckets = offsets
        .map(|offset| {
            Ok(Period {
                unit,
                offset,
                range: resolve(unit, offset, anchor)?,
                trimmed: false,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(%unit, offset_start, offset_end, %anchor, buckets = buckets.len(), "generated offset buckets");
    Ok(buckets)
}

/// Split the `total_days` ending at `end_anchor` (inclusive) into chunks of
/// `chunk_days`, newest first.
///
/// When `total_days` is not a multiple of `chunk_days` the remainder is the
/// oldest, last-returned chunk.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidCount`] if either argument is below 1.
///
/// # Examples
///
/// ```
/// use period_engine::split_lookback;
///
/// let chunks = split_lookback(10, 3, "2024-01-10").unwrap();
/// assert_eq!(chunks.len(), 4);
/// assert_eq!(chunks[0].to_string(), "[2024-01-08 → 2024-01-10]");
/// assert_eq!(chunks[3].to_string(), "[2024-01-01 → 2024-01-01]");
/// ```
pub fn split_lookback(
    total_days: i64,
    chunk_days: i64,
    end_anchor: impl DateLike,
) -> Result<Vec<DateRange>> {
    if total_days < 1 || chunk_days < 1 {
        return Err(PeriodError::InvalidCount(format!(
            "total_days and chunk_days must be >= 1 (got {total_days}, {chunk_days})"
        )));
    }
    let anchor = end_anchor.to_naive_date()?;

    let mut chunks = Vec::new();
    let mut remaining = total_days;
    let mut chunk_end = anchor;
    while remaining > 0 {
        let len = chunk_days.min(remaining);
        let chunk_start = shift_days(chunk_end, 1 - len)?;
        chunks.push(DateRange::new(chunk_start, chunk_end)?);
        remaining -= len;
        if remaining > 0 {
            chunk_end = shift_days(chunk_start, -1)?;
        }
    }

    debug!(total_days, chunk_days, %anchor, chunks = chunks.len(), "split lookback window");
    Ok(chunks)
}

// ── Tests ───────────────────────────────────────────────────────────────────
