//! Inclusive calendar-date ranges.
//!
//! [`DateRange`] is the value type shared by the resolver, the generators and
//! callers that need a general-purpose date interval. It is immutable: every
//! transformation returns a new range and the `start <= end` invariant is
//! checked on construction.

use std::fmt;

use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dates::{format_iso, DateLike};
use crate::error::{PeriodError, Result};
use crate::resolver::resolve;
use crate::unit::{shift_days, CalendarUnit};

/// An inclusive `[start, end]` span of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RangeBounds")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// Unchecked wire shape; deserialisation goes through [`DateRange::new`].
#[derive(Deserialize)]
struct RangeBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RangeBounds> for DateRange {
    type Error = PeriodError;

    fn try_from(bounds: RangeBounds) -> Result<Self> {
        DateRange::new(bounds.start, bounds.end)
    }
}

/// `{since, until}` shape used by Facebook-style reporting APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FbTimeRange {
    pub since: String,
    pub until: String,
}

/// `{starts_at, ends_at}` UTC timestamps; `ends_at` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimestampRange {
    pub starts_at: String,
    pub ends_at: String,
}

impl DateRange {
    /// Build a range from two dates.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidRange`] if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PeriodError::InvalidRange(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// A one-day range.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// A one-day range on today's local date.
    pub fn today() -> Self {
        Self::single(crate::dates::today())
    }

    /// A one-day range from any date-like value.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidDateInput`] for malformed input.
    pub fn on(date: impl DateLike) -> Result<Self> {
        Ok(Self::single(date.to_naive_date()?))
    }

    /// A range from two date-like values.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidDateInput`] for malformed input or
    /// [`PeriodError::InvalidRange`] if `start > end`.
    pub fn from_dates(start: impl DateLike, end: impl DateLike) -> Result<Self> {
        Self::new(start.to_naive_date()?, end.to_naive_date()?)
    }

    /// Inverse of [`DateRange::as_tuple`].
    ///
    /// # Errors
    ///
    /// Same as [`DateRange::from_dates`].
    pub fn from_tuple<A: DateLike, B: DateLike>((start, end): (A, B)) -> Result<Self> {
        Self::from_dates(start, end)
    }

    /// `[anchor - days_lookback, anchor + days_lookforward]`.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidCount`] if either span is negative.
    pub fn around_date(
        anchor: impl DateLike,
        days_lookback: i64,
        days_lookforward: i64,
    ) -> Result<Self> {
        if days_lookback < 0 || days_lookforward < 0 {
            return Err(PeriodError::InvalidCount(format!(
                "days_lookback/days_lookforward must be >= 0 (got {days_lookback}, {days_lookforward})"
            )));
        }
        let anchor = anchor.to_naive_date()?;
        Self::new(
            shift_days(anchor, -days_lookback)?,
            shift_days(anchor, days_lookforward)?,
        )
    }

    /// The complete calendar period `offset` units away from the one
    /// containing `anchor`. See [`resolve`].
    ///
    /// # Errors
    ///
    /// Same as [`resolve`].
    pub fn single_calendar_period(
        unit: CalendarUnit,
        offset: i64,
        anchor: impl DateLike,
    ) -> Result<Self> {
        resolve(unit, offset, anchor)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Closed-interval intersection test; adjacent ranges do not overlap.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Inclusive number of days, so a one-day range counts 1.
    pub fn days_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Move `start` back by `back` days and `end` forward by `forward` days.
    /// Negative values shrink the range.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidRange`] if the result would be inverted.
    pub fn extend_by_days(&self, back: i64, forward: i64) -> Result<Self> {
        let back = back
            .checked_neg()
            .ok_or_else(|| PeriodError::DateOutOfRange(format!("{back} days")))?;
        Self::new(shift_days(self.start, back)?, shift_days(self.end, forward)?)
    }

    /// Move both boundaries by `n` days, keeping the span length.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::DateOutOfRange`] past chrono's supported range.
    pub fn shift_by_days(&self, n: i64) -> Result<Self> {
        Ok(Self {
            start: shift_days(self.start, n)?,
            end: shift_days(self.end, n)?,
        })
    }

    /// Widen to Monday of the first week and Sunday of the last week.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::DateOutOfRange`] past chrono's supported range.
    pub fn extend_to_week_bounds(&self) -> Result<Self> {
        self.extend_to_unit_bounds(CalendarUnit::Week)
    }

    /// Widen to the first day of the first month and the last day of the
    /// last month.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::DateOutOfRange`] past chrono's supported range.
    pub fn extend_to_month_bounds(&self) -> Result<Self> {
        self.extend_to_unit_bounds(CalendarUnit::Month)
    }

    fn extend_to_unit_bounds(&self, unit: CalendarUnit) -> Result<Self> {
        Ok(Self {
            start: unit.start_of(self.start)?,
            end: unit.end_of(self.end)?,
        })
    }

    /// Split into consecutive chunks of `chunk_days`, walking forward from
    /// `start`. The last chunk may be shorter.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidCount`] if `chunk_days < 1`.
    pub fn split(&self, chunk_days: i64) -> Result<Vec<Self>> {
        if chunk_days < 1 {
            return Err(PeriodError::InvalidCount(format!(
                "chunk_days must be >= 1 (got {chunk_days})"
            )));
        }

        let mut chunks = Vec::new();
        let mut cursor = self.start;
        loop {
            let chunk_end = shift_days(cursor, chunk_days - 1)
                .map_or(self.end, |d| d.min(self.end));
            chunks.push(Self {
                start: cursor,
                end: chunk_end,
            });
            if chunk_end == self.end {
                return Ok(chunks);
            }
            cursor = shift_days(chunk_end, 1)?;
        }
    }

    // ── Projections ─────────────────────────────────────────────────────

    /// `("YYYY-MM-DD", "YYYY-MM-DD")`.
    pub fn as_tuple(&self) -> (String, String) {
        (format_iso(self.start), format_iso(self.end))
    }

    pub fn as_list(&self) -> [String; 2] {
        [format_iso(self.start), format_iso(self.end)]
    }

    /// `{"date_start": ..., "date_end": ...}`.
    pub fn as_dict(&self) -> Map<String, Value> {
        self.to_dict_with_custom_keys("date_start", "date_end")
    }

    pub fn to_dict_with_custom_keys(&self, start_key: &str, end_key: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(start_key.to_string(), Value::String(format_iso(self.start)));
        map.insert(end_key.to_string(), Value::String(format_iso(self.end)));
        map
    }

    /// Substitute `{start}` and `{end}` in `template`.
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{start}", &format_iso(self.start))
            .replace("{end}", &format_iso(self.end))
    }

    pub fn to_fb_time_range(&self) -> FbTimeRange {
        FbTimeRange {
            since: format_iso(self.start),
            until: format_iso(self.end),
        }
    }

    /// Local midnight of `start` and of the day after `end` in `timezone`
    /// (IANA name, UTC when `None`), rendered in UTC.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidTimezone`] for an unknown timezone name.
    pub fn to_timestamps(&self, timezone: Option<&str>) -> Result<TimestampRange> {
        let tz = match timezone {
            Some(name) => parse_timezone(name)?,
            None => Tz::UTC,
        };
        let exclusive_end = shift_days(self.end, 1)?;
        Ok(TimestampRange {
            starts_at: utc_midnight_stamp(self.start, &tz)?,
            ends_at: utc_midnight_stamp(exclusive_end, &tz)?,
        })
    }

    /// UTC timestamp pair in the shape Reddit's ads API expects.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::DateOutOfRange`] at the edge of chrono's range.
    pub fn to_reddit_range(&self) -> Result<TimestampRange> {
        self.to_timestamps(None)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} → {}]", format_iso(self.start), format_iso(self.end))
    }
}

impl From<DateRange> for (NaiveDate, NaiveDate) {
    fn from(range: DateRange) -> Self {
        (range.start, range.end)
    }
}

impl TryFrom<(NaiveDate, NaiveDate)> for DateRange {
    type Error = PeriodError;

    fn try_from((start, end): (NaiveDate, NaiveDate)) -> Result<Self> {
        DateRange::new(start, end)
    }
}

/// Parse an IANA timezone string into `Tz`.
fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| PeriodError::InvalidTimezone(format!("'{s}'")))
}

fn utc_midnight_stamp(date: NaiveDate, tz: &Tz) -> Result<String> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    // a DST gap at midnight has no local instant; fall back to the first valid one
    let local = tz
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            let one_am = midnight + chrono::Duration::hours(1);
            tz.from_local_datetime(&one_am).earliest()
        })
        .ok_or_else(|| {
            PeriodError::DateOutOfRange(format!("no local midnight for {date} in {tz}"))
        })?;
    Ok(local
        .with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::from_dates(start, end).unwrap()
    }

    fn sample() -> DateRange {
        range("2024-01-01", "2024-01-07")
    }

    // ── construction ────────────────────────────────────────────────────

    #[test]
    fn test_today_is_single_day() {
        let r = DateRange::today();
        assert_eq!(r.start(), r.end());
        assert_eq!(r.start(), crate::dates::today());
    }

    #[test]
    fn test_single_date_range() {
        let r = DateRange::on("2024-01-15").unwrap();
        assert_eq!(r.as_tuple(), ("2024-01-15".to_string(), "2024-01-15".to_string()));
        assert_eq!(r.days_count(), 1);
    }

    #[test]
    fn test_mixed_inputs() {
        let dt = d(2024, 1, 31).and_hms_opt(23, 59, 0).unwrap();
        let r = DateRange::from_dates(d(2024, 1, 1), dt).unwrap();
        assert_eq!(r.start(), d(2024, 1, 1));
        assert_eq!(r.end(), d(2024, 1, 31));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = DateRange::from_dates("2024-01-07", "2024-01-01").unwrap_err();
        assert!(matches!(err, PeriodError::InvalidRange(_)));
    }

    #[test]
    fn test_invalid_input_rejected() {
        let err = DateRange::from_dates("2024-01-01", "nope").unwrap_err();
        assert!(matches!(err, PeriodError::InvalidDateInput(_)));
    }

    #[test]
    fn test_tuple_roundtrip() {
        let r = sample();
        assert_eq!(DateRange::from_tuple(r.as_tuple()).unwrap(), r);
        let pair: (NaiveDate, NaiveDate) = r.into();
        assert_eq!(DateRange::try_from(pair).unwrap(), r);
    }

    #[test]
    fn test_serde_roundtrip_and_validation() {
        let r = sample();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"start":"2024-01-01","end":"2024-01-07"}"#);
        assert_eq!(serde_json::from_str::<DateRange>(&json).unwrap(), r);

        let inverted = r#"{"start":"2024-01-07","end":"2024-01-01"}"#;
        assert!(serde_json::from_str::<DateRange>(inverted).is_err());
    }

    // ── projections ─────────────────────────────────────────────────────

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "[2024-01-01 → 2024-01-07]");
    }

    #[test]
    fn test_as_list_and_dicts() {
        let r = sample();
        assert_eq!(r.as_list(), ["2024-01-01", "2024-01-07"]);
        assert_eq!(
            Value::Object(r.as_dict()),
            serde_json::json!({"date_start": "2024-01-01", "date_end": "2024-01-07"})
        );
        assert_eq!(
            Value::Object(r.to_dict_with_custom_keys("from_date", "to_date")),
            serde_json::json!({"from_date": "2024-01-01", "to_date": "2024-01-07"})
        );
    }

    #[test]
    fn test_format_template() {
        assert_eq!(sample().format("{start} to {end}"), "2024-01-01 to 2024-01-07");
    }

    #[test]
    fn test_fb_time_range() {
        let fb = sample().to_fb_time_range();
        assert_eq!(fb.since, "2024-01-01");
        assert_eq!(fb.until, "2024-01-07");
    }

    #[test]
    fn test_to_timestamps_utc() {
        let ts = range("2024-01-01", "2024-01-02").to_timestamps(None).unwrap();
        assert_eq!(ts.starts_at, "2024-01-01T00:00:00Z");
        assert_eq!(ts.ends_at, "2024-01-03T00:00:00Z");
    }

    #[test]
    fn test_to_timestamps_with_timezone() {
        // London is on GMT in January
        let ts = range("2024-01-01", "2024-01-01")
            .to_timestamps(Some("Europe/London"))
            .unwrap();
        assert_eq!(ts.starts_at, "2024-01-01T00:00:00Z");
        assert_eq!(ts.ends_at, "2024-01-02T00:00:00Z");

        // New York midnight is 05:00 UTC in winter
        let ts = range("2024-01-01", "2024-01-01")
            .to_timestamps(Some("America/New_York"))
            .unwrap();
        assert_eq!(ts.starts_at, "2024-01-01T05:00:00Z");
        assert_eq!(ts.ends_at, "2024-01-02T05:00:00Z");
    }

    #[test]
    fn test_to_timestamps_invalid_timezone() {
        let err = sample().to_timestamps(Some("Mars/Olympus")).unwrap_err();
        assert!(matches!(err, PeriodError::InvalidTimezone(_)));
    }

    #[test]
    fn test_to_reddit_range() {
        let ts = range("2024-01-01", "2024-01-01").to_reddit_range().unwrap();
        assert_eq!(ts.starts_at, "2024-01-01T00:00:00Z");
        assert_eq!(ts.ends_at, "2024-01-02T00:00:00Z");
    }

    // ── predicates ──────────────────────────────────────────────────────

    #[test]
    fn test_contains() {
        let r = sample();
        assert!(r.contains(d(2024, 1, 3)));
        assert!(r.contains(d(2024, 1, 1)));
        assert!(r.contains(d(2024, 1, 7)));
        assert!(!r.contains(d(2023, 12, 31)));
        assert!(!r.contains(d(2024, 1, 8)));
    }

    #[test]
    fn test_overlaps() {
        let a = range("2024-01-01", "2024-01-10");
        let b = range("2024-01-05", "2024-01-15");
        let c = range("2024-01-15", "2024-01-20");
        let adjacent = range("2024-01-11", "2024-01-20");
        assert!(a.overlaps(&b) && b.overlaps(&a));
        assert!(!a.overlaps(&c) && !c.overlaps(&a));
        assert!(!a.overlaps(&adjacent));
        assert!(b.overlaps(&c)); // share 2024-01-15
    }

    #[test]
    fn test_days_count() {
        assert_eq!(sample().days_count(), 7);
        assert_eq!(range("2024-01-01", "2024-12-31").days_count(), 366);
    }

    // ── transformations ─────────────────────────────────────────────────

    #[test]
    fn test_extend_by_days() {
        let r = sample().extend_by_days(2, 3).unwrap();
        assert_eq!(r, range("2023-12-30", "2024-01-10"));
        let unchanged = sample().extend_by_days(0, 0).unwrap();
        assert_eq!(unchanged, sample());
    }

    #[test]
    fn test_extend_by_negative_days_shrinks() {
        let r = sample().extend_by_days(-3, -3).unwrap();
        assert_eq!(r, range("2024-01-04", "2024-01-04"));
        let err = sample().extend_by_days(-4, -3).unwrap_err();
        assert!(matches!(err, PeriodError::InvalidRange(_)));
    }

    #[test]
    fn test_shift_by_days() {
        assert_eq!(sample().shift_by_days(5).unwrap(), range("2024-01-06", "2024-01-12"));
        assert_eq!(sample().shift_by_days(-3).unwrap(), range("2023-12-29", "2024-01-04"));
        assert_eq!(sample().shift_by_days(-3).unwrap().days_count(), 7);
    }

    #[test]
    fn test_extend_to_week_bounds() {
        // Wednesday to Friday
        let r = range("2024-01-03", "2024-01-05").extend_to_week_bounds().unwrap();
        assert_eq!(r, range("2024-01-01", "2024-01-07"));
        // already aligned: never narrows
        assert_eq!(r.extend_to_week_bounds().unwrap(), r);
    }

    #[test]
    fn test_extend_to_week_bounds_in_first_partial_week() {
        let err = DateRange::single(NaiveDate::MIN).extend_to_week_bounds().unwrap_err();
        assert!(matches!(err, PeriodError::DateOutOfRange(_)));
    }

    #[test]
    fn test_extend_to_month_bounds() {
        let r = range("2024-01-15", "2024-02-20").extend_to_month_bounds().unwrap();
        assert_eq!(r, range("2024-01-01", "2024-02-29"));
        let dec = range("2024-11-15", "2024-12-15").extend_to_month_bounds().unwrap();
        assert_eq!(dec, range("2024-11-01", "2024-12-31"));
    }

    #[test]
    fn test_split_into_chunks() {
        let chunks = sample().split(3).unwrap();
        let rendered: Vec<String> = chunks.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "[2024-01-01 → 2024-01-03]",
                "[2024-01-04 → 2024-01-06]",
                "[2024-01-07 → 2024-01-07]",
            ]
        );
    }

    #[test]
    fn test_split_larger_than_range_is_single_chunk() {
        assert_eq!(sample().split(30).unwrap(), vec![sample()]);
    }

    #[test]
    fn test_split_year_into_weeks() {
        let chunks = range("2024-01-01", "2024-12-31").split(7).unwrap();
        assert_eq!(chunks.len(), 53);
        assert_eq!(chunks.last().unwrap().days_count(), 2);
        let total: i64 = chunks.iter().map(DateRange::days_count).sum();
        assert_eq!(total, 366);
    }

    #[test]
    fn test_split_invalid_chunk_size() {
        let err = sample().split(0).unwrap_err();
        assert_eq!(
            err,
            PeriodError::InvalidCount("chunk_days must be >= 1 (got 0)".to_string())
        );
    }

    // ── constructors over anchors ───────────────────────────────────────

    #[test]
    fn test_around_date() {
        assert_eq!(
            DateRange::around_date("2024-01-15", 5, 0).unwrap(),
            range("2024-01-10", "2024-01-15")
        );
        assert_eq!(
            DateRange::around_date("2024-01-15", 0, 3).unwrap(),
            range("2024-01-15", "2024-01-18")
        );
        assert_eq!(
            DateRange::around_date("2024-01-15", 2, 3).unwrap(),
            range("2024-01-13", "2024-01-18")
        );
    }

    #[test]
    fn test_around_date_negative_values() {
        let err = DateRange::around_date("2024-01-15", -1, 0).unwrap_err();
        assert!(matches!(err, PeriodError::InvalidCount(_)));
    }

    #[test]
    fn test_single_calendar_period() {
        let month = DateRange::single_calendar_period(CalendarUnit::Month, 0, "2024-06-15").unwrap();
        assert_eq!(month, range("2024-06-01", "2024-06-30"));
        // 2024-06-15 is a Saturday; previous week is June 3-9
        let week = DateRange::single_calendar_period(CalendarUnit::Week, -1, "2024-06-15").unwrap();
        assert_eq!(week, range("2024-06-03", "2024-06-09"));
    }
}
