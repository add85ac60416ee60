//! Date-like input normalisation.
//!
//! Every public entry point of the crate accepts its dates through the
//! [`DateLike`] trait, so callers can pass a [`NaiveDate`], a datetime (the
//! time part is dropped), a strict ISO `YYYY-MM-DD` string, or the [`Today`]
//! marker. Internally the engine only ever works with [`NaiveDate`].
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use period_engine::dates::{to_date, to_date_iso_str};
//!
//! let d = to_date("2024-02-29").unwrap();
//! assert_eq!(d, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
//! assert_eq!(to_date_iso_str(d).unwrap(), "2024-02-29");
//! assert!(to_date("2024-1-1").is_err());
//! ```

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::error::{PeriodError, Result};

/// ISO 8601 calendar-date format used for every rendered boundary.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// A value that can be normalised to a calendar date.
pub trait DateLike {
    /// Normalise to a [`NaiveDate`].
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidDateInput`] when the value cannot be
    /// interpreted as a calendar date.
    fn to_naive_date(&self) -> Result<NaiveDate>;
}

impl DateLike for NaiveDate {
    fn to_naive_date(&self) -> Result<NaiveDate> {
        Ok(*self)
    }
}

impl DateLike for NaiveDateTime {
    fn to_naive_date(&self) -> Result<NaiveDate> {
        Ok(self.date())
    }
}

/// The local date component is kept; no conversion to UTC happens first.
impl<Tz: TimeZone> DateLike for DateTime<Tz> {
    fn to_naive_date(&self) -> Result<NaiveDate> {
        Ok(self.date_naive())
    }
}

impl DateLike for str {
    fn to_naive_date(&self) -> Result<NaiveDate> {
        parse_iso_date(self)
    }
}

impl DateLike for String {
    fn to_naive_date(&self) -> Result<NaiveDate> {
        parse_iso_date(self)
    }
}

impl<T: DateLike + ?Sized> DateLike for &T {
    fn to_naive_date(&self) -> Result<NaiveDate> {
        (**self).to_naive_date()
    }
}

/// Marker that resolves to the current local date at the moment it is read.
///
/// Used wherever an anchor defaults to "today"; the clock is consulted on
/// every call, never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Today;

impl DateLike for Today {
    fn to_naive_date(&self) -> Result<NaiveDate> {
        Ok(today())
    }
}

/// The current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Normalise any [`DateLike`] value to a [`NaiveDate`].
///
/// # Errors
///
/// Returns [`PeriodError::InvalidDateInput`] for malformed strings.
pub fn to_date(value: impl DateLike) -> Result<NaiveDate> {
    value.to_naive_date()
}

/// Normalise any [`DateLike`] value to its ISO `YYYY-MM-DD` form.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidDateInput`] for malformed strings.
pub fn to_date_iso_str(value: impl DateLike) -> Result<String> {
    Ok(format_iso(value.to_naive_date()?))
}

/// Format a date as `YYYY-MM` (e.g. `"2024-03"`).
///
/// # Errors
///
/// Returns [`PeriodError::InvalidDateInput`] for malformed strings.
pub fn format_year_month(value: impl DateLike) -> Result<String> {
    Ok(value.to_naive_date()?.format("%Y-%m").to_string())
}

/// Parse a strict ISO 8601 calendar date.
///
/// Only the zero-padded `YYYY-MM-DD` shape is accepted: `"2024-1-1"` and
/// `"24-01-01"` are rejected even though a lenient parser would read them.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidDateInput`] on a malformed shape or an
/// impossible date such as `"2024-02-30"`.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    let well_formed = s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(PeriodError::InvalidDateInput(format!(
            "'{s}': expected YYYY-MM-DD"
        )));
    }
    NaiveDate::parse_from_str(s, ISO_DATE_FORMAT)
        .map_err(|e| PeriodError::InvalidDateInput(format!("'{s}': {e}")))
}

pub(crate) fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

// ── Tests ───────────────────────────────────────────────────────────────────
