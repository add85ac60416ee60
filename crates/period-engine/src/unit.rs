//! Calendar units and their natural boundaries.
//!
//! Weeks follow ISO 8601 (Monday to Sunday) regardless of locale. Quarters are
//! fixed calendar quarters starting in January, April, July and October.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PeriodError, Result};

/// The closed set of calendar units the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CalendarUnit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl CalendarUnit {
    /// Every unit, smallest first.
    pub const ALL: [CalendarUnit; 5] = [
        CalendarUnit::Day,
        CalendarUnit::Week,
        CalendarUnit::Month,
        CalendarUnit::Quarter,
        CalendarUnit::Year,
    ];

    /// Canonical uppercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            CalendarUnit::Day => "DAY",
            CalendarUnit::Week => "WEEK",
            CalendarUnit::Month => "MONTH",
            CalendarUnit::Quarter => "QUARTER",
            CalendarUnit::Year => "YEAR",
        }
    }

    /// First day of the period of this unit that contains `date`.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::DateOutOfRange`] when the boundary falls before
    /// the first date chrono can represent (the Monday of chrono's first
    /// partial week does not exist).
    pub fn start_of(self, date: NaiveDate) -> Result<NaiveDate> {
        match self {
            CalendarUnit::Day => Ok(date),
            CalendarUnit::Week => week_start(date),
            CalendarUnit::Month => month_start(date),
            CalendarUnit::Quarter => {
                let q_start_month = ((date.month() - 1) / 3) * 3 + 1;
                first_of(date.year(), q_start_month)
            }
            CalendarUnit::Year => first_of(date.year(), 1),
        }
    }

    /// Last day of the period of this unit that contains `date`.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::DateOutOfRange`] when the boundary falls past
    /// the last date chrono can represent.
    pub fn end_of(self, date: NaiveDate) -> Result<NaiveDate> {
        match self {
            CalendarUnit::Day => Ok(date),
            CalendarUnit::Week => add_days(week_start(date)?, 6),
            CalendarUnit::Month => last_day_after_months(month_start(date)?, 1),
            CalendarUnit::Quarter => last_day_after_months(self.start_of(date)?, 3),
            CalendarUnit::Year => NaiveDate::from_ymd_opt(date.year(), 12, 31)
                .ok_or_else(|| out_of_range(format!("end of year {}", date.year()))),
        }
    }

    /// Whether `date` is the natural first day of its period.
    pub fn is_start(self, date: NaiveDate) -> bool {
        self.start_of(date).is_ok_and(|start| start == date)
    }

    /// Whether `date` is the natural last day of its period.
    pub fn is_end(self, date: NaiveDate) -> bool {
        self.end_of(date).is_ok_and(|end| end == date)
    }

    /// Move `date` by `n` whole units.
    ///
    /// Month-based units change the month/year component directly, so month
    /// lengths never cause drift; a day-of-month past the target month's end
    /// clamps to that month's last day (Jan 31 + 1 month = Feb 29 in 2024).
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::DateOutOfRange`] when the result cannot be
    /// represented.
    pub fn step(self, date: NaiveDate, n: i64) -> Result<NaiveDate> {
        match self {
            CalendarUnit::Day => shift_days(date, n),
            CalendarUnit::Week => {
                let days = n
                    .checked_mul(7)
                    .ok_or_else(|| out_of_range(format!("{n} weeks from {date}")))?;
                shift_days(date, days)
            }
            CalendarUnit::Month => shift_months(date, n),
            CalendarUnit::Quarter => {
                let months = n
                    .checked_mul(3)
                    .ok_or_else(|| out_of_range(format!("{n} quarters from {date}")))?;
                shift_months(date, months)
            }
            CalendarUnit::Year => {
                let months = n
                    .checked_mul(12)
                    .ok_or_else(|| out_of_range(format!("{n} years from {date}")))?;
                shift_months(date, months)
            }
        }
    }
}

impl fmt::Display for CalendarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalendarUnit {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAY" => Ok(CalendarUnit::Day),
            "WEEK" => Ok(CalendarUnit::Week),
            "MONTH" => Ok(CalendarUnit::Month),
            "QUARTER" => Ok(CalendarUnit::Quarter),
            "YEAR" => Ok(CalendarUnit::Year),
            _ => Err(PeriodError::InvalidUnit(format!(
                "'{s}': unit must be one of DAY, WEEK, MONTH, QUARTER, YEAR"
            ))),
        }
    }
}

// ── Boundary helpers ────────────────────────────────────────────────────────

/// Monday of the ISO week containing `date`. Fails inside chrono's first
/// partial week, whose Monday is not representable.
pub(crate) fn week_start(date: NaiveDate) -> Result<NaiveDate> {
    let days_since_monday = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(days_since_monday))
        .ok_or_else(|| out_of_range(format!("Monday of the week containing {date}")))
}

pub(crate) fn month_start(date: NaiveDate) -> Result<NaiveDate> {
    first_of(date.year(), date.month())
}

fn first_of(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| out_of_range(format!("first day of {year:04}-{month:02}")))
}

/// Last day of the span of `months` months beginning at `first`.
fn last_day_after_months(first: NaiveDate, months: u32) -> Result<NaiveDate> {
    first
        .checked_add_months(Months::new(months))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| out_of_range(format!("{months} months after {first}")))
}

pub(crate) fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| out_of_range(format!("{days} days after {date}")))
}

pub(crate) fn shift_days(date: NaiveDate, n: i64) -> Result<NaiveDate> {
    let shifted = if n >= 0 {
        date.checked_add_days(Days::new(n.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(n.unsigned_abs()))
    };
    shifted.ok_or_else(|| out_of_range(format!("{n} days from {date}")))
}

fn shift_months(date: NaiveDate, n: i64) -> Result<NaiveDate> {
    let months = u32::try_from(n.unsigned_abs())
        .map_err(|_| out_of_range(format!("{n} months from {date}")))?;
    let shifted = if n >= 0 {
        date.checked_add_months(Months::new(months))
    } else {
        date.checked_sub_months(Months::new(months))
    };
    shifted.ok_or_else(|| out_of_range(format!("{n} months from {date}")))
}

fn out_of_range(what: String) -> PeriodError {
    PeriodError::DateOutOfRange(what)
}

// ── Tests ───────────────────────────────────────────────────────────────────
