//! # period-engine
//!
//! Calendar period arithmetic for incremental ETL jobs.
//!
//! The engine answers "which dates does *previous month* or *the last four
//! weeks* cover, relative to this anchor?" with calendar-aligned, inclusive
//! date ranges. It never drifts across month lengths, respects leap years,
//! and uses ISO weeks (Monday to Sunday).
//!
//! ## Modules
//!
//! - [`dates`] — date-like input normalisation and strict ISO parsing
//! - [`unit`] — `CalendarUnit` and its natural boundaries and stepping
//! - [`resolver`] — single relative period resolution (`resolve`)
//! - [`generator`] — period sequences and lookback chunking
//! - [`range`] — the `DateRange` value type and its projections
//! - [`sequence`] — `GENERATE_DATE_ARRAY`-style stepped date lists
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use period_engine::{recent_periods, resolve, CalendarUnit};
//!
//! let june = resolve(CalendarUnit::Month, 0, "2024-06-15").unwrap();
//! assert_eq!(june.to_string(), "[2024-06-01 → 2024-06-30]");
//!
//! let weeks = recent_periods(CalendarUnit::Week, 4, "2024-01-28").unwrap();
//! assert_eq!(weeks[3].start().to_string(), "2024-01-08");
//! ```

pub mod dates;
pub mod error;
pub mod generator;
pub mod range;
pub mod resolver;
pub mod sequence;
pub mod unit;

pub use dates::{format_year_month, parse_iso_date, to_date, to_date_iso_str, today, DateLike, Today};
pub use error::{PeriodError, Result};
pub use generator::{
    offset_buckets, recent_periods, recent_periods_with_options, split_lookback, Period,
    PeriodOptions,
};
pub use range::{DateRange, FbTimeRange, TimestampRange};
pub use resolver::{relative_date_frame, resolve};
pub use sequence::generate_date_array;
pub use unit::CalendarUnit;
