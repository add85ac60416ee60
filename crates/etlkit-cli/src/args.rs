//! CLI argument definitions for etlkit.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use period_engine::CalendarUnit;

/// Calendar periods and JSON record helpers for ETL jobs.
///
/// Period commands print JSON to stdout. Dates are ISO `YYYY-MM-DD`; unit
/// names are case-insensitive (`day`, `week`, `month`, `quarter`, `year`).
///
/// ## Examples
///
/// Previous month relative to an anchor:
///   etlkit frame --unit month --offset -1 --anchor 2024-06-15
///
/// Last four weeks, newest first:
///   etlkit periods --unit week --count 4
///
/// Inspect an API payload:
///   curl -s https://api.example.com/report | etlkit walk --max-depth 2
#[derive(Parser, Debug)]
#[command(name = "etlkit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve one period relative to the anchor
    #[command(allow_negative_numbers = true)]
    Frame {
        #[arg(long)]
        unit: CalendarUnit,

        /// 0 is the current period, -1 the previous one
        #[arg(long, default_value = "0")]
        offset: i64,

        #[command(flatten)]
        anchor: AnchorArg,
    },

    /// The most recent periods, newest first
    Periods {
        #[arg(long)]
        unit: CalendarUnit,

        #[arg(long, value_parser = parse_positive_usize)]
        count: usize,

        /// Keep the newest period complete instead of ending it at the anchor
        #[arg(long)]
        no_trim: bool,

        #[command(flatten)]
        anchor: AnchorArg,
    },

    /// One complete period per offset from --from to --to inclusive
    #[command(allow_negative_numbers = true)]
    Buckets {
        #[arg(long)]
        unit: CalendarUnit,

        #[arg(long)]
        from: i64,

        #[arg(long)]
        to: i64,

        #[command(flatten)]
        anchor: AnchorArg,
    },

    /// Split a day lookback ending at the anchor into chunks, newest first
    Lookback {
        #[arg(long)]
        total_days: i64,

        #[arg(long)]
        chunk_days: i64,

        #[command(flatten)]
        anchor: AnchorArg,
    },

    /// Dates from --start stepping by --interval units while not past --end
    #[command(allow_negative_numbers = true)]
    Dates {
        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,

        #[arg(long, default_value = "1")]
        interval: i64,

        #[arg(long, default_value = "day")]
        unit: CalendarUnit,
    },

    /// Print a JSON document as a tree
    Walk {
        #[command(flatten)]
        input: InputArg,

        /// Stop descending at this container depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Show at most this many items per array
        #[arg(long)]
        max_items: Option<usize>,

        #[arg(long)]
        show_types: bool,

        #[arg(long)]
        show_lengths: bool,

        #[arg(long)]
        quote_strings: bool,

        /// Cut leaf values longer than this many characters
        #[arg(long)]
        truncate: Option<usize>,

        /// Print the depth-limited JSON instead of the tree
        #[arg(long)]
        json: bool,
    },

    /// Remove keys (and optionally empty values) from a JSON document
    Prune {
        #[command(flatten)]
        input: InputArg,

        /// Key to remove at any depth (repeatable)
        #[arg(long = "key", short = 'k')]
        keys: Vec<String>,

        /// Drop null, "", {} and [] left behind
        #[arg(long)]
        remove_empty: bool,

        #[arg(long)]
        max_depth: Option<usize>,
    },
}

/// Reference date for relative periods.
#[derive(Args, Debug, Clone)]
pub struct AnchorArg {
    /// Anchor date (YYYY-MM-DD); defaults to today
    #[arg(long, env = "ETLKIT_ANCHOR")]
    pub anchor: Option<String>,
}

/// JSON document source.
#[derive(Args, Debug, Clone)]
pub struct InputArg {
    /// Input file; omit or use "-" for stdin
    pub file: Option<PathBuf>,
}

/// Log level argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace,
    Debug,
    Info,
    /// Warning level (default)
    Warn,
    /// Error level (least verbose)
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}
