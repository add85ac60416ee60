//! Main execution logic for the etlkit CLI.

use std::fs;
use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use etl_structures::{prune_data, walk, PruneOptions, WalkOptions};
use period_engine::{
    generate_date_array, offset_buckets, parse_iso_date, recent_periods_with_options, resolve,
    split_lookback, today, PeriodOptions,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::args::{AnchorArg, Command, InputArg, LogLevel};

/// Initialize logging. `RUST_LOG` wins over `--log-level`.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let level: tracing::Level = level.into();
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")?;

    Ok(())
}

/// Run one subcommand, writing its result to `out`.
pub fn execute<W: Write>(command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Frame { unit, offset, anchor } => {
            let anchor = resolve_anchor(&anchor)?;
            let range = resolve(unit, offset, anchor)
                .with_context(|| format!("cannot resolve {unit} offset {offset} from {anchor}"))?;
            write_json(out, &range)
        }
        Command::Periods {
            unit,
            count,
            no_trim,
            anchor,
        } => {
            let anchor = resolve_anchor(&anchor)?;
            let opts = PeriodOptions { trim_last: !no_trim };
            let periods = recent_periods_with_options(unit, count, anchor, &opts)
                .with_context(|| format!("cannot generate {count} {unit} periods ending {anchor}"))?;
            write_json(out, &periods)
        }
        Command::Buckets { unit, from, to, anchor } => {
            let anchor = resolve_anchor(&anchor)?;
            let buckets = offset_buckets(unit, from, to, anchor)
                .with_context(|| format!("cannot generate {unit} buckets {from}..={to}"))?;
            write_json(out, &buckets)
        }
        Command::Lookback {
            total_days,
            chunk_days,
            anchor,
        } => {
            let anchor = resolve_anchor(&anchor)?;
            let chunks = split_lookback(total_days, chunk_days, anchor)
                .context("cannot split lookback")?;
            write_json(out, &chunks)
        }
        Command::Dates {
            start,
            end,
            interval,
            unit,
        } => {
            let dates = generate_date_array(start.as_str(), end.as_str(), interval, unit)
                .context("cannot generate date array")?;
            write_json(out, &dates)
        }
        Command::Walk {
            input,
            max_depth,
            max_items,
            show_types,
            show_lengths,
            quote_strings,
            truncate,
            json,
        } => {
            let value = read_json(&input)?;
            let opts = WalkOptions {
                show_types,
                quote_strings,
                max_depth,
                max_items_per_container: max_items,
                truncate_value_len: truncate,
                show_lengths,
                ..WalkOptions::default()
            };
            if json {
                write_json(out, &etl_structures::collect(&value, &opts))
            } else {
                walk(&value, &opts, out).context("failed to write tree")?;
                Ok(())
            }
        }
        Command::Prune {
            input,
            keys,
            remove_empty,
            max_depth,
        } => {
            let value = read_json(&input)?;
            let mut opts = PruneOptions::new().keys(keys).remove_empty(remove_empty);
            if let Some(depth) = max_depth {
                opts = opts.max_depth(depth);
            }
            write_json(out, &prune_data(&value, &opts))
        }
    }
}

fn resolve_anchor(arg: &AnchorArg) -> Result<NaiveDate> {
    match &arg.anchor {
        Some(s) => parse_iso_date(s).with_context(|| format!("invalid --anchor '{s}'")),
        None => {
            let date = today();
            debug!(%date, "no anchor given; using today");
            Ok(date)
        }
    }
}

fn read_json(input: &InputArg) -> Result<Value> {
    let (source, text) = match input.file.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            (path.display().to_string(), text)
        }
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            ("stdin".to_string(), text)
        }
    };
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {source}"))
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to serialize output")?;
    writeln!(out).context("failed to write output")?;
    Ok(())
}
