//! tracksift: scan and subset very large location-history JSON exports
//!
//! Usage:
//!   # Report the timestamp range a Takeout export covers
//!   tracksift Records.json --mode scan
//!
//!   # Export one year of records
//!   tracksift Records.json --mode export --from 2021-01-01 --to 2021-12-31 --out 2021.json
//!
//!   # Exports wrapped in {"locations": [...]}
//!   tracksift Records.json --mode scan --records-key locations
//!
//!   # Timestamps under non-standard field names
//!   tracksift visits.jsonl --mode scan --time-fields timestamp,visitTime

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracksift::{parse_timestamp, DateRange, ScanStats, TimeFieldSpec};

#[derive(Parser, Debug)]
#[command(name = "tracksift")]
#[command(about = "Scan and subset large location-history JSON exports", long_about = None)]
struct Args {
    /// Input export: NDJSON, a top-level array, or an object with --records-key
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// scan: report the timestamp range; export: write the matching subset
    #[arg(long, value_enum)]
    mode: Mode,

    /// Start of the window, inclusive (e.g. 2021-01-01 or 2021-01-01T00:00:00Z)
    #[arg(long, value_name = "DATE")]
    from: Option<String>,

    /// End of the window, inclusive
    #[arg(long, value_name = "DATE")]
    to: Option<String>,

    /// Output file for export mode
    #[arg(long, default_value = "subset.json")]
    out: PathBuf,

    /// Maximum records to export
    #[arg(long, value_name = "N")]
    limit: Option<u64>,

    /// Key holding the record array when the top level is a single object
    #[arg(long, value_name = "NAME")]
    records_key: Option<String>,

    /// Comma-separated fields to treat as timestamps
    #[arg(
        long,
        value_name = "a,b,c",
        default_value = "startTime,endTime",
        conflicts_with = "scan_all_times"
    )]
    time_fields: String,

    /// Try every string field as a timestamp (slow; accepts mis-match risk)
    #[arg(long)]
    scan_all_times: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Scan,
    Export,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let (from, to) = match parse_bounds(&args) {
        Ok(bounds) => bounds,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(2);
        }
    };

    match run(&args, from, to) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

type Bounds = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

/// Validate --from/--to before touching the input. Argument problems exit
/// with status 2, like clap's own errors.
fn parse_bounds(args: &Args) -> std::result::Result<Bounds, String> {
    let parse = |flag: &str, value: Option<&str>| match value {
        None => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| format!("{flag}: unrecognized date {s:?}")),
    };

    let from = parse("--from", args.from.as_deref())?;
    let to = parse("--to", args.to.as_deref())?;
    if let (Some(from), Some(to)) = (from, to) {
        if to < from {
            return Err("--to is earlier than --from".to_string());
        }
    }
    Ok((from, to))
}

fn run(args: &Args, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<ExitCode> {
    let spec = if args.scan_all_times {
        TimeFieldSpec::ScanAll
    } else {
        TimeFieldSpec::fields(
            args.time_fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty()),
        )
    };

    // Shape detection happens here, before the output file is created, so a
    // shape failure leaves no partial output behind.
    let stream = tracksift::open_records(&args.input, args.records_key.as_deref())
        .with_context(|| format!("cannot read {}", args.input.display()))?;

    let truncated = match args.mode {
        Mode::Scan => {
            let stats = tracksift::scan(stream, &spec)?;
            print_summary(&stats);
            stats.truncated
        }
        Mode::Export => {
            let range = DateRange { from, to };
            let out = File::create(&args.out)
                .with_context(|| format!("cannot write {}", args.out.display()))?;
            let result =
                tracksift::export(stream, &spec, &range, BufWriter::new(out), args.limit)?;
            print_summary(&result.stats);
            println!("Records exported: {}", result.exported);
            println!("Wrote: {}", args.out.display());
            result.stats.truncated
        }
    };

    if truncated {
        eprintln!("warning: input ended mid-record; results cover the readable prefix only");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(stats: &ScanStats) {
    println!("Records scanned: {}", stats.total);
    match (stats.earliest, stats.latest) {
        (Some(earliest), Some(latest)) => {
            println!("Earliest (UTC): {}", earliest.to_rfc3339());
            println!("Latest   (UTC): {}", latest.to_rfc3339());
        }
        _ => {
            println!("Earliest (UTC): none");
            println!("Latest   (UTC): none");
        }
    }
    if stats.skipped_lines > 0 {
        eprintln!(
            "warning: skipped {} line(s) that failed to parse",
            stats.skipped_lines
        );
    }
}
