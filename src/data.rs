//! Data loading and management
//!
//! Handles discovering per-instrument files and loading OHLC bars from
//! delimited text with a `Date,Time,Open,High,Low,Close` style header.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::Bar;

// =============================================================================
// Constants
// =============================================================================

/// Accepted date formats, tried in order
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

/// Accepted time formats, tried in order
pub const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M", "%H%M%S"];

// =============================================================================
// File Discovery
// =============================================================================

/// List instrument files with the given extension, sorted by file name
pub fn discover_instruments(data_dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let data_dir = data_dir.as_ref();
    let wanted = extension.trim_start_matches('.');

    let entries = std::fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory: {}", data_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(wanted));
        if path.is_file() && matches {
            files.push(path);
        }
    }

    files.sort();
    debug!("Found {} *.{} files in {}", files.len(), wanted, data_dir.display());
    Ok(files)
}

/// Instrument identifier derived from the file stem
pub fn instrument_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// CSV Data Loading
// =============================================================================

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    time: usize,
    open: Option<usize>,
    high: usize,
    low: usize,
    close: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| find(name).with_context(|| format!("Missing {} column", name));

        Ok(Columns {
            date: require("Date")?,
            time: require("Time")?,
            open: find("Open"),
            high: require("High")?,
            low: require("Low")?,
            close: require("Close")?,
        })
    }
}

fn parse_field(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64> {
    record
        .get(idx)
        .with_context(|| format!("Missing {} column", name))?
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse {}", name))
}

/// Combine a Date and Time field into one chronological key
pub fn parse_datetime(date: &str, time: &str) -> Result<NaiveDateTime> {
    let date = date.trim();
    let time = time.trim();

    let d = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date, f).ok())
        .with_context(|| format!("Failed to parse date: {}", date))?;
    let t = TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(time, f).ok())
        .with_context(|| format!("Failed to parse time: {}", time))?;

    Ok(d.and_time(t))
}

/// Load OHLC bars from a delimited file, sorted by timestamp
///
/// Rows that fail validation are skipped with a warning; rows that cannot be
/// parsed fail the whole file.
pub fn load_bars(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context("Failed to open CSV file")?;

    let headers = reader.headers().context("Failed to read header row")?.clone();
    let cols = Columns::from_headers(&headers)?;

    let mut bars = Vec::new();
    let mut invalid_count = 0;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let datetime = parse_datetime(
            record.get(cols.date).context("Missing Date column")?,
            record.get(cols.time).context("Missing Time column")?,
        )
        .with_context(|| format!("Row {}", row_idx + 1))?;

        let high = parse_field(&record, cols.high, "High")?;
        let low = parse_field(&record, cols.low, "Low")?;
        let close = parse_field(&record, cols.close, "Close")?;
        let open = match cols.open {
            Some(idx) => parse_field(&record, idx, "Open")?,
            None => close,
        };

        match Bar::new(datetime, open, high, low, close) {
            Ok(bar) => bars.push(bar),
            Err(e) => {
                invalid_count += 1;
                warn!(
                    "Skipping invalid bar at row {} in {:?}: {}",
                    row_idx + 2, // +2 for 1-indexed and header row
                    path.file_name().unwrap_or_default(),
                    e
                );
            }
        }
    }

    if invalid_count > 0 {
        warn!(
            "Skipped {} invalid bars out of {} in {:?}",
            invalid_count,
            invalid_count + bars.len(),
            path.file_name().unwrap_or_default()
        );
    }

    sort_bars(&mut bars);
    Ok(bars)
}

/// Stable sort by timestamp
pub fn sort_bars(bars: &mut [Bar]) {
    bars.sort_by_key(|b| b.datetime);
}
