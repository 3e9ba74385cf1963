//! Range scanning and subset export.
//!
//! Both operations fold record timestamps into an explicit [`ScanStats`]
//! accumulator owned here and returned to the caller, not into ambient
//! mutable state, so the fold is testable in isolation from I/O.

use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::stream::{Record, RecordStream};
use crate::times::{extract_times, TimeFieldSpec};

/// Inclusive `[from, to]` window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Whether `t` falls inside the window. Open bounds behave as -∞/+∞.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if t < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if t > to {
                return false;
            }
        }
        true
    }
}

/// Running statistics over a record stream.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Records seen, whether or not they carried a parseable timestamp.
    pub total: u64,
    /// NDJSON lines that failed to parse and were skipped.
    pub skipped_lines: u64,
    /// Earliest timestamp observed, if any record yielded one.
    pub earliest: Option<DateTime<Utc>>,
    /// Latest timestamp observed, if any record yielded one.
    pub latest: Option<DateTime<Utc>>,
    /// The input ended mid-structure; the statistics cover the readable
    /// prefix only.
    pub truncated: bool,
}

impl ScanStats {
    /// Fold one record's timestamps into the accumulator. A record with no
    /// parseable timestamp still counts toward the total.
    pub fn fold(&mut self, times: &[DateTime<Utc>]) {
        self.total += 1;
        for &t in times {
            self.earliest = Some(self.earliest.map_or(t, |e| e.min(t)));
            self.latest = Some(self.latest.map_or(t, |l| l.max(t)));
        }
    }
}

/// Outcome of an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    /// Records written to the output array.
    pub exported: u64,
    /// Statistics over the records iterated before the run ended.
    pub stats: ScanStats,
}

/// Iterate the full stream and report count plus earliest/latest timestamps.
///
/// Truncated input terminates the scan gracefully: partial statistics are
/// returned with [`ScanStats::truncated`] set rather than an error.
pub fn scan<R: BufRead>(mut stream: RecordStream<R>, spec: &TimeFieldSpec) -> Result<ScanStats> {
    let mut stats = ScanStats::default();
    for item in stream.by_ref() {
        match item {
            Ok(record) => stats.fold(&extract_times(&record.value, spec)),
            Err(err) if err.is_truncation() => {
                stats.truncated = true;
                break;
            }
            Err(err) => return Err(err),
        }
    }
    stats.skipped_lines = stream.skipped_lines();
    Ok(stats)
}

/// Write records whose timestamps fall inside `range` to `out` as a single
/// JSON array, incrementally, preserving each record's original text.
///
/// Iteration stops early once `limit` records have been written. The array
/// is opened before the first record and closed after the last, so an
/// interrupted run leaves a recognizably incomplete file.
pub fn export<R: BufRead, W: Write>(
    mut stream: RecordStream<R>,
    spec: &TimeFieldSpec,
    range: &DateRange,
    out: W,
    limit: Option<u64>,
) -> Result<ExportResult> {
    let mut stats = ScanStats::default();
    let mut writer = SubsetWriter::new(out)?;

    for item in stream.by_ref() {
        match item {
            Ok(record) => {
                let times = extract_times(&record.value, spec);
                stats.fold(&times);
                if times.iter().any(|&t| range.contains(t)) {
                    writer.write_record(&record)?;
                    if limit.is_some_and(|l| writer.written() >= l) {
                        break;
                    }
                }
            }
            Err(err) if err.is_truncation() => {
                stats.truncated = true;
                break;
            }
            Err(err) => return Err(err),
        }
    }
    stats.skipped_lines = stream.skipped_lines();

    let exported = writer.finish()?;
    Ok(ExportResult { exported, stats })
}

/// Incremental writer for the exported array: `[` up front, `,`-separated
/// original record texts, `]` on finish.
pub struct SubsetWriter<W: Write> {
    out: W,
    written: u64,
}

impl<W: Write> SubsetWriter<W> {
    pub fn new(mut out: W) -> Result<Self> {
        out.write_all(b"[\n")?;
        Ok(SubsetWriter { out, written: 0 })
    }

    /// Append one record's original text.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        if self.written > 0 {
            self.out.write_all(b",\n")?;
        }
        self.out.write_all(record.raw.as_bytes())?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Close the array and flush. Returns the record count.
    pub fn finish(mut self) -> Result<u64> {
        self.out.write_all(b"\n]\n")?;
        self.out.flush()?;
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use crate::times::parse_timestamp;
    use std::io::Cursor;

    fn open(input: &str, key: Option<&str>) -> RecordStream<Cursor<Vec<u8>>> {
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let shape = Shape::detect(&mut reader, key).unwrap();
        RecordStream::open(reader, &shape).unwrap()
    }

    fn range(from: Option<&str>, to: Option<&str>) -> DateRange {
        DateRange {
            from: from.map(|s| parse_timestamp(s).unwrap()),
            to: to.map(|s| parse_timestamp(s).unwrap()),
        }
    }

    fn export_to_string(input: &str, r: &DateRange, limit: Option<u64>) -> (String, ExportResult) {
        let mut buf = Vec::new();
        let result = export(
            open(input, None),
            &TimeFieldSpec::default_fields(),
            r,
            &mut buf,
            limit,
        )
        .unwrap();
        (String::from_utf8(buf).unwrap(), result)
    }

    const TWO_RECORDS: &str =
        r#"[{"startTime":"2021-06-01T00:00:00Z"},{"startTime":"2022-01-01T00:00:00Z"}]"#;

    #[test]
    fn test_fold_tracks_min_and_max() {
        let mut stats = ScanStats::default();
        stats.fold(&[parse_timestamp("2021-06-01").unwrap()]);
        stats.fold(&[]);
        stats.fold(&[
            parse_timestamp("2020-01-01").unwrap(),
            parse_timestamp("2022-01-01").unwrap(),
        ]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.earliest, parse_timestamp("2020-01-01"));
        assert_eq!(stats.latest, parse_timestamp("2022-01-01"));
    }

    #[test]
    fn test_scan_counts_records_without_timestamps() {
        let stats = scan(
            open(r#"[{"startTime":"2021-06-01"},{"note":"no time"}]"#, None),
            &TimeFieldSpec::default_fields(),
        )
        .unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.earliest, parse_timestamp("2021-06-01"));
        assert_eq!(stats.latest, parse_timestamp("2021-06-01"));
    }

    #[test]
    fn test_scan_with_no_parseable_timestamps() {
        let stats = scan(open(r#"[{"a":1},{"b":2}]"#, None), &TimeFieldSpec::default_fields())
            .unwrap();
        assert_eq!(stats.total, 2);
        assert!(stats.earliest.is_none());
        assert!(stats.latest.is_none());
    }

    #[test]
    fn test_export_filters_by_range() {
        let (out, result) = export_to_string(
            TWO_RECORDS,
            &range(Some("2021-01-01"), Some("2021-12-31")),
            None,
        );
        assert_eq!(result.exported, 1);
        assert_eq!(result.stats.total, 2);
        assert!(out.contains("2021-06-01"));
        assert!(!out.contains("2022-01-01"));
    }

    #[test]
    fn test_export_bounds_are_inclusive() {
        let input = r#"[{"startTime":"2021-01-01T00:00:00Z"},{"startTime":"2021-12-31T00:00:00Z"}]"#;
        let (_, result) = export_to_string(
            input,
            &range(Some("2021-01-01T00:00:00Z"), Some("2021-12-31T00:00:00Z")),
            None,
        );
        assert_eq!(result.exported, 2);
    }

    #[test]
    fn test_export_unbounded_round_trips_all_records() {
        let (out, result) = export_to_string(TWO_RECORDS, &DateRange::default(), None);
        assert_eq!(result.exported, 2);
        let reparsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        let original: serde_json::Value = serde_json::from_str(TWO_RECORDS).unwrap();
        assert_eq!(reparsed, original);
        // Element text survives byte for byte.
        assert!(out.contains(r#"{"startTime":"2021-06-01T00:00:00Z"}"#));
    }

    #[test]
    fn test_export_is_idempotent() {
        let r = range(Some("2021-01-01"), None);
        let (first, _) = export_to_string(TWO_RECORDS, &r, None);
        let (second, _) = export_to_string(TWO_RECORDS, &r, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_export_limit_stops_early() {
        let input = r#"[{"startTime":"2021-01-01"},{"startTime":"2021-02-01"},{"startTime":"2021-03-01"}]"#;
        let (out, result) = export_to_string(input, &DateRange::default(), Some(2));
        assert_eq!(result.exported, 2);
        // Iteration stopped at the limit, before the third record.
        assert_eq!(result.stats.total, 2);
        assert!(!out.contains("2021-03-01"));
        let reparsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(reparsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_export_excludes_records_without_timestamps() {
        let input = r#"[{"note":"no time"},{"startTime":"2021-06-01"}]"#;
        let (out, result) = export_to_string(input, &DateRange::default(), None);
        assert_eq!(result.exported, 1);
        assert_eq!(result.stats.total, 2);
        assert!(!out.contains("no time"));
    }

    #[test]
    fn test_export_output_is_valid_empty_array_when_nothing_matches() {
        let (out, result) = export_to_string(
            TWO_RECORDS,
            &range(Some("1999-01-01"), Some("1999-12-31")),
            None,
        );
        assert_eq!(result.exported, 0);
        let reparsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(reparsed.as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_shape_transparency() {
        let ndjson = "{\"startTime\":\"2021-06-01T00:00:00Z\"}\n{\"startTime\":\"2022-01-01T00:00:00Z\"}\n";
        let keyed =
            r#"{"meta":1,"records":[{"startTime":"2021-06-01T00:00:00Z"},{"startTime":"2022-01-01T00:00:00Z"}]}"#;
        let spec = TimeFieldSpec::default_fields();

        let from_array = scan(open(TWO_RECORDS, None), &spec).unwrap();
        let from_ndjson = scan(open(ndjson, None), &spec).unwrap();
        let from_keyed = scan(open(keyed, Some("records")), &spec).unwrap();

        for stats in [&from_ndjson, &from_keyed] {
            assert_eq!(stats.total, from_array.total);
            assert_eq!(stats.earliest, from_array.earliest);
            assert_eq!(stats.latest, from_array.latest);
        }
    }

    #[test]
    fn test_truncated_input_reports_partial_stats() {
        let input = r#"[{"startTime":"2021-06-01"},{"startTime":"2022-01-01""#;
        let stats = scan(open(input, None), &TimeFieldSpec::default_fields()).unwrap();
        assert!(stats.truncated);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.earliest, parse_timestamp("2021-06-01"));
    }

    #[test]
    fn test_truncated_export_still_closes_the_array() {
        let input = r#"[{"startTime":"2021-06-01"},{"startTime":"2022-01-01""#;
        let mut buf = Vec::new();
        let result = export(
            open(input, None),
            &TimeFieldSpec::default_fields(),
            &DateRange::default(),
            &mut buf,
            None,
        )
        .unwrap();
        assert!(result.stats.truncated);
        assert_eq!(result.exported, 1);
        let reparsed: serde_json::Value = serde_json::from_str(&String::from_utf8(buf).unwrap()).unwrap();
        assert_eq!(reparsed.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_ndjson_skipped_lines_reach_stats() {
        let input = "{\"startTime\":\"2021-06-01\"}\n{corrupt\n{\"startTime\":\"2021-07-01\"}\n";
        let stats = scan(open(input, None), &TimeFieldSpec::default_fields()).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.skipped_lines, 1);
    }
}
