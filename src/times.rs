//! Timestamp extraction and normalization.
//!
//! Records carry timestamps in a handful of ISO-8601-ish textual forms
//! (`2021-12-19T06:00:00.000Z`, `2010-06-18T17:37:31.100-04:00`, bare
//! dates). Every extracted value is normalized to UTC for comparison; the
//! record's own text is never touched.
//!
//! A timezone-less value is assumed to already be UTC. That is a documented
//! assumption: interpreting it in the local zone instead would change
//! filtering results and is deliberately not done without explicit
//! configuration.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap()
});

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Which fields of a record are treated as timestamps. Configured once at
/// startup, read-only thereafter.
#[derive(Debug, Clone)]
pub enum TimeFieldSpec {
    /// Look only at the named top-level fields, in declaration order.
    Fields(Vec<String>),
    /// Try every string leaf, depth-first. Explicitly opt-in: most string
    /// fields are not timestamps, and the caller accepts the mis-parse risk.
    ScanAll,
}

impl TimeFieldSpec {
    /// Spec over an explicit field list.
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TimeFieldSpec::Fields(names.into_iter().map(Into::into).collect())
    }

    /// The conventional start/end fields of a location-history record.
    pub fn default_fields() -> Self {
        TimeFieldSpec::fields(["startTime", "endTime"])
    }
}

/// Parse one timestamp, normalized to UTC.
///
/// Accepted forms: `YYYY-MM-DD` (midnight UTC), `YYYY-MM-DDTHH:MM:SS` with
/// optional fractional seconds and an optional `Z` or `±HH:MM` offset.
/// Anything else returns `None`.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if ISO_DATE_REGEX.is_match(s) {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    // Cheap gate before chrono: rejects version strings, coordinates, and
    // other numeric-looking values without a parse attempt.
    if !ISO_DATETIME_REGEX.is_match(s) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // No offset: naive, assumed UTC.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Pull every parseable timestamp out of a record under the given spec.
///
/// Values that fail to parse are skipped, not fatal. Order follows field
/// declaration (explicit mode) or depth-first traversal (scan-all mode);
/// it matters only for reporting, since range filtering is existential.
pub fn extract_times(record: &Value, spec: &TimeFieldSpec) -> Vec<DateTime<Utc>> {
    let mut out = Vec::new();
    match spec {
        TimeFieldSpec::Fields(names) => {
            if let Value::Object(map) = record {
                for name in names {
                    if let Some(Value::String(s)) = map.get(name) {
                        if let Some(t) = parse_timestamp(s) {
                            out.push(t);
                        }
                    }
                }
            }
        }
        TimeFieldSpec::ScanAll => collect_string_leaves(record, &mut out),
    }
    out
}

fn collect_string_leaves(value: &Value, out: &mut Vec<DateTime<Utc>>) {
    match value {
        Value::String(s) => {
            if let Some(t) = parse_timestamp(s) {
                out.push(t);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_string_leaves(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_string_leaves(item, out);
            }
        }
        _ => {}
    }
}
