//! Input shape detection.
//!
//! Location-history exports arrive in one of three top-level layouts:
//! newline-delimited objects, a single top-level array, or an object holding
//! the record array under a named key. The shape is detected once from a
//! bounded prefix of the stream, and the stream is rewound to byte zero so
//! the record stream re-parses from the start.

use std::io::{BufRead, Seek, SeekFrom};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::stream::cursor::{seek_into_keyed_array, ByteCursor};

/// Top-level layout of an export file. Detected once per run and final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// One JSON object per line.
    Ndjson,
    /// A single top-level array of record objects.
    TopLevelArray,
    /// A top-level object with the record array stored under the named key.
    KeyedArray(String),
}

impl Shape {
    /// Classify the input, then rewind it to byte zero.
    ///
    /// `records_key` names the array inside a top-level object; it is
    /// required for that layout and ignored for the other two. Ambiguous or
    /// unclassifiable input fails with [`Error::Shape`] before any record
    /// is processed.
    pub fn detect<R: BufRead + Seek>(reader: &mut R, records_key: Option<&str>) -> Result<Shape> {
        let shape = classify(&mut *reader, records_key);
        reader.seek(SeekFrom::Start(0))?;
        shape
    }
}

fn classify<R: BufRead>(reader: R, records_key: Option<&str>) -> Result<Shape> {
    let mut cur = ByteCursor::new(reader);
    let first = match cur.next_non_ws()? {
        Some(b) => b,
        None => {
            return Err(Error::Shape {
                reason: "input is empty".to_string(),
            })
        }
    };

    match first {
        b'[' => Ok(Shape::TopLevelArray),
        b'{' => match records_key {
            Some(key) => {
                // Validate up front that the key exists and holds an array,
                // so a bad key fails before any body processing.
                seek_into_keyed_array(&mut cur, key)?;
                Ok(Shape::KeyedArray(key.to_string()))
            }
            None => probe_first_line(&mut cur, first),
        },
        _ => probe_first_line(&mut cur, first),
    }
}

/// NDJSON files also start with `{`, so a top-level object is only
/// distinguishable by whether the first non-empty line is a complete JSON
/// value on its own. A lone object with nothing after it is treated as a
/// container rather than one-record NDJSON, since that is what a compact
/// keyed export looks like.
fn probe_first_line<R: BufRead>(cur: &mut ByteCursor<R>, first: u8) -> Result<Shape> {
    let mut line = vec![first];
    while let Some(b) = cur.next()? {
        if b == b'\n' {
            break;
        }
        line.push(b);
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }

    match serde_json::from_slice::<Value>(&line) {
        Ok(Value::Object(_)) => {
            if cur.next_non_ws()?.is_none() {
                return Err(Error::Shape {
                    reason: "input is a single top-level object; if it holds \
                             the record array, re-run with --records-key"
                        .to_string(),
                });
            }
            Ok(Shape::Ndjson)
        }
        Ok(_) => Ok(Shape::Ndjson),
        Err(_) => {
            let reason = if first == b'{' {
                "file starts with '{' but is not line-delimited; if the export \
                 is a single object holding the record array, re-run with \
                 --records-key"
                    .to_string()
            } else {
                "expected newline-delimited records, a top-level array, or an \
                 object with --records-key"
                    .to_string()
            };
            Err(Error::Shape { reason })
        }
    }
}
