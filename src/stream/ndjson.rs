//! Line-delimited record source.

use std::io::BufRead;

use serde_json::Value;

use crate::error::Result;
use crate::stream::{parse_record_bytes, Record};

/// Reads one JSON object per line, skipping blanks.
///
/// A line that fails to parse is counted and skipped, never fatal: one
/// corrupt line must not abort a multi-gigabyte scan. Well-formed lines
/// holding non-objects (some NDJSON variants carry arrays or scalars) are
/// passed over without counting as failures.
pub(crate) struct LineSource<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        LineSource {
            reader,
            line: String::new(),
        }
    }

    pub fn next_record(&mut self, skipped: &mut u64) -> Result<Option<Record>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_record_bytes(trimmed.as_bytes()) {
                Ok(value @ Value::Object(_)) => {
                    return Ok(Some(Record {
                        value,
                        raw: trimmed.to_string(),
                    }))
                }
                Ok(_) => continue,
                Err(_) => *skipped += 1,
            }
        }
    }
}
