//! Streaming record sources.
//!
//! A [`RecordStream`] turns an open export file into a lazy, forward-only
//! sequence of records. Memory stays proportional to a single record: NDJSON
//! is read line by line, and array layouts go through an incremental byte
//! framer that captures one object at a time.
//!
//! The stream is single-pass. Restarting means reopening the source from
//! byte zero; no component unreads into a shared buffer.

pub(crate) mod cursor;

mod array;
mod ndjson;

use std::io::BufRead;

use serde_json::Value;

use crate::error::Result;
use crate::shape::Shape;

use array::ArrayFramer;
use ndjson::LineSource;

/// One record pulled from the input: the parsed value plus the original
/// input text, carried so export mode can reproduce the on-disk
/// representation byte for byte.
#[derive(Debug, Clone)]
pub struct Record {
    /// Parsed record object.
    pub value: Value,
    /// The record's exact text as it appeared in the input.
    pub raw: String,
}

/// Lazy sequence of records over a buffered reader.
///
/// Yields `Err` at most once, as the final item: either a fatal structural
/// failure or a truncation notice (see [`crate::Error::is_truncation`]).
pub struct RecordStream<R: BufRead> {
    source: Source<R>,
    skipped: u64,
    finished: bool,
}

enum Source<R: BufRead> {
    Lines(LineSource<R>),
    Array(ArrayFramer<R>),
}

impl<R: BufRead> RecordStream<R> {
    /// Open a stream over `reader`, which must be positioned at byte zero.
    ///
    /// For the array layouts this consumes the envelope up to the first
    /// element, so a malformed envelope fails here rather than mid-iteration.
    pub fn open(reader: R, shape: &Shape) -> Result<Self> {
        let source = match shape {
            Shape::Ndjson => Source::Lines(LineSource::new(reader)),
            Shape::TopLevelArray => Source::Array(ArrayFramer::top_level(reader)?),
            Shape::KeyedArray(key) => Source::Array(ArrayFramer::keyed(reader, key)?),
        };
        Ok(RecordStream {
            source,
            skipped: 0,
            finished: false,
        })
    }

    /// Number of NDJSON lines that failed to parse and were skipped.
    /// Always zero for the array layouts.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let step = match &mut self.source {
            Source::Lines(lines) => lines.next_record(&mut self.skipped),
            Source::Array(framer) => framer.next_record(),
        };
        match step {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Parse one record's bytes on a scratch copy, leaving the original text
/// untouched for export.
pub(crate) fn parse_record_bytes(bytes: &[u8]) -> std::result::Result<Value, simd_json::Error> {
    let mut scratch = bytes.to_vec();
    simd_json::serde::from_slice(&mut scratch)
}
