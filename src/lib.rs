//! # Tracksift - Location-History Subsetting Toolkit
//!
//! Stream-scans very large location-history JSON exports (Google Takeout
//! style) to report the timestamp range they cover, or to export the subset
//! of records falling inside a date window, without ever loading the whole
//! file into memory.
//!
//! ## Modules
//!
//! - **shape**: detect the input's top-level layout (NDJSON, array, keyed)
//! - **stream**: lazy record iteration in bounded memory
//! - **times**: timestamp extraction and UTC normalization
//! - **filter**: range scanning and incremental subset export
//!
//! ## Quick Start
//!
//! ```rust
//! use std::io::Cursor;
//! use tracksift::{RecordStream, Shape, TimeFieldSpec};
//!
//! # fn main() -> tracksift::Result<()> {
//! let data = r#"[{"startTime": "2021-06-01T00:00:00Z"}, {"note": "no time"}]"#;
//! let mut input = Cursor::new(data);
//!
//! let shape = Shape::detect(&mut input, None)?;
//! let stream = RecordStream::open(input, &shape)?;
//! let stats = tracksift::scan(stream, &TimeFieldSpec::default_fields())?;
//!
//! assert_eq!(stats.total, 2);
//! assert_eq!(stats.earliest, stats.latest);
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub mod error;
pub mod filter;
pub mod shape;
pub mod stream;
pub mod times;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use filter::{export, scan, DateRange, ExportResult, ScanStats, SubsetWriter};
pub use shape::Shape;
pub use stream::{Record, RecordStream};
pub use times::{extract_times, parse_timestamp, TimeFieldSpec};

/// Open a file, detect its shape, and return a record stream over it.
///
/// Shape detection reads a bounded prefix and rewinds, so the stream starts
/// from byte zero. A `records_key` is required when the file is a single
/// object holding the record array.
pub fn open_records<P: AsRef<Path>>(
    path: P,
    records_key: Option<&str>,
) -> Result<RecordStream<BufReader<File>>> {
    let mut reader = BufReader::new(File::open(path)?);
    let shape = Shape::detect(&mut reader, records_key)?;
    RecordStream::open(reader, &shape)
}
