//! Byte-level scanning over a buffered reader, shared by shape detection
//! and array framing.

use std::io::BufRead;

use crate::error::{Error, Result};

/// A forward-only byte reader that tracks its absolute offset.
pub(crate) struct ByteCursor<R> {
    reader: R,
    offset: u64,
}

impl<R: BufRead> ByteCursor<R> {
    pub fn new(reader: R) -> Self {
        ByteCursor { reader, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Next byte, or `None` at end of stream.
    pub fn next(&mut self) -> Result<Option<u8>> {
        let buf = self.reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        let b = buf[0];
        self.reader.consume(1);
        self.offset += 1;
        Ok(Some(b))
    }

    /// Next byte without consuming it.
    pub fn peek(&mut self) -> Result<Option<u8>> {
        let buf = self.reader.fill_buf()?;
        Ok(buf.first().copied())
    }

    /// Next byte that is not JSON whitespace.
    pub fn next_non_ws(&mut self) -> Result<Option<u8>> {
        while let Some(b) = self.next()? {
            if !matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                return Ok(Some(b));
            }
        }
        Ok(None)
    }

    /// Consume bytes until `needle` has been read in full. Returns `false`
    /// if the stream ends first.
    pub fn seek_needle(&mut self, needle: &[u8]) -> Result<bool> {
        let mut matched = 0;
        while let Some(b) = self.next()? {
            if b == needle[matched] {
                matched += 1;
                if matched == needle.len() {
                    return Ok(true);
                }
            } else {
                matched = usize::from(b == needle[0]);
            }
        }
        Ok(false)
    }
}

/// Advance the cursor to just past the `[` that opens the array stored
/// under `key` in a top-level object. Occurrences of the quoted key that are
/// not followed by a colon (e.g. inside a string value) are passed over.
pub(crate) fn seek_into_keyed_array<R: BufRead>(
    cur: &mut ByteCursor<R>,
    key: &str,
) -> Result<()> {
    let needle = format!("\"{key}\"").into_bytes();
    loop {
        if !cur.seek_needle(&needle)? {
            return Err(Error::Shape {
                reason: format!("key \"{key}\" not found in top-level object"),
            });
        }
        match cur.next_non_ws()? {
            Some(b':') => {}
            Some(_) => continue,
            None => {
                return Err(Error::Shape {
                    reason: format!("key \"{key}\" not found in top-level object"),
                })
            }
        }
        return match cur.next_non_ws()? {
            Some(b'[') => Ok(()),
            _ => Err(Error::Shape {
                reason: format!("value under \"{key}\" is not an array"),
            }),
        };
    }
}
