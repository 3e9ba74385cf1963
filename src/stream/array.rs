//! Incremental framing of array elements.
//!
//! Captures one object at a time out of a JSON array by tracking brace depth
//! and string/escape state, so the enclosing array is never materialized.
//! The same framer serves both the top-level-array layout and the array
//! found under a configured key inside a top-level object.

use std::io::BufRead;

use crate::error::{Error, Result};
use crate::stream::cursor::{seek_into_keyed_array, ByteCursor};
use crate::stream::{parse_record_bytes, Record};

pub(crate) struct ArrayFramer<R> {
    cur: ByteCursor<R>,
    buf: Vec<u8>,
    closed: bool,
}

impl<R: BufRead> ArrayFramer<R> {
    /// Position the framer just inside a top-level array.
    pub fn top_level(reader: R) -> Result<Self> {
        let mut cur = ByteCursor::new(reader);
        match cur.next_non_ws()? {
            Some(b'[') => Ok(Self::at_array_start(cur)),
            Some(b) => Err(Error::Parse {
                offset: cur.offset().saturating_sub(1),
                reason: format!("expected '[' at start of input, found {:?}", b as char),
            }),
            None => Err(Error::Parse {
                offset: 0,
                reason: "expected '[' at start of input".to_string(),
            }),
        }
    }

    /// Position the framer just inside the array stored under `key`.
    /// Sibling keys before it are skipped bytewise, not parsed.
    pub fn keyed(reader: R, key: &str) -> Result<Self> {
        let mut cur = ByteCursor::new(reader);
        seek_into_keyed_array(&mut cur, key)?;
        Ok(Self::at_array_start(cur))
    }

    fn at_array_start(cur: ByteCursor<R>) -> Self {
        ArrayFramer {
            cur,
            buf: Vec::new(),
            closed: false,
        }
    }

    /// Next object element, or `None` once the closing `]` has been seen.
    /// Non-object elements are consumed and passed over.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            let b = match self.cur.next_non_ws()? {
                Some(b) => b,
                None => {
                    return Err(Error::TruncatedInput {
                        offset: self.cur.offset(),
                    })
                }
            };
            match b {
                b',' => continue,
                b']' => {
                    self.closed = true;
                    return Ok(None);
                }
                b'{' => return self.capture_object().map(Some),
                b'[' => self.skip_balanced(b'[', b']')?,
                b'"' => self.skip_string()?,
                _ => self.skip_scalar()?,
            }
        }
    }

    /// Capture one balanced object starting after its opening brace.
    fn capture_object(&mut self) -> Result<Record> {
        let start = self.cur.offset().saturating_sub(1);
        self.buf.clear();
        self.buf.push(b'{');

        let mut depth = 1u32;
        let mut in_str = false;
        let mut esc = false;
        while depth > 0 {
            let b = match self.cur.next()? {
                Some(b) => b,
                None => {
                    return Err(Error::TruncatedInput {
                        offset: self.cur.offset(),
                    })
                }
            };
            self.buf.push(b);
            if in_str {
                if esc {
                    esc = false;
                } else if b == b'\\' {
                    esc = true;
                } else if b == b'"' {
                    in_str = false;
                }
                continue;
            }
            match b {
                b'"' => in_str = true,
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
        }

        let raw = std::str::from_utf8(&self.buf)
            .map_err(|_| Error::Parse {
                offset: start,
                reason: "record is not valid UTF-8".to_string(),
            })?
            .to_string();
        let value = parse_record_bytes(&self.buf).map_err(|err| Error::Parse {
            offset: start,
            reason: err.to_string(),
        })?;
        Ok(Record { value, raw })
    }

    /// Consume a balanced `open`..`close` region, string-aware. The opening
    /// byte has already been consumed.
    fn skip_balanced(&mut self, open: u8, close: u8) -> Result<()> {
        let mut depth = 1u32;
        let mut in_str = false;
        let mut esc = false;
        while depth > 0 {
            let b = match self.cur.next()? {
                Some(b) => b,
                None => {
                    return Err(Error::TruncatedInput {
                        offset: self.cur.offset(),
                    })
                }
            };
            if in_str {
                if esc {
                    esc = false;
                } else if b == b'\\' {
                    esc = true;
                } else if b == b'"' {
                    in_str = false;
                }
                continue;
            }
            if b == b'"' {
                in_str = true;
            } else if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
            }
        }
        Ok(())
    }

    /// Consume the rest of a string element whose opening quote has been
    /// consumed.
    fn skip_string(&mut self) -> Result<()> {
        let mut esc = false;
        loop {
            let b = match self.cur.next()? {
                Some(b) => b,
                None => {
                    return Err(Error::TruncatedInput {
                        offset: self.cur.offset(),
                    })
                }
            };
            if esc {
                esc = false;
            } else if b == b'\\' {
                esc = true;
            } else if b == b'"' {
                return Ok(());
            }
        }
    }

    /// Consume a bare scalar token (number, true, false, null), stopping
    /// before the delimiter that follows it.
    fn skip_scalar(&mut self) -> Result<()> {
        loop {
            match self.cur.peek()? {
                None | Some(b',') | Some(b']') => return Ok(()),
                Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => return Ok(()),
                Some(_) => {
                    self.cur.next()?;
                }
            }
        }
    }
}
