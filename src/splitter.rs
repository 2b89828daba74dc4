//! Streaming record splitter.
//!
//! Carves a byte stream into [`RECORD_LEN`]-byte records. Records may be
//! terminated by `\r\n` or `\n`, or simply concatenated with no separator.
//! A newline anywhere other than directly after a full record is an error,
//! as is a short record at end of input. A single SUB (`\x1a`) byte at end
//! of input and a trailing blank line are ignored.

use crate::error::{NachaError, Result};
use crate::record::{Record, RECORD_LEN};
use std::io::{ErrorKind, Read};

const CHUNK_SIZE: usize = 8 * 1024;

/// Longest prefix that may hold a record plus its terminator.
const TERMINATED_LEN: usize = RECORD_LEN + 2;

/// Outcome of one attempt to cut a record off the front of the buffer.
enum Step {
    Emit { record: Record, advance: usize },
    NeedMore,
    Done,
    Fail(NachaError),
}

/// Lazy iterator over the records of a stream.
///
/// The iterator is single-pass: after the first error or after the end of
/// input it only yields `None`.
pub struct RecordReader<R> {
    reader: R,
    buf: Vec<u8>,
    /// Stream offset of `buf[0]`.
    offset: u64,
    eof: bool,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        RecordReader {
            reader,
            buf: Vec::with_capacity(CHUNK_SIZE),
            offset: 0,
            eof: false,
            done: false,
        }
    }

    fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn split(&self) -> Step {
        let data = self.buf.as_slice();
        if self.eof && drop_sub(data).is_empty() {
            return Step::Done;
        }

        let window = &data[..data.len().min(TERMINATED_LEN)];
        if let Some(i) = window.iter().position(|&b| b == b'\n') {
            let line = drop_cr(&data[..i]);
            if line.len() == RECORD_LEN {
                return Step::Emit {
                    record: take_record(data),
                    advance: i + 1,
                };
            }
            if line.is_empty() && data.len() == i + 1 {
                // Blank line, only acceptable as the very last thing.
                return if self.eof { Step::Done } else { Step::NeedMore };
            }
            return Step::Fail(NachaError::EmbeddedNewline {
                offset: self.offset + i as u64,
                content: String::from_utf8_lossy(&data[..=i]).into_owned(),
            });
        }

        if data.len() >= TERMINATED_LEN || (self.eof && data.len() >= RECORD_LEN) {
            return Step::Emit {
                record: take_record(data),
                advance: RECORD_LEN,
            };
        }

        if self.eof {
            return Step::Fail(NachaError::ShortRecord {
                content: String::from_utf8_lossy(data).into_owned(),
            });
        }
        Step::NeedMore
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.split() {
                Step::Emit { record, advance } => {
                    self.buf.drain(..advance);
                    self.offset += advance as u64;
                    return Some(Ok(record));
                }
                Step::NeedMore => {
                    if let Err(e) = self.fill() {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
                Step::Done => {
                    self.done = true;
                    return None;
                }
                Step::Fail(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn take_record(data: &[u8]) -> Record {
    let mut bytes = [0u8; RECORD_LEN];
    bytes.copy_from_slice(&data[..RECORD_LEN]);
    Record::new(bytes)
}

/// Drops a terminal `\r`.
fn drop_cr(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\r").unwrap_or(data)
}

/// Drops a terminal `\x1a`, often used to mark end of file.
fn drop_sub(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\x1a").unwrap_or(data)
}
