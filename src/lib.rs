//! # NACHA ACH
//!
//! Loads, edits, and re-serializes NACHA ACH payment files: fixed-width
//! 94-byte records arranged as a file header, batches of entries with
//! optional addenda, batch and file control records, and all-nines filler
//! up to a 10-record block boundary.
//!
//! ## Design Principles
//!
//! - **Strict structure**: record nesting and ordering errors abort a load
//! - **Derived control totals**: counts, hashes, and debit/credit totals are
//!   recomputed from the active entries on every accessor call and write
//! - **Logical deletes**: removed entries stay in place but are excluded
//!   from totals and output; batches with no active entries are dropped
//! - **Streaming input**: records are split lazily from any `Read`
//!
//! ## Example
//!
//! ```no_run
//! use nacha_ach::NachaFile;
//!
//! let mut file = NachaFile::open("payroll.ach").unwrap();
//! file.batches_mut()[0].entries_mut()[0].remove();
//! file.write(std::io::stdout()).unwrap();
//! ```

pub mod batch;
pub mod currency;
pub mod entry;
pub mod error;
pub mod file;
pub mod record;
pub mod report;
pub mod splitter;

pub use batch::{Batch, BatchTotals, SecCode};
pub use entry::{Entry, EntryStatus};
pub use error::{NachaError, Result, Severity};
pub use file::{FileTotals, NachaFile, WriteOptions};
pub use record::{Record, RecordType, RECORD_LEN};
pub use splitter::RecordReader;
