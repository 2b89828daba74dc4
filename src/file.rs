//! ACH files: loading, control totals, and writing.
//!
//! Loading is a single sequential pass over the records produced by
//! [`RecordReader`], classifying each by its type code. Writing always
//! recomputes every batch and file control total from the active entries
//! first, so edits made through removal flags are reflected in the output.

use crate::batch::{truncate_hash, Batch};
use crate::currency::cents_to_dollars;
use crate::entry::Entry;
use crate::error::{NachaError, Result};
use crate::record::{file_control, file_header, Record, RecordType};
use crate::splitter::RecordReader;
use chrono::NaiveDateTime;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

const CRLF: &[u8] = b"\r\n";

/// Records per block. Written files are padded to a multiple of this.
pub const BLOCKING_FACTOR: usize = 10;

/// Output settings for [`NachaFile::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Terminate every record, filler included, with `\r\n`.
    pub crlf: bool,
    /// Renumber non-empty batches 1, 2, 3, ... before writing.
    pub renumber: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            crlf: false,
            renumber: true,
        }
    }
}

/// File-level control values derived from the batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileTotals {
    /// Non-empty batches.
    pub batch_count: u64,
    pub block_count: u64,
    /// Physical detail plus addenda records of active entries.
    pub entry_count: u64,
    /// Entry hash truncated to 10 digits.
    pub entry_hash: u64,
    pub debit_cents: u64,
    pub credit_cents: u64,
}

/// A parsed ACH file.
///
/// # Invariants
///
/// - Exactly one file header and at least one file control record
/// - Every batch has both a header and a control record
/// - File control totals are never cached: every accessor and every write
///   recomputes them from the active entries
#[derive(Debug, Clone)]
pub struct NachaFile {
    name: String,
    header: Record,
    batches: Vec<Batch>,
    control: Vec<Record>,
    options: WriteOptions,
}

/// A batch whose control record has not been seen yet.
struct OpenBatch {
    header: Record,
    entries: Vec<Entry>,
}

/// Load state machine.
#[derive(Default)]
struct Loader {
    header: Option<Record>,
    batches: Vec<Batch>,
    control: Vec<Record>,
    open: Option<OpenBatch>,
    previous: Option<RecordType>,
    fillers: usize,
}

impl Loader {
    /// Number of the batch currently open, or of the next one to open.
    fn batch_number(&self) -> usize {
        self.batches.len() + 1
    }

    fn accept(&mut self, record: Record, position: usize) -> Result<()> {
        let record_type = match record.record_type() {
            Some(t) => t,
            None => {
                return Err(NachaError::InvalidTypeCode {
                    record: position,
                    content: String::from_utf8_lossy(record.as_bytes()).into_owned(),
                })
            }
        };

        match record_type {
            RecordType::FileHeader => {
                if self.header.is_some() {
                    return Err(NachaError::MultipleFileHeader { record: position });
                }
                self.header = Some(record);
            }
            RecordType::BatchHeader => {
                if self.open.is_some() {
                    return Err(NachaError::UnclosedBatch {
                        batch: self.batch_number(),
                        record: position,
                    });
                }
                debug!("Record {}: opened batch {}", position, self.batch_number());
                self.open = Some(OpenBatch {
                    header: record,
                    entries: Vec::new(),
                });
            }
            RecordType::EntryDetail => {
                let open = self
                    .open
                    .as_mut()
                    .ok_or(NachaError::EntryBeforeBatchHeader { record: position })?;
                open.entries.push(Entry::new(record));
            }
            RecordType::Addenda => {
                let open = self
                    .open
                    .as_mut()
                    .ok_or(NachaError::AddendaBeforeBatchHeader { record: position })?;
                let entry = open
                    .entries
                    .last_mut()
                    .ok_or(NachaError::AddendaBeforeEntry { record: position })?;
                entry.push_addenda(record);
            }
            RecordType::BatchControl => match self.open.take() {
                Some(open) => {
                    let batch = Batch::new(open.header, open.entries, record);
                    if !batch.sec_code().is_known() {
                        warn!(
                            "Record {}: batch {} has unrecognized SEC code {:?}",
                            position,
                            self.batch_number(),
                            batch.sec_code().as_str()
                        );
                    }
                    debug!(
                        "Record {}: closed batch {} with {} entries",
                        position,
                        self.batch_number(),
                        batch.entries().len()
                    );
                    self.batches.push(batch);
                }
                None if self.previous == Some(RecordType::BatchControl) => {
                    return Err(NachaError::MultipleBatchControl {
                        batch: self.batches.len(),
                        record: position,
                    });
                }
                None => {
                    return Err(NachaError::ControlBeforeBatchHeader { record: position });
                }
            },
            RecordType::FileControl => {
                if record.is_filler() {
                    self.fillers += 1;
                } else {
                    self.control.push(record);
                }
            }
        }
        self.previous = Some(record_type);
        Ok(())
    }

    fn finish(self, name: String) -> Result<NachaFile> {
        if self.open.is_some() {
            return Err(NachaError::UnterminatedBatch {
                batch: self.batch_number(),
            });
        }
        let header = self.header.ok_or(NachaError::MissingFileHeader)?;
        if self.control.is_empty() {
            return Err(NachaError::MissingFileControl);
        }
        debug!(
            "Loaded {}: {} batches, {} filler records skipped",
            name,
            self.batches.len(),
            self.fillers
        );
        Ok(NachaFile {
            name,
            header,
            batches: self.batches,
            control: self.control,
            options: WriteOptions::default(),
        })
    }
}

impl NachaFile {
    /// Loads an ACH file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        Self::from_reader(file, path.display().to_string())
    }

    /// Loads an ACH file from any byte stream.
    ///
    /// Any structural error aborts the load; nothing partial is returned.
    pub fn from_reader<R: Read>(reader: R, name: impl Into<String>) -> Result<Self> {
        let mut loader = Loader::default();
        for (idx, record) in RecordReader::new(reader).enumerate() {
            loader.accept(record?, idx + 1)?;
        }
        loader.finish(name.into())
    }

    /// Name the file was loaded under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &Record {
        &self.header
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn batches_mut(&mut self) -> &mut [Batch] {
        &mut self.batches
    }

    /// File control records, filler excluded.
    pub fn control_records(&self) -> &[Record] {
        &self.control
    }

    pub fn options(&self) -> WriteOptions {
        self.options
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn enable_crlf(&mut self) {
        self.options.crlf = true;
    }

    pub fn disable_crlf(&mut self) {
        self.options.crlf = false;
    }

    pub fn enable_batch_renumber(&mut self) {
        self.options.renumber = true;
    }

    pub fn disable_batch_renumber(&mut self) {
        self.options.renumber = false;
    }

    /// Recomputes the file-level control values from the batches.
    pub fn totals(&self) -> Result<FileTotals> {
        let mut totals = FileTotals::default();
        let mut hash = 0u64;
        for batch in &self.batches {
            let count = batch.entry_count();
            if count == 0 {
                continue;
            }
            let (debit, credit) = batch.debit_credit_totals()?;
            totals.batch_count += 1;
            totals.entry_count += count;
            totals.debit_cents += debit;
            totals.credit_cents += credit;
            hash = hash.wrapping_add(batch.hash_sum()?);
        }
        let records = 1 + totals.batch_count * 2 + totals.entry_count + self.control.len() as u64;
        totals.block_count = records.div_ceil(BLOCKING_FACTOR as u64);
        totals.entry_hash = truncate_hash(hash);
        Ok(totals)
    }

    /// Rewrites the totals in the first file control record.
    pub fn set_control_totals(&mut self) -> Result<()> {
        let totals = self.totals()?;
        let control = self
            .control
            .first_mut()
            .ok_or(NachaError::MissingFileControl)?;
        control.set_numeric(file_control::BATCH_COUNT, totals.batch_count);
        control.set_numeric(file_control::BLOCK_COUNT, totals.block_count);
        control.set_numeric(file_control::ENTRY_COUNT, totals.entry_count);
        control.set_numeric(file_control::ENTRY_HASH, totals.entry_hash);
        control.set_numeric(file_control::DEBIT_TOTAL, totals.debit_cents);
        control.set_numeric(file_control::CREDIT_TOTAL, totals.credit_cents);
        Ok(())
    }

    pub fn batch_count(&self) -> Result<u64> {
        Ok(self.totals()?.batch_count)
    }

    pub fn entry_count(&self) -> Result<u64> {
        Ok(self.totals()?.entry_count)
    }

    pub fn block_count(&self) -> Result<u64> {
        Ok(self.totals()?.block_count)
    }

    /// Entry hash as the 10 digits written to the control record.
    pub fn entry_hash(&self) -> Result<String> {
        Ok(format!("{:010}", self.totals()?.entry_hash))
    }

    /// Total debits in dollars.
    pub fn debit_total(&self) -> Result<Decimal> {
        Ok(cents_to_dollars(self.totals()?.debit_cents))
    }

    /// Total credits in dollars.
    pub fn credit_total(&self) -> Result<Decimal> {
        Ok(cents_to_dollars(self.totals()?.credit_cents))
    }

    pub fn file_id_modifier(&self) -> String {
        self.header.field_str(file_header::FILE_ID_MODIFIER)
    }

    /// Creation date, `YYMMDD`.
    pub fn file_creation_date(&self) -> String {
        self.header.field_str(file_header::CREATION_DATE)
    }

    /// Creation time, `HHMM`.
    pub fn file_creation_time(&self) -> String {
        self.header.field_str(file_header::CREATION_TIME)
    }

    /// Creation date and time from the file header.
    pub fn file_creation_timestamp(&self) -> Result<NaiveDateTime> {
        let value = format!(
            "{} {}",
            self.file_creation_date(),
            self.file_creation_time()
        );
        NaiveDateTime::parse_from_str(&value, "%y%m%d %H%M")
            .map_err(|source| NachaError::Timestamp { value, source })
    }

    /// Renumbers batches if enabled and refreshes every control record.
    fn prepare(&mut self) -> Result<()> {
        if self.options.renumber {
            let mut number = 0;
            for batch in self.batches.iter_mut().filter(|b| !b.is_empty()) {
                number += 1;
                batch.set_number(number);
            }
            debug!("Renumbered {} batches", number);
        }
        for batch in self.batches.iter_mut().filter(|b| !b.is_empty()) {
            batch.set_control_totals()?;
        }
        self.set_control_totals()
    }

    /// Serializes the file, recomputing all control totals first.
    ///
    /// Empty batches and removed entries are skipped. The output is padded
    /// with all-nines filler records to a multiple of [`BLOCKING_FACTOR`];
    /// a file that already ends on a block boundary gets a full filler
    /// block. Buffered output is flushed even when a write fails.
    pub fn write<W: Write>(&mut self, writer: W) -> Result<()> {
        self.prepare()?;
        let mut out = BufWriter::new(writer);
        let result = self.emit(&mut out);
        let flushed = out.flush();
        result?;
        flushed?;
        Ok(())
    }

    /// Writes the file to `path`, replacing any existing file.
    pub fn write_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = fs::File::create(path)?;
        self.write(file)
    }

    fn emit<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut records = 0usize;

        self.put(out, &self.header)?;
        records += 1;

        for batch in self.batches.iter().filter(|b| !b.is_empty()) {
            self.put(out, batch.header())?;
            records += 1;
            for entry in batch.active_entries() {
                for record in entry.records() {
                    self.put(out, record)?;
                    records += 1;
                }
            }
            self.put(out, batch.control())?;
            records += 1;
        }

        for control in &self.control {
            self.put(out, control)?;
            records += 1;
        }

        let filler = BLOCKING_FACTOR - records % BLOCKING_FACTOR;
        for _ in 0..filler {
            self.put(out, &Record::FILLER)?;
        }
        debug!(
            "Wrote {}: {} records, {} filler",
            self.name, records, filler
        );
        Ok(())
    }

    fn put<W: Write>(&self, out: &mut W, record: &Record) -> Result<()> {
        out.write_all(record.as_bytes())?;
        if self.options.crlf {
            out.write_all(CRLF)?;
        }
        Ok(())
    }
}
