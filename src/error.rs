//! Error types for ACH file processing.

use thiserror::Error;

/// Result type alias for ACH operations
pub type Result<T> = std::result::Result<T, NachaError>;

/// How bad an error is, independent of its exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The input violates the record layout or nesting rules. Aborts a load.
    Structural,
    /// A single field could not be parsed. Recoverable by the caller.
    Field,
    /// A field that structural validation should have guaranteed is malformed.
    Invariant,
    /// Reading or writing failed.
    Io,
}

/// Errors that can occur while loading, editing, or writing an ACH file.
#[derive(Error, Debug)]
pub enum NachaError {
    /// Failed to read or write the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write a CSV report
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A newline was found somewhere other than right after a full record
    #[error("Invalid record length. A new-line was found at an invalid location (byte {offset}): {content:?}")]
    EmbeddedNewline { offset: u64, content: String },

    /// Data left over at end of input that is shorter than a record
    #[error("Invalid record length at end-of-file. Unprocessed data: {content:?}")]
    ShortRecord { content: String },

    /// A second file header record
    #[error("Multiple File Header Records found (record {record})")]
    MultipleFileHeader { record: usize },

    /// A batch header arrived while the previous batch was still open
    #[error("Found new batch before the close of batch {batch} (record {record})")]
    UnclosedBatch { batch: usize, record: usize },

    /// The input ended while a batch was still open
    #[error("Batch {batch} has no Batch Control Record at end-of-file")]
    UnterminatedBatch { batch: usize },

    /// An entry detail record outside of a batch
    #[error("Found Entry Detail Record before Batch Header Record (record {record})")]
    EntryBeforeBatchHeader { record: usize },

    /// An addenda record outside of a batch
    #[error("Found Entry Detail Addenda Record before Batch Header Record (record {record})")]
    AddendaBeforeBatchHeader { record: usize },

    /// An addenda record in a batch that has no entry yet
    #[error("Found Entry Detail Addenda Record before Entry Detail Record (record {record})")]
    AddendaBeforeEntry { record: usize },

    /// A batch control record outside of a batch
    #[error("Found Batch Control Record before Batch Header Record (record {record})")]
    ControlBeforeBatchHeader { record: usize },

    /// A second batch control record for the same batch
    #[error("Multiple Batch Control Records found for batch {batch} (record {record})")]
    MultipleBatchControl { batch: usize, record: usize },

    /// Leading byte is not one of 1, 5, 6, 7, 8, 9
    #[error("Invalid Nacha Record Type Code at record {record}. Record: {content:?}")]
    InvalidTypeCode { record: usize, content: String },

    /// The input contained no file header record
    #[error("No File Header Record found")]
    MissingFileHeader,

    /// The input contained no file control record
    #[error("No File Control Record found")]
    MissingFileControl,

    /// A numeric field could not be parsed
    #[error("Invalid {field} field: {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// A field that must be valid after loading was not
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// The file header creation date/time is not a valid timestamp
    #[error("Invalid file creation timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Missing input file argument
    #[error("Missing input file argument. Usage: nacha-ach <input.ach> [--out <path>] [--crlf] [--no-renumber] [--report entries|summary]")]
    MissingArgument,

    /// Unrecognized or incomplete command line option
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

impl NachaError {
    /// Classifies this error.
    pub fn severity(&self) -> Severity {
        match self {
            NachaError::Io(_) | NachaError::Csv(_) => Severity::Io,
            NachaError::InvalidField { .. }
            | NachaError::Timestamp { .. }
            | NachaError::MissingArgument
            | NachaError::InvalidOption(_) => Severity::Field,
            NachaError::Invariant(_) => Severity::Invariant,
            _ => Severity::Structural,
        }
    }

    pub(crate) fn invalid_field(field: &'static str, value: &[u8]) -> Self {
        NachaError::InvalidField {
            field,
            value: String::from_utf8_lossy(value).into_owned(),
        }
    }
}
