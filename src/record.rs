//! Fixed-width 94-byte ACH records and their field layouts.
//!
//! Every semantic field is a fixed, half-open byte range inside a record.
//! The ranges live in the per-kind layout modules below so business logic
//! never slices records with bare numbers.

use std::fmt;
use std::ops::Range;

/// Length of every physical ACH record.
pub const RECORD_LEN: usize = 94;

/// File header record layout (type `1`).
pub mod file_header {
    use std::ops::Range;

    /// Creation date, `YYMMDD`.
    pub const CREATION_DATE: Range<usize> = 23..29;
    /// Creation time, `HHMM`.
    pub const CREATION_TIME: Range<usize> = 29..33;
    /// File ID modifier, one upper-case letter or digit.
    pub const FILE_ID_MODIFIER: Range<usize> = 33..34;
}

/// Batch header record layout (type `5`).
pub mod batch_header {
    use std::ops::Range;

    /// Standard Entry Class code.
    pub const SEC_CODE: Range<usize> = 50..53;
    /// Batch number, 7 digits.
    pub const BATCH_NUMBER: Range<usize> = 87..94;
}

/// Batch control record layout (type `8`).
pub mod batch_control {
    use std::ops::Range;

    /// Entry/addenda count, 6 digits.
    pub const ENTRY_COUNT: Range<usize> = 4..10;
    /// Entry hash, 10 digits.
    pub const ENTRY_HASH: Range<usize> = 10..20;
    /// Total debit amount in cents, 12 digits.
    pub const DEBIT_TOTAL: Range<usize> = 20..32;
    /// Total credit amount in cents, 12 digits.
    pub const CREDIT_TOTAL: Range<usize> = 32..44;
    /// Batch number, 7 digits. Mirrors the header.
    pub const BATCH_NUMBER: Range<usize> = 87..94;
}

/// Entry detail record layout (type `6`).
pub mod entry_detail {
    use std::ops::Range;

    pub const TRANSACTION_CODE: Range<usize> = 1..3;
    /// Receiving DFI identification, summed into entry hashes.
    pub const HASH: Range<usize> = 3..11;
    /// Amount in cents, 10 digits.
    pub const AMOUNT: Range<usize> = 29..39;
    /// Identification / terminal number, space padded.
    pub const TERM_ID: Range<usize> = 39..54;
}

/// Addenda record layout (type `7`).
pub mod addenda {
    use std::ops::Range;

    pub const SEQUENCE: Range<usize> = 14..25;
}

/// File control record layout (type `9`).
pub mod file_control {
    use std::ops::Range;

    pub const BATCH_COUNT: Range<usize> = 1..7;
    pub const BLOCK_COUNT: Range<usize> = 7..13;
    pub const ENTRY_COUNT: Range<usize> = 13..21;
    pub const ENTRY_HASH: Range<usize> = 21..31;
    pub const DEBIT_TOTAL: Range<usize> = 31..43;
    pub const CREDIT_TOTAL: Range<usize> = 43..55;
}

/// Record type code, the first byte of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    FileHeader,
    BatchHeader,
    EntryDetail,
    Addenda,
    BatchControl,
    FileControl,
}

impl RecordType {
    /// Maps a leading byte to its record type.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'1' => Some(RecordType::FileHeader),
            b'5' => Some(RecordType::BatchHeader),
            b'6' => Some(RecordType::EntryDetail),
            b'7' => Some(RecordType::Addenda),
            b'8' => Some(RecordType::BatchControl),
            b'9' => Some(RecordType::FileControl),
            _ => None,
        }
    }
}

/// One physical ACH record: exactly [`RECORD_LEN`] ASCII bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Record([u8; RECORD_LEN]);

impl Record {
    /// The all-nines record used to pad a file to a block boundary.
    pub const FILLER: Record = Record([b'9'; RECORD_LEN]);

    pub fn new(bytes: [u8; RECORD_LEN]) -> Self {
        Record(bytes)
    }

    /// Builds a record from a slice that must be exactly [`RECORD_LEN`] bytes.
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let bytes: [u8; RECORD_LEN] = data.try_into().ok()?;
        Some(Record(bytes))
    }

    /// Leading type code byte.
    pub fn type_code(&self) -> u8 {
        self.0[0]
    }

    pub fn record_type(&self) -> Option<RecordType> {
        RecordType::from_code(self.type_code())
    }

    /// Returns `true` for block padding: every byte is the digit `9`.
    pub fn is_filler(&self) -> bool {
        self.0.iter().all(|&b| b == b'9')
    }

    /// Raw bytes of a field.
    pub fn field(&self, range: Range<usize>) -> &[u8] {
        &self.0[range]
    }

    /// Field as text, lossily decoded.
    pub fn field_str(&self, range: Range<usize>) -> String {
        String::from_utf8_lossy(&self.0[range]).into_owned()
    }

    /// Writes `value` zero-padded to the width of `range`.
    ///
    /// When the value has more digits than the field, only the rightmost
    /// digits are kept.
    pub fn set_numeric(&mut self, range: Range<usize>, value: u64) {
        let width = range.len();
        let digits = format!("{:0width$}", value, width = width);
        let digits = &digits.as_bytes()[digits.len() - width..];
        self.0[range].copy_from_slice(digits);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
