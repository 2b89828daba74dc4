//! Entry detail records and their addenda.

use crate::currency::parse_currency;
use crate::error::{NachaError, Result};
use crate::record::{addenda, entry_detail, Record};

/// Transaction codes that post as credits to the receiver.
const CREDIT_CODES: [&[u8]; 16] = [
    b"21", b"22", b"23", b"24", b"31", b"32", b"33", b"34", b"41", b"42", b"43", b"44", b"51",
    b"52", b"53", b"54",
];

/// Whether an entry takes part in counts, totals, and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryStatus {
    #[default]
    Active,
    /// Logically deleted. The records are kept for inspection.
    Removed,
}

/// One ACH transaction: an entry detail record plus its addenda.
///
/// # Invariants
///
/// - The first record is always the type `6` detail record
/// - Every following record is a type `7` addenda record
#[derive(Debug, Clone)]
pub struct Entry {
    records: Vec<Record>,
    status: EntryStatus,
}

impl Entry {
    /// Starts an entry from its detail record.
    pub(crate) fn new(detail: Record) -> Self {
        Entry {
            records: vec![detail],
            status: EntryStatus::Active,
        }
    }

    pub(crate) fn push_addenda(&mut self, record: Record) {
        self.records.push(record);
    }

    /// The entry detail record.
    pub fn detail(&self) -> &Record {
        &self.records[0]
    }

    /// Addenda records, in file order.
    pub fn addenda(&self) -> &[Record] {
        &self.records[1..]
    }

    /// All physical records: the detail followed by its addenda.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of physical records this entry occupies.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn is_removed(&self) -> bool {
        self.status == EntryStatus::Removed
    }

    /// Excludes this entry from counts, totals, and output.
    pub fn remove(&mut self) {
        self.status = EntryStatus::Removed;
    }

    /// Undoes [`Entry::remove`].
    pub fn restore(&mut self) {
        self.status = EntryStatus::Active;
    }

    /// Two-digit transaction code.
    pub fn transaction_code(&self) -> String {
        self.detail().field_str(entry_detail::TRANSACTION_CODE)
    }

    /// Returns `true` if the transaction code posts as a credit.
    pub fn is_credit(&self) -> bool {
        let code = self.detail().field(entry_detail::TRANSACTION_CODE);
        CREDIT_CODES.iter().any(|c| *c == code)
    }

    /// Value summed into batch and file entry hashes.
    ///
    /// The field was accepted by the loader, so a non-numeric value here is
    /// reported as [`NachaError::Invariant`] rather than a field error.
    pub fn hash(&self) -> Result<u64> {
        let field = self.detail().field(entry_detail::HASH);
        std::str::from_utf8(field)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| {
                NachaError::Invariant(format!(
                    "entry hash field is not numeric: {:?}",
                    String::from_utf8_lossy(field)
                ))
            })
    }

    /// Identification / terminal number with trailing spaces removed.
    pub fn term_id(&self) -> String {
        let id = self.detail().field_str(entry_detail::TERM_ID);
        id.trim_end_matches(' ').to_string()
    }

    /// Sequence number of the first addenda record, without leading zeros and
    /// space padding. Empty when the entry has no addenda.
    pub fn seq(&self) -> String {
        match self.addenda().first() {
            Some(record) => record
                .field_str(addenda::SEQUENCE)
                .trim_start_matches(&['0', ' '][..])
                .trim_end_matches(' ')
                .to_string(),
            None => String::new(),
        }
    }

    /// Signed posting amount in dollars.
    ///
    /// Debits are positive and credits negative.
    pub fn post_amt(&self) -> Result<f64> {
        let amount = parse_currency(self.detail().field(entry_detail::AMOUNT))?;
        let signed = if self.is_credit() { -amount } else { amount };
        Ok(signed / 100.0)
    }
}
