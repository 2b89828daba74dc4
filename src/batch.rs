//! Batches: a header, ordered entries, and a control record.

use crate::currency::{credit_cents, debit_cents};
use crate::entry::Entry;
use crate::error::Result;
use crate::record::{batch_control, batch_header, Record};
use log::debug;
use std::fmt;

/// Entry hashes keep only their last 10 digits.
pub const HASH_MODULUS: u64 = 10_000_000_000;

/// Truncates an entry hash sum to the 10 digits a control record holds.
pub fn truncate_hash(sum: u64) -> u64 {
    sum % HASH_MODULUS
}

/// Standard Entry Class code from a batch header.
///
/// Values outside the known set are carried through as [`SecCode::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecCode {
    Arc,
    Boc,
    Cbr,
    Ccd,
    Cie,
    Cor,
    Ctx,
    Dne,
    Iat,
    Mte,
    Pbr,
    Pop,
    Pos,
    Ppd,
    Rck,
    Tel,
    Web,
    Xck,
    Unknown(String),
}

impl SecCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "ARC" => SecCode::Arc,
            "BOC" => SecCode::Boc,
            "CBR" => SecCode::Cbr,
            "CCD" => SecCode::Ccd,
            "CIE" => SecCode::Cie,
            "COR" => SecCode::Cor,
            "CTX" => SecCode::Ctx,
            "DNE" => SecCode::Dne,
            "IAT" => SecCode::Iat,
            "MTE" => SecCode::Mte,
            "PBR" => SecCode::Pbr,
            "POP" => SecCode::Pop,
            "POS" => SecCode::Pos,
            "PPD" => SecCode::Ppd,
            "RCK" => SecCode::Rck,
            "TEL" => SecCode::Tel,
            "WEB" => SecCode::Web,
            "XCK" => SecCode::Xck,
            other => SecCode::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SecCode::Arc => "ARC",
            SecCode::Boc => "BOC",
            SecCode::Cbr => "CBR",
            SecCode::Ccd => "CCD",
            SecCode::Cie => "CIE",
            SecCode::Cor => "COR",
            SecCode::Ctx => "CTX",
            SecCode::Dne => "DNE",
            SecCode::Iat => "IAT",
            SecCode::Mte => "MTE",
            SecCode::Pbr => "PBR",
            SecCode::Pop => "POP",
            SecCode::Pos => "POS",
            SecCode::Ppd => "PPD",
            SecCode::Rck => "RCK",
            SecCode::Tel => "TEL",
            SecCode::Web => "WEB",
            SecCode::Xck => "XCK",
            SecCode::Unknown(code) => code,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SecCode::Unknown(_))
    }
}

impl fmt::Display for SecCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregates derived from a batch's active entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchTotals {
    /// Physical detail plus addenda records.
    pub entry_count: u64,
    pub debit_cents: u64,
    pub credit_cents: u64,
    /// Full hash sum, before truncation to 10 digits.
    pub entry_hash: u64,
}

/// A batch of entries sharing one header and one control record.
///
/// The numeric fields of the control record are only trustworthy right
/// after [`Batch::set_control_totals`]; on load they hold whatever the
/// input contained.
#[derive(Debug, Clone)]
pub struct Batch {
    header: Record,
    entries: Vec<Entry>,
    control: Record,
}

impl Batch {
    pub(crate) fn new(header: Record, entries: Vec<Entry>, control: Record) -> Self {
        Batch {
            header,
            entries,
            control,
        }
    }

    pub fn header(&self) -> &Record {
        &self.header
    }

    pub fn control(&self) -> &Record {
        &self.control
    }

    /// All entries, including removed ones, in file order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Mutable access for flagging entries as removed.
    pub fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    /// Entries that have not been removed.
    pub fn active_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| !e.is_removed())
    }

    /// Standard Entry Class code. Not validated against the known set.
    pub fn sec_code(&self) -> SecCode {
        SecCode::from_code(&self.header.field_str(batch_header::SEC_CODE))
    }

    /// Batch number as written in the header.
    pub fn number(&self) -> String {
        self.header.field_str(batch_header::BATCH_NUMBER)
    }

    /// Returns `true` if every entry has been removed. Empty batches are
    /// left out of written files.
    pub fn is_empty(&self) -> bool {
        self.active_entries().next().is_none()
    }

    /// Writes a 7-digit batch number into both header and control.
    pub fn set_number(&mut self, number: u64) {
        self.header.set_numeric(batch_header::BATCH_NUMBER, number);
        self.control.set_numeric(batch_control::BATCH_NUMBER, number);
    }

    /// Physical records (details plus addenda) of active entries.
    pub fn entry_count(&self) -> u64 {
        self.active_entries().map(|e| e.record_count() as u64).sum()
    }

    /// Debit and credit totals in cents.
    ///
    /// Each entry's signed dollar amount is rounded half-up on its magnitude
    /// before truncating to cents, separately for the debit and credit legs.
    pub fn debit_credit_totals(&self) -> Result<(u64, u64)> {
        let mut debit = 0u64;
        let mut credit = 0u64;
        for entry in self.active_entries() {
            let amount = entry.post_amt()?;
            if amount < 0.0 {
                credit += credit_cents(amount);
            } else {
                debit += debit_cents(amount);
            }
        }
        Ok((debit, credit))
    }

    /// Sum of active entry hashes, not yet truncated.
    pub fn hash_sum(&self) -> Result<u64> {
        let mut sum = 0u64;
        for entry in self.active_entries() {
            sum = sum.wrapping_add(entry.hash()?);
        }
        Ok(sum)
    }

    /// Recomputes every derived control value from the entries.
    pub fn totals(&self) -> Result<BatchTotals> {
        let (debit_cents, credit_cents) = self.debit_credit_totals()?;
        Ok(BatchTotals {
            entry_count: self.entry_count(),
            debit_cents,
            credit_cents,
            entry_hash: self.hash_sum()?,
        })
    }

    /// Rewrites the count, hash, and amount fields of the control record.
    pub fn set_control_totals(&mut self) -> Result<()> {
        let totals = self.totals()?;
        self.control
            .set_numeric(batch_control::ENTRY_COUNT, totals.entry_count);
        self.control
            .set_numeric(batch_control::DEBIT_TOTAL, totals.debit_cents);
        self.control
            .set_numeric(batch_control::CREDIT_TOTAL, totals.credit_cents);
        self.control.set_numeric(
            batch_control::ENTRY_HASH,
            truncate_hash(totals.entry_hash),
        );
        debug!(
            "Batch {}: {} records, debits {} cents, credits {} cents",
            self.number(),
            totals.entry_count,
            totals.debit_cents,
            totals.credit_cents
        );
        Ok(())
    }
}
