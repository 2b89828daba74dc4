//! CSV reports over a loaded file.

use crate::currency::{cents_to_dollars, credit_cents, debit_cents};
use crate::error::Result;
use crate::file::NachaFile;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// One row per entry, removed entries included.
#[derive(Debug, Serialize)]
pub struct EntryRow {
    pub batch: String,
    pub sec_code: String,
    pub transaction_code: String,
    /// Signed dollars: debits positive, credits negative.
    pub amount: Decimal,
    pub term_id: String,
    pub seq: String,
    pub addenda: usize,
    pub removed: bool,
}

/// File-level control values.
#[derive(Debug, Serialize)]
pub struct SummaryRow {
    pub name: String,
    pub created: Option<String>,
    pub file_id_modifier: String,
    pub batches: u64,
    pub blocks: u64,
    pub entries: u64,
    pub entry_hash: String,
    pub debit_total: Decimal,
    pub credit_total: Decimal,
}

/// Writes every entry of every batch as CSV.
pub fn write_entry_report<W: Write>(file: &NachaFile, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for batch in file.batches() {
        let sec_code = batch.sec_code();
        for entry in batch.entries() {
            let signed = entry.post_amt()?;
            let amount = if signed < 0.0 {
                -cents_to_dollars(credit_cents(signed))
            } else {
                cents_to_dollars(debit_cents(signed))
            };
            csv_writer.serialize(EntryRow {
                batch: batch.number(),
                sec_code: sec_code.to_string(),
                transaction_code: entry.transaction_code(),
                amount,
                term_id: entry.term_id(),
                seq: entry.seq(),
                addenda: entry.addenda().len(),
                removed: entry.is_removed(),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes a one-row CSV summary of the recomputed file totals.
pub fn write_summary<W: Write>(file: &NachaFile, writer: W) -> Result<()> {
    let totals = file.totals()?;
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.serialize(SummaryRow {
        name: file.name().to_string(),
        created: file
            .file_creation_timestamp()
            .ok()
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string()),
        file_id_modifier: file.file_id_modifier(),
        batches: totals.batch_count,
        blocks: totals.block_count,
        entries: totals.entry_count,
        entry_hash: format!("{:010}", totals.entry_hash),
        debit_total: cents_to_dollars(totals.debit_cents),
        credit_total: cents_to_dollars(totals.credit_cents),
    })?;

    csv_writer.flush()?;
    Ok(())
}
