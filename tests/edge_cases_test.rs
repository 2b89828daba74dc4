//! Edge case tests for loading, recomputing, and writing ACH files.
//!
//! Inputs are assembled record by record so every byte offset is explicit.

use nacha_ach::{NachaError, NachaFile, Record, Severity, RECORD_LEN};
use std::io::Cursor;

// Re-implement the record builders since unit test helpers are private
fn record(code: u8, fields: &[(usize, &str)]) -> Vec<u8> {
    let mut bytes = vec![b' '; RECORD_LEN];
    bytes[0] = code;
    for (offset, value) in fields {
        bytes[*offset..*offset + value.len()].copy_from_slice(value.as_bytes());
    }
    bytes
}

fn file_header() -> Vec<u8> {
    record(b'1', &[(1, "01"), (23, "261019"), (29, "1430"), (33, "A"), (34, "094101")])
}

fn batch_header(sec: &str, number: &str) -> Vec<u8> {
    record(b'5', &[(1, "200"), (50, sec), (87, number)])
}

fn detail(code: &str, hash: &str, amount: &str, id: &str) -> Vec<u8> {
    record(b'6', &[(1, code), (3, hash), (11, "9"), (29, amount), (39, id)])
}

fn addenda(seq: &str) -> Vec<u8> {
    record(b'7', &[(1, "05"), (14, seq)])
}

fn stale_batch_control(number: &str) -> Vec<u8> {
    record(b'8', &[(1, "200"), (4, "000000"), (87, number)])
}

fn stale_file_control() -> Vec<u8> {
    record(b'9', &[(1, "000000000000000000000000000000")])
}

fn filler() -> Vec<u8> {
    Record::FILLER.as_bytes().to_vec()
}

fn load(bytes: Vec<u8>) -> Result<NachaFile, NachaError> {
    NachaFile::from_reader(Cursor::new(bytes), "edge.ach")
}

fn write(file: &mut NachaFile) -> Vec<u8> {
    let mut out = Vec::new();
    file.write(&mut out).unwrap();
    out
}

fn records_of(bytes: &[u8]) -> Vec<&[u8]> {
    bytes.chunks(RECORD_LEN).collect()
}

/// One PPD batch: a $100.00 debit and a $50.00 credit with one addenda.
fn simple_file() -> Vec<u8> {
    [
        file_header(),
        batch_header("PPD", "0000001"),
        detail("27", "12345678", "0000010000", "PAYEE-ONE"),
        detail("22", "87654321", "0000005000", "PAYEE-TWO"),
        addenda("00000000001"),
        stale_batch_control("0000001"),
        stale_file_control(),
        filler(),
        filler(),
        filler(),
    ]
    .concat()
}

// ==================== POSTING AMOUNTS ====================

#[test]
fn test_credit_code_22_posts_negative() {
    let bytes = [
        file_header(),
        batch_header("PPD", "0000001"),
        detail("22", "12345678", "0000012345", "X"),
        stale_batch_control("0000001"),
        stale_file_control(),
    ]
    .concat();

    let file = load(bytes).unwrap();
    let batch = &file.batches()[0];
    assert_eq!(batch.entries()[0].post_amt().unwrap(), -123.45);
    assert_eq!(batch.debit_credit_totals().unwrap(), (0, 12345));
}

#[test]
fn test_debit_and_credit_control_totals() {
    let mut file = load(simple_file()).unwrap();
    let out = write(&mut file);
    let control = records_of(&out)[5];

    assert_eq!(&control[20..32], b"000000010000");
    assert_eq!(&control[32..44], b"000000005000");
}

#[test]
fn test_zero_amount_entry_counts_as_debit() {
    let bytes = [
        file_header(),
        batch_header("CCD", "0000001"),
        detail("27", "00000001", "0000000000", ""),
        stale_batch_control("0000001"),
        stale_file_control(),
    ]
    .concat();

    let file = load(bytes).unwrap();
    assert_eq!(file.batches()[0].debit_credit_totals().unwrap(), (0, 0));
    assert_eq!(file.entry_count().unwrap(), 1);
}

#[test]
fn test_amount_field_with_commas() {
    let bytes = [
        file_header(),
        batch_header("CCD", "0000001"),
        detail("27", "00000001", "  1,234,56", ""),
        stale_batch_control("0000001"),
        stale_file_control(),
    ]
    .concat();

    let file = load(bytes).unwrap();
    assert_eq!(file.debit_total().unwrap().to_string(), "1234.56");
}

// ==================== TOTALS ====================

#[test]
fn test_entry_count_counts_addenda_and_skips_removed() {
    let mut file = load(simple_file()).unwrap();
    assert_eq!(file.batches()[0].entry_count(), 3);

    file.batches_mut()[0].entries_mut()[0].remove();
    assert_eq!(file.batches()[0].entry_count(), 2);
    assert_eq!(file.entry_count().unwrap(), 2);
    assert_eq!(file.debit_total().unwrap().to_string(), "0.00");
    assert_eq!(file.entry_hash().unwrap(), "0087654321");
}

#[test]
fn test_file_totals_equal_sum_of_batches() {
    let bytes = [
        file_header(),
        batch_header("PPD", "0000001"),
        detail("27", "11111111", "0000000150", ""),
        detail("32", "22222222", "0000000275", ""),
        stale_batch_control("0000001"),
        batch_header("CCD", "0000002"),
        detail("37", "33333333", "0000100000", ""),
        addenda("00000000001"),
        addenda("00000000002"),
        detail("42", "44444444", "0000000001", ""),
        stale_batch_control("0000002"),
        stale_file_control(),
    ]
    .concat();

    let file = load(bytes).unwrap();
    let mut debit = 0;
    let mut credit = 0;
    let mut hash = 0;
    for batch in file.batches() {
        let (d, c) = batch.debit_credit_totals().unwrap();
        debit += d;
        credit += c;
        hash += batch.hash_sum().unwrap();
    }

    let totals = file.totals().unwrap();
    assert_eq!(totals.debit_cents, debit);
    assert_eq!(totals.credit_cents, credit);
    assert_eq!(totals.entry_hash, hash % 10_000_000_000);
    assert_eq!(totals.debit_cents, 100_150);
    assert_eq!(totals.credit_cents, 276);
    assert_eq!(totals.batch_count, 2);
    assert_eq!(totals.entry_count, 6);
}

#[test]
fn test_file_entry_hash_truncates_to_ten_digits() {
    let mut records = vec![file_header(), batch_header("PPD", "0000001")];
    for _ in 0..120 {
        records.push(detail("27", "99999999", "0000000001", ""));
    }
    records.push(stale_batch_control("0000001"));
    records.push(stale_file_control());

    let mut file = load(records.concat()).unwrap();
    // 120 * 99_999_999 = 11_999_999_880
    assert_eq!(file.entry_hash().unwrap(), "1999999880");

    let out = write(&mut file);
    let recs = records_of(&out);
    assert_eq!(&recs[122][10..20], b"1999999880");
    assert_eq!(&recs[123][21..31], b"1999999880");
}

#[test]
fn test_recomputation_is_idempotent() {
    let mut file = load(simple_file()).unwrap();
    file.set_control_totals().unwrap();
    let first = file.control_records()[0].clone();
    file.set_control_totals().unwrap();
    assert_eq!(file.control_records()[0], first);

    let once = write(&mut file);
    let twice = write(&mut file);
    assert_eq!(once, twice);
}

#[test]
fn test_accessors_track_mutation() {
    let mut file = load(simple_file()).unwrap();
    assert_eq!(file.credit_total().unwrap().to_string(), "50.00");

    file.batches_mut()[0].entries_mut()[1].remove();
    assert_eq!(file.credit_total().unwrap().to_string(), "0.00");

    file.batches_mut()[0].entries_mut()[1].restore();
    assert_eq!(file.credit_total().unwrap().to_string(), "50.00");
}

// ==================== WRITE PIPELINE ====================

#[test]
fn test_round_trip_of_consistent_file() {
    let bytes = [
        file_header(),
        batch_header("PPD", "0000007"),
        detail("27", "12345678", "0000010000", "PAYEE-ONE"),
        detail("22", "87654321", "0000005000", "PAYEE-TWO"),
        addenda("00000000001"),
        record(
            b'8',
            &[
                (1, "200"),
                (4, "000003"),
                (10, "0099999999"),
                (20, "000000010000"),
                (32, "000000005000"),
                (87, "0000007"),
            ],
        ),
        record(
            b'9',
            &[
                (1, "000001"),
                (7, "000001"),
                (13, "00000003"),
                (21, "0099999999"),
                (31, "000000010000"),
                (43, "000000005000"),
            ],
        ),
        filler(),
        filler(),
        filler(),
    ];
    let input: Vec<u8> = bytes
        .iter()
        .flat_map(|r| r.iter().copied().chain(b"\r\n".iter().copied()))
        .collect();

    let mut file = load(input.clone()).unwrap();
    file.disable_batch_renumber();
    file.enable_crlf();
    assert_eq!(write(&mut file), input);
}

#[test]
fn test_renumbering_skips_empty_batches() {
    let bytes = [
        file_header(),
        batch_header("PPD", "0000004"),
        detail("27", "11111111", "0000000100", ""),
        stale_batch_control("0000004"),
        batch_header("PPD", "0000005"),
        detail("27", "22222222", "0000000100", ""),
        stale_batch_control("0000005"),
        batch_header("PPD", "0000006"),
        detail("27", "33333333", "0000000100", ""),
        stale_batch_control("0000006"),
        stale_file_control(),
    ]
    .concat();

    let mut file = load(bytes).unwrap();
    file.batches_mut()[1].entries_mut()[0].remove();
    let out = write(&mut file);
    let recs = records_of(&out);

    // header, (5,6,8) x 2, 9, then 2 filler
    assert_eq!(recs.len(), 10);
    assert_eq!(&recs[1][87..94], b"0000001");
    assert_eq!(&recs[3][87..94], b"0000001");
    assert_eq!(&recs[4][87..94], b"0000002");
    assert_eq!(&recs[6][87..94], b"0000002");
    assert_eq!(&recs[5][3..11], b"33333333");
    assert_eq!(&recs[7][1..7], b"000002");
}

#[test]
fn test_exact_block_boundary_gets_full_filler_block() {
    // 1 header + 1 batch header + 6 entries + 1 batch control + 1 file control
    let mut records = vec![file_header(), batch_header("PPD", "0000001")];
    for _ in 0..6 {
        records.push(detail("27", "00000001", "0000000100", ""));
    }
    records.push(stale_batch_control("0000001"));
    records.push(stale_file_control());

    let mut file = load(records.concat()).unwrap();
    assert_eq!(file.block_count().unwrap(), 1);

    let out = write(&mut file);
    let recs = records_of(&out);
    assert_eq!(recs.len(), 20);
    assert!(recs[10..].iter().all(|r| r.iter().all(|&b| b == b'9')));
    assert_eq!(&recs[9][7..13], b"000001");
}

#[test]
fn test_block_count_rounds_up() {
    let mut records = vec![file_header(), batch_header("PPD", "0000001")];
    for _ in 0..7 {
        records.push(detail("27", "00000001", "0000000100", ""));
    }
    records.push(stale_batch_control("0000001"));
    records.push(stale_file_control());

    let mut file = load(records.concat()).unwrap();
    assert_eq!(file.block_count().unwrap(), 2);
    assert_eq!(records_of(&write(&mut file)).len(), 20);
}

#[test]
fn test_all_batches_removed() {
    let mut file = load(simple_file()).unwrap();
    for entry in file.batches_mut()[0].entries_mut() {
        entry.remove();
    }
    let out = write(&mut file);
    let recs = records_of(&out);
    assert_eq!(recs.len(), 10);
    assert_eq!(recs[0][0], b'1');
    assert_eq!(&recs[1][..13], b"9000000000001");
}

#[test]
fn test_malformed_hash_fails_write_as_invariant() {
    let bytes = [
        file_header(),
        batch_header("PPD", "0000001"),
        detail("27", "1234ABCD", "0000000100", ""),
        stale_batch_control("0000001"),
        stale_file_control(),
    ]
    .concat();

    let mut file = load(bytes).unwrap();
    let err = file.write(Vec::new()).unwrap_err();
    assert_eq!(err.severity(), Severity::Invariant);
}

#[test]
fn test_malformed_amount_fails_write_as_field_error() {
    let bytes = [
        file_header(),
        batch_header("PPD", "0000001"),
        detail("27", "12345678", "00000ABC00", ""),
        stale_batch_control("0000001"),
        stale_file_control(),
    ]
    .concat();

    let mut file = load(bytes).unwrap();
    let err = file.write(Vec::new()).unwrap_err();
    assert_eq!(err.severity(), Severity::Field);
    assert!(matches!(err, NachaError::InvalidField { field: "amount", .. }));
}

#[test]
fn test_extra_file_control_records_are_kept() {
    let mut bytes = simple_file();
    let extra = record(b'9', &[(1, "EXTRA")]);
    let at = 7 * RECORD_LEN;
    bytes.splice(at..at, extra.clone());

    let mut file = load(bytes).unwrap();
    assert_eq!(file.control_records().len(), 2);
    assert_eq!(file.block_count().unwrap(), 1);

    let out = write(&mut file);
    let recs = records_of(&out);
    assert_eq!(recs[7], extra.as_slice());
    assert_eq!(recs.len(), 10);
}

// ==================== STRUCTURAL ERRORS ====================

#[test]
fn test_entry_before_batch_header() {
    let bytes = [
        file_header(),
        detail("27", "12345678", "0000000100", ""),
        stale_file_control(),
    ]
    .concat();

    let err = load(bytes).unwrap_err();
    assert!(matches!(err, NachaError::EntryBeforeBatchHeader { record: 2 }));
    assert_eq!(err.severity(), Severity::Structural);
    assert!(err.to_string().contains("before Batch Header"));
}

#[test]
fn test_entry_after_batch_control() {
    let bytes = [
        file_header(),
        batch_header("PPD", "0000001"),
        detail("27", "12345678", "0000000100", ""),
        stale_batch_control("0000001"),
        detail("27", "12345678", "0000000100", ""),
        stale_file_control(),
    ]
    .concat();

    let err = load(bytes).unwrap_err();
    assert!(matches!(err, NachaError::EntryBeforeBatchHeader { record: 5 }));
}

#[test]
fn test_multiple_file_headers() {
    let bytes = [file_header(), file_header(), stale_file_control()].concat();
    let err = load(bytes).unwrap_err();
    assert!(matches!(err, NachaError::MultipleFileHeader { record: 2 }));
}

#[test]
fn test_new_batch_before_close() {
    let bytes = [
        file_header(),
        batch_header("PPD", "0000001"),
        detail("27", "12345678", "0000000100", ""),
        batch_header("PPD", "0000002"),
    ]
    .concat();

    let err = load(bytes).unwrap_err();
    assert!(matches!(err, NachaError::UnclosedBatch { batch: 1, record: 4 }));
}

#[test]
fn test_addenda_errors() {
    let bytes = [file_header(), addenda("00000000001")].concat();
    let err = load(bytes).unwrap_err();
    assert!(matches!(err, NachaError::AddendaBeforeBatchHeader { record: 2 }));

    let bytes = [
        file_header(),
        batch_header("PPD", "0000001"),
        addenda("00000000001"),
    ]
    .concat();
    let err = load(bytes).unwrap_err();
    assert!(matches!(err, NachaError::AddendaBeforeEntry { record: 3 }));
}

#[test]
fn test_batch_control_errors() {
    let bytes = [file_header(), stale_batch_control("0000001")].concat();
    let err = load(bytes).unwrap_err();
    assert!(matches!(err, NachaError::ControlBeforeBatchHeader { record: 2 }));

    let bytes = [
        file_header(),
        batch_header("PPD", "0000001"),
        stale_batch_control("0000001"),
        stale_batch_control("0000001"),
    ]
    .concat();
    let err = load(bytes).unwrap_err();
    assert!(matches!(err, NachaError::MultipleBatchControl { batch: 1, record: 4 }));
}

#[test]
fn test_invalid_record_type_code() {
    let bytes = [file_header(), record(b'X', &[])].concat();
    let err = load(bytes).unwrap_err();
    match err {
        NachaError::InvalidTypeCode { record, content } => {
            assert_eq!(record, 2);
            assert!(content.starts_with('X'));
        }
        other => panic!("Expected InvalidTypeCode, got {:?}", other),
    }
}

// ==================== RECORD SPLITTING ====================

#[test]
fn test_trailing_blank_line_is_tolerated() {
    let mut input: Vec<u8> = Vec::new();
    for rec in records_of(&simple_file()) {
        input.extend_from_slice(rec);
        input.push(b'\n');
    }
    input.push(b'\n');

    let file = load(input).unwrap();
    assert_eq!(file.batches().len(), 1);
    assert_eq!(file.entry_count().unwrap(), 3);
}

#[test]
fn test_sub_marker_at_end_of_file() {
    let mut input = simple_file();
    input.push(0x1a);
    assert!(load(input).is_ok());
}

#[test]
fn test_misplaced_newline() {
    let mut input = simple_file();
    input.insert(50, b'\n');
    let err = load(input).unwrap_err();
    assert!(matches!(err, NachaError::EmbeddedNewline { offset: 50, .. }));
    assert_eq!(err.severity(), Severity::Structural);
}

#[test]
fn test_short_trailing_record() {
    let mut input = simple_file();
    input.extend_from_slice(b"9999");
    let err = load(input).unwrap_err();
    assert!(matches!(err, NachaError::ShortRecord { .. }));
}

#[test]
fn test_empty_input() {
    let err = load(Vec::new()).unwrap_err();
    assert!(matches!(err, NachaError::MissingFileHeader));
}
