//! End-to-end coverage for the concrete scenarios `spec.md` §8 names
//! verbatim, driven through `StreamParser` rather than any single
//! sub-component in isolation.

use crate::config::ConfigBuilder;
use crate::driver::StreamParser;
use crate::error::ParseError;
use crate::record::{Record, RecordBatch};

fn decoded(batch: RecordBatch) -> Vec<Record> {
    match batch {
        RecordBatch::Decoded(records) => records,
        RecordBatch::Raw(_) => panic!("expected decoded batch"),
    }
}

/// Scenario 6: BOM `FE FF` followed by `a,b,c\n1,2,3\n4,5,ʤ\n` encoded as
/// UTF-16 BE. Expect two records; the second's `c` equals `"ʤ"`.
#[test]
fn utf16_be_with_unicode_end_to_end() {
    let (encoded, _, _) = encoding_rs::UTF_16BE.encode("a,b,c\n1,2,3\n4,5,\u{02A4}\n");
    let mut input = vec![0xFE, 0xFF];
    input.extend_from_slice(&encoded);

    let config = ConfigBuilder::new().build().unwrap();
    let mut parser = StreamParser::new(config);
    let mut records = decoded(parser.push(&input).unwrap());
    records.extend(decoded(parser.flush().unwrap()));

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("a"), Some("1"));
    assert_eq!(records[1].get("a"), Some("4"));
    assert_eq!(records[1].get("b"), Some("5"));
    assert_eq!(records[1].get("c"), Some("\u{02A4}"));
}

/// Scenario 5: `maxRowBytes=190` over a ~700 KB input with one row exceeding
/// 190 bytes. Expect more than 1000 records emitted before `RowTooLarge`.
#[test]
fn max_row_bytes_survives_many_rows_before_failing() {
    let config = ConfigBuilder::new().max_row_bytes(190).build().unwrap();
    let mut parser = StreamParser::new(config);

    let mut records = decoded(parser.push(b"a,b,c\n").unwrap());

    // Small rows, individually well under the 190-byte limit, padded out to
    // roughly 700 KB total before the oversized row lands.
    let small_row = "1,2,this is a short field that stays under the limit\n";
    let small_rows_needed = (700 * 1024) / small_row.len();
    assert!(small_rows_needed > 1000);

    let mut early_error = None;
    for _ in 0..small_rows_needed {
        match parser.push(small_row.as_bytes()) {
            Ok(batch) => records.extend(decoded(batch)),
            Err(err) => {
                early_error = Some(err);
                break;
            }
        }
    }

    assert!(
        records.len() > 1000,
        "expected more than 1000 records before the oversized row, got {}",
        records.len()
    );

    let err = match early_error {
        Some(err) => err,
        None => {
            let oversized_field = "x".repeat(200);
            let oversized_row = format!("1,2,{oversized_field}\n");
            parser.push(oversized_row.as_bytes()).unwrap_err()
        }
    };
    assert!(matches!(err, ParseError::RowTooLarge { .. }));
}
