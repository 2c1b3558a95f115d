//! Pure-Rust streaming driver: owns the encoding front-end, scanner, and row
//! assembler, and implements the `push`/`flush`/`headers` lifecycle contract
//! from `spec.md` §4.4 and §6.
//!
//! Grounded on `CSVParser` in `parser.rs` (the "own your sub-components as
//! fields, drive them in a loop" shape, and its `push`/`flush` split);
//! poisoning on first error is new behavior `spec.md` §7 requires that no
//! teacher struct implements — the teacher returns a fresh `Result` on every
//! call with no persisted failure state.

use crate::assembler::{AssembledRow, RowAssembler};
use crate::config::Config;
use crate::encoding::EncodingFrontEnd;
use crate::error::ParseError;
use crate::headers::Headers;
use crate::record::{RawRecord, Record, RecordBatch};
use crate::scanner::ByteScanner;

/// The pure-Rust core described by `spec.md`: converts pushed byte chunks
/// into a stream of records. Single-threaded, non-suspending, and owned by
/// exactly one caller (`spec.md` §5).
pub struct StreamParser {
    encoding: EncodingFrontEnd,
    scanner: ByteScanner,
    assembler: RowAssembler,
    raw: bool,
    poisoned: Option<ParseError>,
    flushed: bool,
}

impl StreamParser {
    pub fn new(config: Config) -> Self {
        StreamParser {
            scanner: ByteScanner::new(&config),
            assembler: RowAssembler::new(&config),
            raw: config.raw,
            encoding: EncodingFrontEnd::new(),
            poisoned: None,
            flushed: false,
        }
    }

    /// Current installed headers, if the header row (or synthetic/literal
    /// equivalent) has been observed yet.
    pub fn headers(&self) -> Option<&Headers> {
        self.assembler.headers()
    }

    /// Push one chunk of raw input bytes, returning every record assembled
    /// during this call. Chunk boundaries are never visible in the output.
    pub fn push(&mut self, chunk: &[u8]) -> Result<RecordBatch, ParseError> {
        self.guard(|this| {
            let decoded = this.encoding.push(chunk)?;
            this.drain(&decoded, false)
        })
    }

    /// Signal end of input. Closes any open field/row; an open trailing
    /// field with no terminating newline is committed as a final row. Once
    /// `flush` has returned successfully, the parser rejects further input.
    pub fn flush(&mut self) -> Result<RecordBatch, ParseError> {
        self.guard(|this| {
            let decoded = this.encoding.finish()?;
            let batch = this.drain(&decoded, true)?;
            this.flushed = true;
            Ok(batch)
        })
    }

    /// Run `body`, poisoning the parser on its first error and rejecting any
    /// call (including this one) made after `flush()` or a prior poison.
    fn guard(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<RecordBatch, ParseError>,
    ) -> Result<RecordBatch, ParseError> {
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }
        if self.flushed {
            let err = ParseError::StreamClosed;
            self.poisoned = Some(err.clone());
            return Err(err);
        }
        match body(self) {
            Ok(batch) => Ok(batch),
            Err(err) => {
                self.poisoned = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Feed UTF-8-view bytes through the scanner and assembler, optionally
    /// closing out any trailing open row (`at_eof`).
    fn drain(&mut self, bytes: &[u8], at_eof: bool) -> Result<RecordBatch, ParseError> {
        let assembler = &mut self.assembler;
        let mut decoded: Vec<Record> = Vec::new();
        let mut raw: Vec<RawRecord> = Vec::new();
        let mut first_error: Option<ParseError> = None;

        {
            let mut on_row = |fields: Vec<Vec<u8>>, offset: u64| {
                if first_error.is_some() {
                    return;
                }
                match assembler.accept(fields, offset) {
                    Ok(AssembledRow::None) | Ok(AssembledRow::Headers) => {}
                    Ok(AssembledRow::Record(record)) => decoded.push(record),
                    Ok(AssembledRow::Raw(record)) => raw.push(record),
                    Err(err) => first_error = Some(err),
                }
            };

            self.scanner.feed(bytes, &mut on_row)?;
            if at_eof {
                self.scanner.finish(&mut on_row)?;
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        Ok(if self.raw {
            RecordBatch::Raw(raw)
        } else {
            RecordBatch::Decoded(decoded)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    fn decoded(batch: RecordBatch) -> Vec<Record> {
        match batch {
            RecordBatch::Decoded(records) => records,
            RecordBatch::Raw(_) => panic!("expected decoded batch"),
        }
    }

    #[test]
    fn basic_two_column_stream() {
        let config = ConfigBuilder::new().build().unwrap();
        let mut parser = StreamParser::new(config);
        let records = decoded(parser.push(b"a,b,c\n1,2,3\n").unwrap());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("a"), Some("1"));
        assert_eq!(records[0].get("b"), Some("2"));
        assert_eq!(records[0].get("c"), Some("3"));
    }

    #[test]
    fn headers_available_after_first_push() {
        let config = ConfigBuilder::new().build().unwrap();
        let mut parser = StreamParser::new(config);
        parser.push(b"a,b,c\n").unwrap();
        assert_eq!(parser.headers().unwrap().names(), &["a", "b", "c"]);
    }

    #[test]
    fn trailing_row_without_newline_is_committed_on_flush() {
        let config = ConfigBuilder::new().build().unwrap();
        let mut parser = StreamParser::new(config);
        parser.push(b"a,b\n1,2\n3,4").unwrap();
        let records = decoded(parser.flush().unwrap());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("a"), Some("3"));
        assert_eq!(records[0].get("b"), Some("4"));
    }

    #[test]
    fn chunk_splits_are_invisible_in_output() {
        let input = b"a,b,c\n1,2,3\n4,5,6\n";
        let config = ConfigBuilder::new().build().unwrap();

        let mut whole = StreamParser::new(config.clone());
        let mut whole_out = decoded(whole.push(input).unwrap());
        whole_out.extend(decoded(whole.flush().unwrap()));

        let mut chunked = StreamParser::new(config);
        let mut chunked_out = Vec::new();
        for byte in input {
            chunked_out.extend(decoded(chunked.push(&[*byte]).unwrap()));
        }
        chunked_out.extend(decoded(chunked.flush().unwrap()));

        assert_eq!(whole_out.len(), chunked_out.len());
        for (a, b) in whole_out.iter().zip(chunked_out.iter()) {
            assert_eq!(a.values(), b.values());
        }
    }

    #[test]
    fn poisons_after_fatal_error() {
        let config = ConfigBuilder::new().strict(true).build().unwrap();
        let mut parser = StreamParser::new(config);
        parser.push(b"a,b\n").unwrap();
        let first_err = parser.push(b"1,2,3\n").unwrap_err();
        assert!(matches!(first_err, ParseError::RowLengthMismatch { .. }));

        let second_err = parser.push(b"x,y\n").unwrap_err();
        assert_eq!(first_err, second_err);
    }

    #[test]
    fn rejects_input_after_flush() {
        let config = ConfigBuilder::new().build().unwrap();
        let mut parser = StreamParser::new(config);
        parser.push(b"a,b\n1,2\n").unwrap();
        parser.flush().unwrap();
        let err = parser.push(b"3,4\n").unwrap_err();
        assert!(matches!(err, ParseError::StreamClosed));
    }

    #[test]
    fn unterminated_quote_at_flush_is_fatal() {
        let config = ConfigBuilder::new().build().unwrap();
        let mut parser = StreamParser::new(config);
        parser.push(b"a\n\"unterminated").unwrap();
        let err = parser.flush().unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedQuote { .. }));
    }

    #[test]
    fn raw_mode_returns_raw_batches() {
        let config = ConfigBuilder::new().raw(true).build().unwrap();
        let mut parser = StreamParser::new(config);
        let batch = parser.push(b"a\n\xFF\xFE\n").unwrap();
        match batch {
            RecordBatch::Raw(records) => {
                assert_eq!(records[0].get("a"), Some(&b"\xFF\xFE"[..]));
            }
            RecordBatch::Decoded(_) => panic!("expected raw batch"),
        }
    }
}
