//! Byte-level field/row scanner.
//!
//! Grounded on `parser_optimized.rs`'s `OptimizedParserState`/`ByteClassMap`/
//! `DfaTable`/`scan_and_copy_dfa`: a small state machine drives transitions
//! one byte at a time, with a `memchr`-based bulk-copy fast path for runs of
//! bytes that don't matter to the state machine (normal bytes inside an
//! unquoted field, or body bytes inside a quoted field). Generalized from the
//! teacher's fixed `{','/'"'}` pair to the configurable separator/quote/
//! escape/comment bytes this crate's `Config` exposes, and extended with
//! `EscapePending`/`AfterCr`/`Comment` states for chunk-boundary safety and
//! comment-line support (see `DESIGN.md`).

use crate::config::Config;
use crate::error::ParseError;

const CR: u8 = 0x0D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScannerState {
    StartOfField,
    InUnquotedField,
    InQuotedField,
    /// Just saw the quote byte while `InQuotedField`; the next byte decides
    /// whether this was a closing quote, a doubled (escaped) quote, a row
    /// boundary, or (leniently) junk trailing a closing quote.
    AfterClosingQuote,
    /// Just saw the (distinct) escape byte while `InQuotedField`; the next
    /// byte decides whether this was `escape quote` (a literal quote) or an
    /// escape byte that should itself be taken literally.
    EscapePending,
    /// Just saw a bare `\r`; the next byte decides whether this was a
    /// `\r\n` pair (closes the row) or a stray `\r` to be discarded, with
    /// the byte that follows reprocessed in the state that existed before
    /// the `\r`.
    AfterCr,
    /// Discarding bytes of a comment line (only entered at the start of an
    /// otherwise-empty row, when comments are enabled).
    Comment,
}

/// Streaming byte-level scanner: consumes UTF-8-view bytes, emits complete
/// rows (`Vec<Vec<u8>>`, one entry per field) via callback as soon as a row
/// boundary is recognized.
pub struct ByteScanner {
    separator: u8,
    quote: Option<u8>,
    escape: u8,
    newline: u8,
    comment: Option<u8>,
    max_row_bytes: u64,
    max_field_count: usize,
    lenient_unterminated_quote: bool,

    state: ScannerState,
    pre_cr_state: ScannerState,
    field_buf: Vec<u8>,
    row_fields: Vec<Vec<u8>>,
    row_bytes: u64,
    total_offset: u64,
}

impl ByteScanner {
    pub fn new(config: &Config) -> Self {
        ByteScanner {
            separator: config.separator,
            quote: config.quote,
            escape: config.escape,
            newline: config.newline,
            comment: config.comment,
            max_row_bytes: config.max_row_bytes,
            max_field_count: config.max_field_count,
            lenient_unterminated_quote: config.lenient_unterminated_quote,
            state: ScannerState::StartOfField,
            pre_cr_state: ScannerState::StartOfField,
            field_buf: Vec::new(),
            row_fields: Vec::new(),
            row_bytes: 0,
            total_offset: 0,
        }
    }

    fn escape_distinct(&self) -> bool {
        match self.quote {
            Some(q) => q != self.escape,
            None => false,
        }
    }

    fn is_row_empty(&self) -> bool {
        self.row_fields.is_empty() && self.field_buf.is_empty()
    }

    fn account_bytes(&mut self, n: usize) -> Result<(), ParseError> {
        self.total_offset += n as u64;
        self.row_bytes += n as u64;
        if self.row_bytes > self.max_row_bytes {
            return Err(ParseError::RowTooLarge {
                offset: self.total_offset,
                limit: self.max_row_bytes,
            });
        }
        Ok(())
    }

    fn close_field(&mut self) -> Result<(), ParseError> {
        let field = std::mem::take(&mut self.field_buf);
        self.row_fields.push(field);
        if self.row_fields.len() > self.max_field_count {
            return Err(ParseError::TooManyFields {
                offset: self.total_offset,
                limit: self.max_field_count,
            });
        }
        Ok(())
    }

    fn close_row(&mut self, on_row: &mut impl FnMut(Vec<Vec<u8>>, u64)) {
        let row = std::mem::take(&mut self.row_fields);
        self.row_bytes = 0;
        let offset = self.total_offset;
        on_row(row, offset);
    }

    /// Feed a chunk of UTF-8-view bytes, invoking `on_row` once per complete
    /// row recognized, along with the input byte offset at which the row's
    /// terminating newline (or end of input) was seen. Safe to call with
    /// arbitrarily small or large slices; internal state carries across
    /// calls.
    pub fn feed(
        &mut self,
        bytes: &[u8],
        mut on_row: impl FnMut(Vec<Vec<u8>>, u64),
    ) -> Result<(), ParseError> {
        let mut i = 0;
        while i < bytes.len() {
            match self.state {
                ScannerState::InUnquotedField => {
                    let rest = &bytes[i..];
                    match memchr::memchr3(self.separator, self.newline, CR, rest) {
                        Some(0) => {}
                        Some(pos) => {
                            self.field_buf.extend_from_slice(&rest[..pos]);
                            self.account_bytes(pos)?;
                            i += pos;
                            continue;
                        }
                        None => {
                            self.field_buf.extend_from_slice(rest);
                            self.account_bytes(rest.len())?;
                            i = bytes.len();
                            continue;
                        }
                    }
                }
                ScannerState::InQuotedField => {
                    let rest = &bytes[i..];
                    let pos = match self.quote {
                        Some(q) if self.escape_distinct() => memchr::memchr2(q, self.escape, rest),
                        Some(q) => memchr::memchr(q, rest),
                        None => None,
                    };
                    match pos {
                        Some(0) => {}
                        Some(p) => {
                            self.field_buf.extend_from_slice(&rest[..p]);
                            self.account_bytes(p)?;
                            i += p;
                            continue;
                        }
                        None => {
                            self.field_buf.extend_from_slice(rest);
                            self.account_bytes(rest.len())?;
                            i = bytes.len();
                            continue;
                        }
                    }
                }
                ScannerState::Comment => {
                    let rest = &bytes[i..];
                    match memchr::memchr(self.newline, rest) {
                        Some(p) => {
                            self.total_offset += (p + 1) as u64;
                            i += p + 1;
                            self.state = ScannerState::StartOfField;
                            continue;
                        }
                        None => {
                            self.total_offset += rest.len() as u64;
                            i = bytes.len();
                            continue;
                        }
                    }
                }
                _ => {}
            }

            let byte = bytes[i];
            self.account_bytes(1)?;
            i += 1;
            self.dispatch(byte, &mut on_row)?;
        }
        Ok(())
    }

    /// Signal end of input. Closes any pending field/row, or reports
    /// `UnterminatedQuote` if the stream ended inside a quoted field (unless
    /// `lenient_unterminated_quote` is set).
    pub fn finish(&mut self, mut on_row: impl FnMut(Vec<Vec<u8>>, u64)) -> Result<(), ParseError> {
        match self.state {
            ScannerState::InQuotedField | ScannerState::EscapePending => {
                if self.lenient_unterminated_quote {
                    self.close_field()?;
                    self.close_row(&mut on_row);
                    Ok(())
                } else {
                    Err(ParseError::UnterminatedQuote {
                        offset: self.total_offset,
                    })
                }
            }
            ScannerState::AfterCr => {
                self.state = self.pre_cr_state;
                self.finish(on_row)
            }
            ScannerState::Comment => Ok(()),
            _ => {
                if !self.row_fields.is_empty() || !self.field_buf.is_empty() {
                    self.close_field()?;
                    self.close_row(&mut on_row);
                }
                Ok(())
            }
        }
    }

    fn dispatch(
        &mut self,
        byte: u8,
        on_row: &mut impl FnMut(Vec<Vec<u8>>, u64),
    ) -> Result<(), ParseError> {
        let mut current = byte;
        loop {
            match self.step(current, on_row)? {
                Some(next) => current = next,
                None => return Ok(()),
            }
        }
    }

    /// Process a single byte. Returns `Ok(Some(byte))` when the same byte
    /// must be reprocessed immediately under a different state (the
    /// `AfterCr`/`EscapePending` fallback cases).
    fn step(
        &mut self,
        byte: u8,
        on_row: &mut impl FnMut(Vec<Vec<u8>>, u64),
    ) -> Result<Option<u8>, ParseError> {
        match self.state {
            ScannerState::StartOfField => {
                if let Some(q) = self.quote {
                    if byte == q {
                        self.state = ScannerState::InQuotedField;
                        return Ok(None);
                    }
                }
                if byte == self.separator {
                    self.close_field()?;
                    return Ok(None);
                }
                if byte == CR {
                    self.pre_cr_state = ScannerState::StartOfField;
                    self.state = ScannerState::AfterCr;
                    return Ok(None);
                }
                if byte == self.newline {
                    self.close_field()?;
                    self.close_row(on_row);
                    return Ok(None);
                }
                if let Some(c) = self.comment {
                    if byte == c && self.is_row_empty() {
                        self.state = ScannerState::Comment;
                        return Ok(None);
                    }
                }
                self.field_buf.push(byte);
                self.state = ScannerState::InUnquotedField;
                Ok(None)
            }

            ScannerState::InUnquotedField => {
                if byte == self.separator {
                    self.close_field()?;
                    self.state = ScannerState::StartOfField;
                    return Ok(None);
                }
                if byte == CR {
                    self.pre_cr_state = ScannerState::InUnquotedField;
                    self.state = ScannerState::AfterCr;
                    return Ok(None);
                }
                if byte == self.newline {
                    self.close_field()?;
                    self.close_row(on_row);
                    self.state = ScannerState::StartOfField;
                    return Ok(None);
                }
                self.field_buf.push(byte);
                Ok(None)
            }

            ScannerState::InQuotedField => {
                if let Some(q) = self.quote {
                    if byte == q {
                        self.state = ScannerState::AfterClosingQuote;
                        return Ok(None);
                    }
                }
                if self.escape_distinct() && byte == self.escape {
                    self.state = ScannerState::EscapePending;
                    return Ok(None);
                }
                self.field_buf.push(byte);
                Ok(None)
            }

            ScannerState::AfterClosingQuote => {
                if byte == self.separator {
                    self.close_field()?;
                    self.state = ScannerState::StartOfField;
                    return Ok(None);
                }
                if byte == CR {
                    self.pre_cr_state = ScannerState::AfterClosingQuote;
                    self.state = ScannerState::AfterCr;
                    return Ok(None);
                }
                if byte == self.newline {
                    self.close_field()?;
                    self.close_row(on_row);
                    self.state = ScannerState::StartOfField;
                    return Ok(None);
                }
                if let Some(q) = self.quote {
                    if byte == q {
                        self.field_buf.push(q);
                        self.state = ScannerState::InQuotedField;
                        return Ok(None);
                    }
                }
                // Tolerate junk following a closing quote: treat it as the
                // start of an unquoted continuation of the same field.
                self.field_buf.push(byte);
                self.state = ScannerState::InUnquotedField;
                Ok(None)
            }

            ScannerState::EscapePending => {
                if let Some(q) = self.quote {
                    if byte == q {
                        self.field_buf.push(q);
                        self.state = ScannerState::InQuotedField;
                        return Ok(None);
                    }
                }
                self.field_buf.push(self.escape);
                self.state = ScannerState::InQuotedField;
                Ok(Some(byte))
            }

            ScannerState::AfterCr => {
                if byte == self.newline {
                    self.close_field()?;
                    self.close_row(on_row);
                    self.state = ScannerState::StartOfField;
                    return Ok(None);
                }
                self.state = self.pre_cr_state;
                Ok(Some(byte))
            }

            ScannerState::Comment => {
                if byte == self.newline {
                    self.state = ScannerState::StartOfField;
                }
                Ok(None)
            }
        }
    }
}
