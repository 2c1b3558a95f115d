//! Encoding front-end: BOM detection and incremental UTF-16 → UTF-8
//! transcoding, chunk-resumable across arbitrary split points.
//!
//! Grounded on `examples/yarrow-zet/src/io.rs`'s `decode_if_utf16`, which
//! sniffs a BOM via `encoding_rs::Encoding::for_bom` and hands the buffer to
//! `decode_without_bom_handling`. That helper works on a whole in-memory
//! buffer; this module drives the same `encoding_rs` machinery incrementally,
//! since a streaming parser cannot wait for the whole input before deciding
//! the encoding.
//!
//! The UTF-8 path is a raw byte passthrough, not a `str::from_utf8`
//! validation: `spec.md` §4.1 requires that a chunk boundary be allowed to
//! fall inside a multi-byte UTF-8 code point, and the scanner downstream is
//! safe to consume such bytes directly since every byte that is special to
//! it (separator/quote/escape/newline/comment) is required to be single-byte
//! ASCII and cannot appear as a continuation byte of a longer sequence.

use encoding_rs::{Decoder, Encoding, UTF_8};

use crate::error::ParseError;

/// Longest BOM we might need to recognize (UTF-8's is 3 bytes, UTF-16's is 2).
const MAX_BOM_LEN: usize = 3;

#[derive(Debug)]
enum Mode {
    /// Not enough bytes seen yet to decide an encoding.
    Sniffing,
    /// Confirmed UTF-8 (explicit BOM or no BOM at all); bytes pass through
    /// unchanged after any BOM is stripped, with no UTF-8 validation.
    Utf8Passthrough,
    /// Confirmed UTF-16; `encoding_rs::Decoder` carries partial code units
    /// across chunk boundaries internally.
    Transcoding { decoder: Box<Decoder>, odd_byte_pending: bool },
}

/// Stateful decoder that turns a stream of raw input chunks into a stream of
/// UTF-8 byte chunks, regardless of how the input (or a BOM, or a UTF-16
/// surrogate pair) is split across chunk boundaries.
pub struct EncodingFrontEnd {
    mode: Mode,
    sniff_buffer: Vec<u8>,
    total_bytes_in: u64,
}

impl EncodingFrontEnd {
    pub fn new() -> Self {
        EncodingFrontEnd {
            mode: Mode::Sniffing,
            sniff_buffer: Vec::with_capacity(MAX_BOM_LEN),
            total_bytes_in: 0,
        }
    }

    /// Feed a raw input chunk, returning its UTF-8 equivalent. The returned
    /// buffer may be empty (e.g. the whole chunk was consumed as part of a
    /// BOM, or it holds only an incomplete trailing UTF-16 code unit).
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ParseError> {
        self.total_bytes_in += chunk.len() as u64;

        match &mut self.mode {
            Mode::Sniffing => self.sniff_then_decode(chunk),
            Mode::Utf8Passthrough => Ok(chunk.to_vec()),
            Mode::Transcoding { decoder, odd_byte_pending } => {
                *odd_byte_pending = (chunk.len() % 2 == 1) ^ *odd_byte_pending;
                Ok(decode_incremental(decoder, chunk, false))
            }
        }
    }

    /// Flush any pending partial sequence at end of stream.
    pub fn finish(&mut self) -> Result<Vec<u8>, ParseError> {
        match &mut self.mode {
            Mode::Sniffing => {
                // Fewer than MAX_BOM_LEN bytes ever arrived; resolve now.
                let buffered = std::mem::take(&mut self.sniff_buffer);
                self.resolve_encoding(&buffered, true)
            }
            Mode::Utf8Passthrough => Ok(Vec::new()),
            Mode::Transcoding { odd_byte_pending, .. } if *odd_byte_pending => {
                Err(ParseError::InvalidEncoding {
                    offset: self.total_bytes_in,
                    message: "UTF-16 input truncated mid-code-unit".into(),
                })
            }
            Mode::Transcoding { decoder, .. } => Ok(decode_incremental(decoder, &[], true)),
        }
    }

    fn sniff_then_decode(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ParseError> {
        self.sniff_buffer.extend_from_slice(chunk);
        if self.sniff_buffer.len() < MAX_BOM_LEN {
            // Still waiting for enough bytes to recognize (or rule out) a BOM.
            return Ok(Vec::new());
        }
        let buffered = std::mem::take(&mut self.sniff_buffer);
        self.resolve_encoding(&buffered, false)
    }

    fn resolve_encoding(&mut self, buffered: &[u8], at_eof: bool) -> Result<Vec<u8>, ParseError> {
        match Encoding::for_bom(buffered) {
            Some((enc, bom_len)) if enc != UTF_8 => {
                let mut decoder = enc.new_decoder_without_bom_handling();
                let body = &buffered[bom_len..];
                let odd_byte_pending = body.len() % 2 == 1;
                if at_eof && odd_byte_pending {
                    return Err(ParseError::InvalidEncoding {
                        offset: self.total_bytes_in,
                        message: "UTF-16 input truncated mid-code-unit".into(),
                    });
                }
                let out = decode_incremental(&mut decoder, body, at_eof);
                self.mode = Mode::Transcoding {
                    decoder: Box::new(decoder),
                    odd_byte_pending,
                };
                Ok(out)
            }
            Some((_, bom_len)) => {
                // Explicit UTF-8 BOM: strip it, pass the rest through raw.
                self.mode = Mode::Utf8Passthrough;
                Ok(buffered[bom_len..].to_vec())
            }
            None => {
                self.mode = Mode::Utf8Passthrough;
                Ok(buffered.to_vec())
            }
        }
    }
}

impl Default for EncodingFrontEnd {
    fn default() -> Self {
        EncodingFrontEnd::new()
    }
}

/// Drive `encoding_rs`'s incremental decoder to UTF-8 bytes. `decode_to_string`
/// never fails outright; malformed sequences and unpaired surrogates are
/// replaced with U+FFFD, matching `spec.md` §4.1.
fn decode_incremental(decoder: &mut Decoder, input: &[u8], last: bool) -> Vec<u8> {
    let mut out =
        String::with_capacity(decoder.max_utf8_buffer_length(input.len()).unwrap_or(input.len()));
    let _ = decoder.decode_to_string(input, &mut out, last);
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(front: &mut EncodingFrontEnd, input: &[u8]) -> Result<Vec<u8>, ParseError> {
        let mut out = front.push(input)?;
        out.extend(front.finish()?);
        Ok(out)
    }

    #[test]
    fn plain_ascii_passes_through() {
        let mut front = EncodingFrontEnd::new();
        let out = drive(&mut front, b"a,b,c\n").unwrap();
        assert_eq!(out, b"a,b,c\n");
    }

    #[test]
    fn strips_utf8_bom() {
        let mut front = EncodingFrontEnd::new();
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(b"a,b\n");
        let out = drive(&mut front, &input).unwrap();
        assert_eq!(out, b"a,b\n");
    }

    #[test]
    fn transcodes_utf16le() {
        let mut front = EncodingFrontEnd::new();
        let (encoded, _, _) = encoding_rs::UTF_16LE.encode("a,b\n");
        let mut input = vec![0xFF, 0xFE];
        input.extend_from_slice(&encoded);
        let out = drive(&mut front, &input).unwrap();
        assert_eq!(out, b"a,b\n");
    }

    #[test]
    fn transcodes_utf16be_with_non_ascii() {
        let mut front = EncodingFrontEnd::new();
        let (encoded, _, _) = encoding_rs::UTF_16BE.encode("4,5,\u{0264}\n");
        let mut input = vec![0xFE, 0xFF];
        input.extend_from_slice(&encoded);
        let out = drive(&mut front, &input).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "4,5,\u{0264}\n");
    }

    #[test]
    fn resumes_across_chunk_boundary_mid_bom() {
        let mut front = EncodingFrontEnd::new();
        let mut out = Vec::new();
        out.extend(front.push(&[0xEF]).unwrap());
        out.extend(front.push(&[0xBB, 0xBF]).unwrap());
        out.extend(front.push(b"x\n").unwrap());
        out.extend(front.finish().unwrap());
        assert_eq!(out, b"x\n");
    }

    #[test]
    fn resumes_utf16_across_odd_chunk_split() {
        let mut front = EncodingFrontEnd::new();
        let (encoded, _, _) = encoding_rs::UTF_16LE.encode("ab\n");
        let mut input = vec![0xFF, 0xFE];
        input.extend_from_slice(&encoded);

        let mut out = Vec::new();
        // Split mid code-unit: BOM + first byte of 'a', then the rest.
        out.extend(front.push(&input[..3]).unwrap());
        out.extend(front.push(&input[3..]).unwrap());
        out.extend(front.finish().unwrap());
        assert_eq!(out, b"ab\n");
    }

    #[test]
    fn utf8_passthrough_does_not_require_valid_boundaries_per_chunk() {
        // "é" is 0xC3 0xA9 in UTF-8; split the two bytes across two chunks.
        let mut front = EncodingFrontEnd::new();
        let mut out = Vec::new();
        out.extend(front.push(b"a,\xC3").unwrap());
        out.extend(front.push(b"\xA9\n").unwrap());
        out.extend(front.finish().unwrap());
        assert_eq!(out, "a,é\n".as_bytes());
    }

    #[test]
    fn truncated_utf16_at_flush_is_an_error() {
        let mut front = EncodingFrontEnd::new();
        let mut input = vec![0xFF, 0xFE];
        input.extend_from_slice(b"a"); // one lone byte: odd after the BOM
        front.push(&input).unwrap();
        let err = front.finish().unwrap_err();
        assert!(matches!(err, ParseError::InvalidEncoding { .. }));
    }
}
