use wasm_bindgen::JsError;

/// Everything that can go wrong while streaming a delimiter-separated file.
///
/// Every variant carries the byte offset (into the UTF-8 view the scanner
/// consumes, post-transcoding — see `DESIGN.md`) at which the problem was
/// detected, so a host can report a useful position even across chunk
/// boundaries.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Row length does not match headers (at byte {offset}: found {found} fields, expected {expected})")]
    RowLengthMismatch {
        offset: u64,
        expected: usize,
        found: usize,
    },

    #[error("Row exceeds the maximum size (at byte {offset}, limit {limit} bytes)")]
    RowTooLarge { offset: u64, limit: u64 },

    #[error("row at byte {offset} has more than {limit} fields")]
    TooManyFields { offset: u64, limit: usize },

    #[error("invalid encoding at byte {offset}: {message}")]
    InvalidEncoding { offset: u64, message: String },

    #[error("invalid data at byte {offset}: {message}")]
    InvalidData { offset: u64, message: String },

    #[error("unterminated quoted field starting before byte {offset}")]
    UnterminatedQuote { offset: u64 },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Raised by `push`/`flush` when called after `flush()` has already
    /// returned successfully. Distinct from `InvalidConfig`, which is
    /// strictly a construction-time validation failure (`spec.md` §7) —
    /// this is a post-lifecycle misuse of an already-terminated parser.
    #[error("parser has already been flushed; no further input accepted")]
    StreamClosed,
}

impl ParseError {
    /// The byte offset at which the error was detected, if any (`InvalidConfig`
    /// is detected before any input is seen, so it has none).
    pub fn offset(&self) -> Option<u64> {
        match self {
            ParseError::RowLengthMismatch { offset, .. } => Some(*offset),
            ParseError::RowTooLarge { offset, .. } => Some(*offset),
            ParseError::TooManyFields { offset, .. } => Some(*offset),
            ParseError::InvalidEncoding { offset, .. } => Some(*offset),
            ParseError::InvalidData { offset, .. } => Some(*offset),
            ParseError::UnterminatedQuote { offset } => Some(*offset),
            ParseError::InvalidConfig { .. } => None,
            ParseError::StreamClosed => None,
        }
    }
}

impl From<ParseError> for JsError {
    fn from(err: ParseError) -> Self {
        JsError::new(&err.to_string())
    }
}
