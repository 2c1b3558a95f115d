//! WebAssembly bindings for the streaming DSV/CSV/TSV parser core.
//!
//! `CsvStreamParser` is a thin `#[wasm_bindgen]` wrapper around
//! [`driver::StreamParser`]: it owns nothing the pure-Rust core doesn't
//! already own, and exists only to translate JS-shaped inputs (an options
//! `JsValue`, `Uint8Array` chunks) into the core's `push`/`flush`/`headers`
//! contract and translate `Record`/`RawRecord` batches back into plain JS
//! objects.
//!
//! Grounded on `CSVStreamParser` in the teacher's `lib.rs` (the overall
//! shape: a `#[wasm_bindgen]` struct with `push`/`flush`/`reset`-style
//! methods) and `CSVParser` in the teacher's `parser.rs` (constructor option
//! parsing via a `JsValue` options bag, `JsError` propagation on invalid
//! input).

mod assembler;
mod config;
mod driver;
mod encoding;
mod error;
mod headers;
mod record;
mod scanner;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigBuilder, HeaderMode};
pub use driver::StreamParser;
pub use error::ParseError;
pub use headers::Headers;
pub use record::{RawRecord, Record, RecordBatch};

use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;

/// Streaming DSV/CSV/TSV parser exposed to JavaScript hosts.
///
/// Construct with an options object matching `spec.md` §3/§6 (`separator`,
/// `quote`, `escape`, `newline`, `comment`, `headers`, `skipLines`,
/// `maxRowBytes`, `maxFieldCount`, `strict`, `raw`,
/// `lenientUnterminatedQuote`); every field is optional and defaults per
/// `Config::default`. `mapHeaders`/`mapValues` and all host I/O are left to
/// the caller, per `spec.md` §6's external-collaborator contract.
#[wasm_bindgen]
pub struct CsvStreamParser {
    inner: StreamParser,
}

#[wasm_bindgen]
impl CsvStreamParser {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<CsvStreamParser, JsError> {
        let config = Config::from_js(&options)?;
        Ok(CsvStreamParser {
            inner: StreamParser::new(config),
        })
    }

    /// Push one chunk of raw bytes. Returns a JS array of record objects
    /// assembled during this call; the array may be empty.
    #[wasm_bindgen]
    pub fn push(&mut self, bytes: &Uint8Array) -> Result<JsValue, JsError> {
        let mut buf = vec![0u8; bytes.length() as usize];
        bytes.copy_to(&mut buf);
        let batch = self.inner.push(&buf)?;
        Ok(batch.to_js_value())
    }

    /// Signal end of input. Returns any records assembled from a trailing
    /// row with no terminating newline. The parser rejects further `push`/
    /// `flush` calls once this returns successfully.
    #[wasm_bindgen]
    pub fn flush(&mut self) -> Result<JsValue, JsError> {
        let batch = self.inner.flush()?;
        Ok(batch.to_js_value())
    }

    /// Installed header names, or `undefined` if the header row has not
    /// been observed yet.
    #[wasm_bindgen(js_name = getHeaders)]
    pub fn get_headers(&self) -> JsValue {
        match self.inner.headers() {
            Some(headers) => {
                let array = Array::new();
                for name in headers.names() {
                    array.push(&JsValue::from_str(name));
                }
                array.into()
            }
            None => JsValue::UNDEFINED,
        }
    }
}
