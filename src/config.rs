use js_sys::{Object, Reflect};
use wasm_bindgen::JsValue;

use crate::error::ParseError;

/// How the row assembler acquires the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMode {
    /// The first non-skipped row is consumed as the header row.
    Infer,
    /// The caller supplies the header row; every row is data.
    Literal(Vec<String>),
    /// No header row is consumed; synthetic names `_0`, `_1`, … are
    /// assigned from the width of the first data row.
    Disabled,
}

impl Default for HeaderMode {
    fn default() -> Self {
        HeaderMode::Infer
    }
}

pub const DEFAULT_MAX_FIELD_COUNT: usize = 100_000;
pub const DEFAULT_MAX_ROW_BYTES: u64 = 64 * 1024 * 1024;

/// Validated parser configuration.
///
/// Built through [`ConfigBuilder`] (or parsed directly from a JS options
/// object via [`Config::from_js`]); every field has already been checked
/// for internal consistency by the time a `Config` exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub separator: u8,
    pub quote: Option<u8>,
    pub escape: u8,
    pub newline: u8,
    pub comment: Option<u8>,
    pub strict: bool,
    pub raw: bool,
    pub skip_lines: usize,
    pub max_row_bytes: u64,
    pub max_field_count: usize,
    pub header_mode: HeaderMode,
    pub lenient_unterminated_quote: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            separator: b',',
            quote: Some(b'"'),
            escape: b'"',
            newline: b'\n',
            comment: None,
            strict: true,
            raw: false,
            skip_lines: 0,
            max_row_bytes: DEFAULT_MAX_ROW_BYTES,
            max_field_count: DEFAULT_MAX_FIELD_COUNT,
            header_mode: HeaderMode::Infer,
            lenient_unterminated_quote: false,
        }
    }
}

impl Config {
    /// Parse a `Config` out of a JS options object, defaulting anything
    /// absent. Mirrors the option-validation style of the teacher's
    /// `CSVParserOptimized::new`/`BinaryCSVLexerLegacy::new`.
    pub fn from_js(options: &JsValue) -> Result<Config, ParseError> {
        let mut builder = ConfigBuilder::new();

        if options.is_undefined() || options.is_null() {
            return builder.build();
        }

        let obj = Object::from(options.clone());

        if let Some(byte) = get_single_byte(&obj, "separator")? {
            builder = builder.separator(byte);
        }
        if let Ok(val) = Reflect::get(&obj, &"quote".into()) {
            if val.is_null() || (val.is_boolean() && val.as_bool() == Some(false)) {
                builder = builder.no_quote();
            } else if let Some(s) = val.as_string() {
                builder = builder.quote(single_byte("quote", &s)?);
            }
        }
        if let Some(byte) = get_single_byte(&obj, "escape")? {
            builder = builder.escape(byte);
        }
        if let Some(byte) = get_single_byte(&obj, "newline")? {
            builder = builder.newline(byte);
        }
        if let Ok(val) = Reflect::get(&obj, &"comment".into()) {
            if let Some(s) = val.as_string() {
                builder = builder.comment(single_byte("comment", &s)?);
            }
        }
        if let Ok(val) = Reflect::get(&obj, &"strict".into()) {
            if let Some(b) = val.as_bool() {
                builder = builder.strict(b);
            }
        }
        if let Ok(val) = Reflect::get(&obj, &"raw".into()) {
            if let Some(b) = val.as_bool() {
                builder = builder.raw(b);
            }
        }
        if let Ok(val) = Reflect::get(&obj, &"skipLines".into()) {
            if let Some(n) = val.as_f64() {
                if n < 0.0 {
                    return Err(ParseError::InvalidConfig {
                        message: "skipLines must not be negative".into(),
                    });
                }
                builder = builder.skip_lines(n as usize);
            }
        }
        if let Ok(val) = Reflect::get(&obj, &"maxRowBytes".into()) {
            if let Some(n) = val.as_f64() {
                builder = builder.max_row_bytes(n as u64);
            }
        }
        if let Ok(val) = Reflect::get(&obj, &"maxFieldCount".into()) {
            if let Some(n) = val.as_f64() {
                builder = builder.max_field_count(n as usize);
            }
        }
        if let Ok(val) = Reflect::get(&obj, &"lenientUnterminatedQuote".into()) {
            if let Some(b) = val.as_bool() {
                builder = builder.lenient_unterminated_quote(b);
            }
        }
        if let Ok(val) = Reflect::get(&obj, &"headers".into()) {
            if val.is_boolean() && val.as_bool() == Some(false) {
                builder = builder.header_mode(HeaderMode::Disabled);
            } else if js_sys::Array::is_array(&val) {
                let arr = js_sys::Array::from(&val);
                let mut names = Vec::with_capacity(arr.length() as usize);
                for i in 0..arr.length() {
                    let item = arr.get(i);
                    match item.as_string() {
                        Some(s) => names.push(s),
                        None => {
                            return Err(ParseError::InvalidConfig {
                                message: "headers must be an array of strings".into(),
                            })
                        }
                    }
                }
                builder = builder.header_mode(HeaderMode::Literal(names));
            }
        }

        builder.build()
    }
}

fn get_single_byte(obj: &Object, key: &str) -> Result<Option<u8>, ParseError> {
    match Reflect::get(obj, &key.into()) {
        Ok(val) => match val.as_string() {
            Some(s) => Ok(Some(single_byte(key, &s)?)),
            None => Ok(None),
        },
        Err(_) => Ok(None),
    }
}

fn single_byte(field: &str, s: &str) -> Result<u8, ParseError> {
    let bytes = s.as_bytes();
    if bytes.len() != 1 {
        return Err(ParseError::InvalidConfig {
            message: format!("{field} must be a single ASCII byte, got {s:?}"),
        });
    }
    Ok(bytes[0])
}

/// Builder for [`Config`], validated on [`ConfigBuilder::build`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
    quote_disabled: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
            quote_disabled: false,
        }
    }

    pub fn separator(mut self, byte: u8) -> Self {
        self.config.separator = byte;
        self
    }

    pub fn quote(mut self, byte: u8) -> Self {
        self.config.quote = Some(byte);
        self.config.escape = byte;
        self.quote_disabled = false;
        self
    }

    pub fn no_quote(mut self) -> Self {
        self.config.quote = None;
        self.quote_disabled = true;
        self
    }

    pub fn escape(mut self, byte: u8) -> Self {
        self.config.escape = byte;
        self
    }

    pub fn newline(mut self, byte: u8) -> Self {
        self.config.newline = byte;
        self
    }

    pub fn comment(mut self, byte: u8) -> Self {
        self.config.comment = Some(byte);
        self
    }

    pub fn strict(mut self, yes: bool) -> Self {
        self.config.strict = yes;
        self
    }

    pub fn raw(mut self, yes: bool) -> Self {
        self.config.raw = yes;
        self
    }

    pub fn skip_lines(mut self, n: usize) -> Self {
        self.config.skip_lines = n;
        self
    }

    pub fn max_row_bytes(mut self, n: u64) -> Self {
        self.config.max_row_bytes = n;
        self
    }

    pub fn max_field_count(mut self, n: usize) -> Self {
        self.config.max_field_count = n;
        self
    }

    pub fn header_mode(mut self, mode: HeaderMode) -> Self {
        self.config.header_mode = mode;
        self
    }

    pub fn lenient_unterminated_quote(mut self, yes: bool) -> Self {
        self.config.lenient_unterminated_quote = yes;
        self
    }

    /// Delimiter bytes (`separator`/`quote`/`escape`/`newline`/`comment`) are
    /// not required to be pairwise distinct: `spec.md` §6 permits collisions
    /// and resolves the resulting ambiguity by priority order (quote >
    /// escape > separator > newline > comment) in the scanner's state table
    /// (`scanner.rs`'s `StartOfField`/`InQuotedField` dispatch checks quote
    /// before separator before newline before comment, in that order). Only
    /// structurally invalid configuration — a non-positive limit, or an
    /// empty literal header list — is rejected here.
    pub fn build(self) -> Result<Config, ParseError> {
        let c = &self.config;

        if c.max_row_bytes == 0 {
            return Err(ParseError::InvalidConfig {
                message: "maxRowBytes must be greater than zero".into(),
            });
        }
        if c.max_field_count == 0 {
            return Err(ParseError::InvalidConfig {
                message: "maxFieldCount must be greater than zero".into(),
            });
        }
        if let HeaderMode::Literal(names) = &c.header_mode {
            if names.is_empty() {
                return Err(ParseError::InvalidConfig {
                    message: "headers array must not be empty".into(),
                });
            }
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        ConfigBuilder::new()
    }
}
