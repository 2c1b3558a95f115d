use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsValue;

use crate::headers::Headers;

/// Property names that shadow built-ins on a plain JS object and need
/// `Object.defineProperty` instead of a normal assignment. Carried over
/// verbatim from the teacher's `assembler.rs`/`parser_optimized.rs`, which
/// both hit the same "field order bug" with a naive `Reflect::set`.
const UNSAFE_PROPERTY_NAMES: [&str; 3] = ["__proto__", "constructor", "prototype"];

fn set_property(obj: &Object, key: &str, value: &JsValue) {
    if UNSAFE_PROPERTY_NAMES.contains(&key) {
        let descriptor = Object::new();
        let _ = Reflect::set(&descriptor, &"value".into(), value);
        let _ = Reflect::set(&descriptor, &"writable".into(), &JsValue::TRUE);
        let _ = Reflect::set(&descriptor, &"enumerable".into(), &JsValue::TRUE);
        let _ = Reflect::set(&descriptor, &"configurable".into(), &JsValue::TRUE);
        let _ = Object::define_property(obj, &JsValue::from_str(key), &descriptor);
    } else {
        let _ = Reflect::set(obj, &JsValue::from_str(key), value);
    }
}

/// A decoded data row, paired with the `Headers` installed when it was
/// produced.
#[derive(Debug, Clone)]
pub struct Record {
    headers: Headers,
    values: Vec<String>,
}

impl Record {
    pub fn new(headers: Headers, values: Vec<String>) -> Self {
        Record { headers, values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.index_of(name).and_then(|i| self.values.get(i)).map(String::as_str)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    /// Build a plain JS object keyed by header name.
    pub fn to_js_object(&self) -> JsValue {
        let obj = Object::new();
        for (name, value) in self.iter() {
            set_property(&obj, name, &JsValue::from_str(value));
        }
        obj.into()
    }
}

/// A non-decoded data row (`Config::raw`): field values are left as the raw
/// bytes the scanner produced, with no UTF-8 validation performed.
#[derive(Debug, Clone)]
pub struct RawRecord {
    headers: Headers,
    values: Vec<Vec<u8>>,
}

impl RawRecord {
    pub fn new(headers: Headers, values: Vec<Vec<u8>>) -> Self {
        RawRecord { headers, values }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .index_of(name)
            .and_then(|i| self.values.get(i))
            .map(Vec::as_slice)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn values(&self) -> &[Vec<u8>] {
        &self.values
    }

    /// Build a plain JS object keyed by header name, values as `Uint8Array`s.
    pub fn to_js_object(&self) -> JsValue {
        let obj = Object::new();
        for (name, value) in self.headers.names().iter().zip(self.values.iter()) {
            let array = js_sys::Uint8Array::from(value.as_slice());
            set_property(&obj, name, &array.into());
        }
        obj.into()
    }
}

/// A batch of produced records, flattened into one `JsValue` array per
/// `push`/`flush` call — the same boundary-crossing-cost rationale the
/// teacher's `parser.rs` documents for its "Flat Data Transfer Format".
pub enum RecordBatch {
    Decoded(Vec<Record>),
    Raw(Vec<RawRecord>),
}

impl RecordBatch {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            RecordBatch::Decoded(v) => v.len(),
            RecordBatch::Raw(v) => v.len(),
        }
    }

    pub fn to_js_value(&self) -> JsValue {
        let array = Array::new();
        match self {
            RecordBatch::Decoded(records) => {
                for record in records {
                    array.push(&record.to_js_object());
                }
            }
            RecordBatch::Raw(records) => {
                for record in records {
                    array.push(&record.to_js_object());
                }
            }
        }
        array.into()
    }
}
