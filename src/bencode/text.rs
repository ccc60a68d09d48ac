use std::collections::BTreeMap;

use bytes::Bytes;

use super::decode::decode;
use super::error::BencodeError;
use super::value::Value;

/// A decoded bencode value whose byte strings were reinterpreted as text
/// wherever they look like text.
///
/// Binary blobs such as piece-hash buffers or compact peer lists fail the
/// printable-text check and stay [`TextValue::Bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextValue {
    Integer(i64),
    Text(String),
    Bytes(Bytes),
    List(Vec<TextValue>),
    Dict(BTreeMap<String, TextValue>),
}

impl TextValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TextValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TextValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TextValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TextValue]> {
        match self {
            TextValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, TextValue>> {
        match self {
            TextValue::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&TextValue> {
        self.as_dict()?.get(key)
    }
}

impl From<Value> for TextValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Integer(i) => TextValue::Integer(i),
            Value::Bytes(b) => match text_of(&b) {
                Some(s) => TextValue::Text(s.to_owned()),
                None => TextValue::Bytes(b),
            },
            Value::List(l) => TextValue::List(l.into_iter().map(TextValue::from).collect()),
            Value::Dict(d) => TextValue::Dict(
                d.into_iter()
                    .map(|(k, v)| (String::from_utf8_lossy(&k).into_owned(), v.into()))
                    .collect(),
            ),
        }
    }
}

/// Decodes `data` and converts text-like byte strings to [`String`]s.
///
/// ```
/// use swarmseed::bencode::{decode_text, TextValue};
///
/// let value = decode_text(b"d4:name5:hello6:pieces2:\x00\x01e").unwrap();
/// assert_eq!(value.get("name").and_then(|v| v.as_text()), Some("hello"));
/// assert!(matches!(value.get("pieces"), Some(TextValue::Bytes(_))));
/// ```
pub fn decode_text(data: &[u8]) -> Result<TextValue, BencodeError> {
    decode(data).map(TextValue::from)
}

fn text_of(bytes: &[u8]) -> Option<&str> {
    if !looks_like_text(bytes) {
        return None;
    }
    std::str::from_utf8(bytes).ok()
}

/// Printable ASCII, common whitespace, and UTF-8 lead/continuation bytes.
pub(crate) fn looks_like_text(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| {
        (0x20..=0x7E).contains(&b)
            || matches!(b, b'\n' | b'\r' | b'\t')
            || b & 0xC0 == 0x80
            || b & 0xE0 == 0xC0
            || b & 0xF0 == 0xE0
            || b & 0xF8 == 0xF0
    })
}
