use bytes::Bytes;
use std::collections::BTreeMap;

use super::error::BencodeError;

/// A bencode value.
///
/// Dictionaries are stored in a [`BTreeMap`] keyed by raw bytes, so iteration
/// (and therefore encoding) is always in ascending byte-lexicographic key
/// order no matter how the map was populated.
///
/// # Examples
///
/// ```
/// use swarmseed::bencode::Value;
///
/// let int: Value = 42i64.into();
/// let string: Value = "hello".into();
///
/// assert_eq!(int.as_integer(), Some(42));
/// assert_eq!(string.as_str(), Some("hello"));
/// assert!(string.try_integer().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A signed 64-bit integer.
    Integer(i64),
    /// A byte string (may or may not be valid UTF-8).
    Bytes(Bytes),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A dictionary with byte string keys.
    Dict(BTreeMap<Bytes, Value>),
}

impl Value {
    /// Creates a byte string value from a UTF-8 string.
    pub fn string(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Creates an empty dictionary value.
    pub fn dict() -> Self {
        Value::Dict(BTreeMap::new())
    }

    /// Short name of this value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Bytes(_) => "byte string",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as a UTF-8 string, if it is a valid UTF-8 byte string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<Bytes, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Consumes the value and returns the dictionary, if it is one.
    pub fn into_dict(self) -> Option<BTreeMap<Bytes, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Like [`Value::as_integer`], but reports the mismatch as an error.
    pub fn try_integer(&self) -> Result<i64, BencodeError> {
        self.as_integer().ok_or_else(|| self.mismatch("integer"))
    }

    /// Like [`Value::as_bytes`], but reports the mismatch as an error.
    pub fn try_bytes(&self) -> Result<&Bytes, BencodeError> {
        self.as_bytes().ok_or_else(|| self.mismatch("byte string"))
    }

    /// Like [`Value::as_list`], but reports the mismatch as an error.
    pub fn try_list(&self) -> Result<&Vec<Value>, BencodeError> {
        self.as_list().ok_or_else(|| self.mismatch("list"))
    }

    /// Like [`Value::as_dict`], but reports the mismatch as an error.
    pub fn try_dict(&self) -> Result<&BTreeMap<Bytes, Value>, BencodeError> {
        self.as_dict().ok_or_else(|| self.mismatch("dictionary"))
    }

    /// Looks up a key in this value if it is a dictionary.
    ///
    /// ```
    /// use swarmseed::bencode::decode;
    ///
    /// let value = decode(b"d3:foo3:bare").unwrap();
    /// assert_eq!(value.get(b"foo").and_then(|v| v.as_str()), Some("bar"));
    /// assert_eq!(value.get(b"missing"), None);
    /// ```
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict()?.get(key)
    }

    /// Inserts `key` into this value if it is a dictionary; no-op otherwise.
    pub fn insert(&mut self, key: &'static [u8], value: impl Into<Value>) {
        if let Value::Dict(d) = self {
            d.insert(Bytes::from_static(key), value.into());
        }
    }

    fn mismatch(&self, expected: &'static str) -> BencodeError {
        BencodeError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<BTreeMap<Bytes, Value>> for Value {
    fn from(d: BTreeMap<Bytes, Value>) -> Self {
        Value::Dict(d)
    }
}
