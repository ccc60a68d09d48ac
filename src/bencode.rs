//! Bencode encoding and decoding ([BEP-3]).
//!
//! Bencode is the serialization format used for `.torrent` files and HTTP
//! tracker responses.
//!
//! # Data Types
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! Dictionaries always encode with keys in ascending byte order. The info
//! hash of a torrent is the SHA-1 of its encoded info dictionary, so this
//! canonical ordering is what makes info hashes reproducible.
//!
//! # Examples
//!
//! ```
//! use swarmseed::bencode::{decode, encode, Value};
//!
//! let value = decode(b"l4:spami42ee").unwrap();
//! let list = value.as_list().unwrap();
//! assert_eq!(list[0].as_str(), Some("spam"));
//! assert_eq!(list[1].as_integer(), Some(42));
//!
//! assert_eq!(encode(&value).unwrap(), b"l4:spami42ee");
//! ```
//!
//! # Error Handling
//!
//! - [`BencodeError::UnexpectedEof`] - Input ended unexpectedly
//! - [`BencodeError::MalformedInteger`] - Non-digits, leading zeros or `-0`
//! - [`BencodeError::DictKeyNotString`] - Dictionary key of the wrong type
//! - [`BencodeError::DuplicateKey`] - Same key twice in one dictionary
//! - [`BencodeError::NestingTooDeep`] - Recursion limit exceeded (max 64 levels)
//! - [`BencodeError::TrailingData`] - Extra data after the value
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod decode;
mod encode;
mod error;
mod text;
mod value;

pub use decode::{decode, decode_prefix};
pub use encode::{encode, encode_to};
pub use error::BencodeError;
pub use text::{decode_text, TextValue};
pub use value::Value;
