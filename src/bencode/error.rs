use thiserror::Error;

/// Errors produced while decoding or inspecting bencode data.
///
/// Decoding never panics on hostile input: every malformed byte sequence
/// maps to one of these variants.
#[derive(Debug, Error)]
pub enum BencodeError {
    /// Input ended before the value was complete (truncated input).
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("malformed integer: {0}")]
    MalformedInteger(String),

    #[error("invalid string length")]
    InvalidStringLength,

    #[error("unexpected character: {0:?}")]
    UnexpectedChar(char),

    /// A dictionary key decoded to something other than a byte string.
    #[error("dictionary key is not a byte string")]
    DictKeyNotString,

    /// The same key appears twice in one dictionary.
    #[error("duplicate dictionary key: {0}")]
    DuplicateKey(String),

    #[error("trailing data after value")]
    TrailingData,

    #[error("nesting too deep")]
    NestingTooDeep,

    /// A typed accessor was used on a value of another shape.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
