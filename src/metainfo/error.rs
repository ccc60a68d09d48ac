use std::path::PathBuf;

use thiserror::Error;

use crate::bencode::BencodeError;

/// Errors that can occur when building, parsing or saving torrent descriptors.
///
/// All of these are raised locally, before any tracker is contacted.
#[derive(Debug, Error)]
pub enum MetainfoError {
    /// The torrent data contains invalid bencode.
    #[error("bencode error: {0}")]
    Bencode(#[from] BencodeError),

    /// A required field is missing.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field has an invalid value or type.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// The builder was asked to build without any content.
    #[error("at least one file must be added")]
    NoFiles,

    /// A piece hash buffer whose length is not a multiple of 20.
    #[error("piece hash buffer length {0} is not a multiple of 20")]
    InvalidPieceHashes(usize),

    /// A content source produced a different number of bytes than it declared.
    #[error("{path}: expected {expected} bytes, read {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// The info hash is not 20 bytes / 40 hex digits.
    #[error("invalid info hash")]
    InvalidInfoHash,

    /// The magnet link is malformed.
    #[error("invalid magnet link: {0}")]
    InvalidMagnetLink(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
