use thiserror::Error;

use crate::bencode::BencodeError;

/// Errors that can occur while talking to a tracker.
///
/// These never escape [`TrackerClient`](super::TrackerClient) calls; they are
/// folded into the returned result as a message plus a [`TrackerErrorKind`].
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The HTTP response body is not valid bencode.
    #[error("bencode error: {0}")]
    Bencode(#[from] BencodeError),

    /// The tracker answered with something that breaks the protocol: a
    /// mismatched transaction id, an unexpected action, a short datagram or
    /// a non-dictionary body.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The tracker reported a failure; the text is passed through verbatim.
    #[error("{0}")]
    Failure(String),

    #[error("tracker did not respond in time")]
    Timeout,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected http status {0}")]
    HttpStatus(u16),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// The request cannot be sent as asked (e.g. too many scrape hashes).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Coarse classification of a [`TrackerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerErrorKind {
    MalformedEncoding,
    ProtocolViolation,
    TrackerFailure,
    Timeout,
    IoFailure,
    InvalidRequest,
}

impl TrackerError {
    pub fn kind(&self) -> TrackerErrorKind {
        match self {
            TrackerError::Bencode(_) => TrackerErrorKind::MalformedEncoding,
            TrackerError::Protocol(_) | TrackerError::HttpStatus(_) => {
                TrackerErrorKind::ProtocolViolation
            }
            TrackerError::Failure(_) => TrackerErrorKind::TrackerFailure,
            TrackerError::Timeout => TrackerErrorKind::Timeout,
            TrackerError::Http(e) if e.is_timeout() => TrackerErrorKind::Timeout,
            TrackerError::Io(_) | TrackerError::Http(_) => TrackerErrorKind::IoFailure,
            TrackerError::InvalidUrl(_)
            | TrackerError::UnsupportedScheme(_)
            | TrackerError::InvalidRequest(_) => TrackerErrorKind::InvalidRequest,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == TrackerErrorKind::Timeout
    }
}
