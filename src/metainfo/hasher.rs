use std::io::{self, Read};

use bytes::Bytes;
use sha1::{Digest, Sha1};

use super::error::MetainfoError;
use super::source::ContentSource;
use crate::constants::{HASH_BUFFER_SIZE, HASH_PROGRESS_INTERVAL, PIECE_HASH_LEN};

/// Upper bound on the hashes [`PieceHasher::with_expected_size`] reserves up front.
pub const MAX_RESERVED_PIECES: usize = 64 * 1024;

/// Concatenated 20-byte SHA-1 piece hashes, in piece order.
///
/// The buffer length is always an exact multiple of 20.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct PieceHashes(Bytes);

impl PieceHashes {
    /// Wraps an existing `pieces` buffer, checking its length.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self, MetainfoError> {
        let bytes = bytes.into();
        if bytes.len() % PIECE_HASH_LEN != 0 {
            return Err(MetainfoError::InvalidPieceHashes(bytes.len()));
        }
        Ok(Self(bytes))
    }

    /// Number of pieces.
    pub fn len(&self) -> usize {
        self.0.len() / PIECE_HASH_LEN
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<[u8; 20]> {
        let start = index.checked_mul(PIECE_HASH_LEN)?;
        let end = start.checked_add(PIECE_HASH_LEN)?;
        let chunk = self.0.get(start..end)?;
        chunk.try_into().ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.0.chunks_exact(PIECE_HASH_LEN)
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }
}

impl std::fmt::Debug for PieceHashes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PieceHashes({} pieces)", self.len())
    }
}

/// Streaming SHA-1 piece hasher.
///
/// Bytes are fed through [`update`](Self::update) in any chunking; pieces
/// are cut every `piece_length` bytes of the logical stream, so a piece may
/// straddle two files. Only the running digest is kept in memory, never a
/// whole piece.
///
/// ```
/// use swarmseed::metainfo::PieceHasher;
///
/// let mut hasher = PieceHasher::new(16384);
/// hasher.update(&[0u8; 10000]);
/// hasher.update(&[0u8; 10000]);
/// let hashes = hasher.finish();
/// assert_eq!(hashes.len(), 2);
/// assert_eq!(hashes.as_bytes().len(), 40);
/// ```
#[derive(Debug, Clone)]
pub struct PieceHasher {
    piece_length: u64,
    digest: Sha1,
    filled: u64,
    total: u64,
    hashes: Vec<u8>,
}

impl PieceHasher {
    /// # Panics
    ///
    /// Panics if `piece_length` is zero.
    pub fn new(piece_length: u64) -> Self {
        assert!(piece_length > 0, "piece length must be positive");
        Self {
            piece_length,
            digest: Sha1::new(),
            filled: 0,
            total: 0,
            hashes: Vec::new(),
        }
    }

    /// Pre-sizes the output buffer for `total_size` bytes of content.
    ///
    /// The size is only a hint from the caller, so the reservation is capped
    /// at [`MAX_RESERVED_PIECES`] hashes; the buffer grows past it as needed.
    pub fn with_expected_size(piece_length: u64, total_size: u64) -> Self {
        let mut hasher = Self::new(piece_length);
        let pieces = usize::try_from(total_size.div_ceil(piece_length))
            .unwrap_or(usize::MAX)
            .min(MAX_RESERVED_PIECES);
        hasher.hashes.reserve(expected_hashes_size(pieces));
        hasher
    }

    pub fn piece_length(&self) -> u64 {
        self.piece_length
    }

    /// Total bytes consumed so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.total
    }

    /// Completed pieces so far (the trailing partial piece is not counted).
    pub fn pieces_hashed(&self) -> usize {
        self.hashes.len() / PIECE_HASH_LEN
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let room = self.piece_length - self.filled;
            let take = room.min(data.len() as u64) as usize;

            self.digest.update(&data[..take]);
            self.filled += take as u64;
            self.total += take as u64;
            data = &data[take..];

            if self.filled == self.piece_length {
                self.finish_piece();
            }
        }
    }

    /// Feeds everything `reader` yields; returns the number of bytes read.
    pub fn hash_reader<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<u64> {
        let mut buf = vec![0u8; HASH_BUFFER_SIZE];
        let mut read_total = 0u64;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.update(&buf[..n]);
            read_total += n as u64;
        }

        Ok(read_total)
    }

    /// Streams each source in order as one logical byte stream.
    ///
    /// Every source must yield exactly the number of bytes it declares;
    /// otherwise the file layout and the hashes would disagree.
    pub fn hash_sources<'a, I>(&mut self, sources: I) -> Result<u64, MetainfoError>
    where
        I: IntoIterator<Item = &'a dyn ContentSource>,
    {
        let mut total = 0u64;
        for source in sources {
            let expected = source.len()?;
            let mut reader = source.open()?;
            let actual = self.hash_reader(&mut reader)?;
            if actual != expected {
                return Err(MetainfoError::SizeMismatch {
                    path: source.origin(),
                    expected,
                    actual,
                });
            }
            total += actual;
        }
        Ok(total)
    }

    /// Hashes the final partial piece, if any, and returns all hashes.
    pub fn finish(mut self) -> PieceHashes {
        if self.filled > 0 {
            self.finish_piece();
        }
        PieceHashes(Bytes::from(self.hashes))
    }

    fn finish_piece(&mut self) {
        let hash = self.digest.finalize_reset();
        self.hashes.extend_from_slice(&hash);
        self.filled = 0;

        let done = self.pieces_hashed();
        if done % HASH_PROGRESS_INTERVAL == 0 {
            tracing::debug!(pieces = done, bytes = self.total, "hashing progress");
        }
    }
}

/// Hashes one reader in a single call.
pub fn hash_pieces<R: Read>(mut reader: R, piece_length: u64) -> io::Result<PieceHashes> {
    let mut hasher = PieceHasher::new(piece_length);
    hasher.hash_reader(&mut reader)?;
    Ok(hasher.finish())
}

/// Size of the concatenated hash buffer for `piece_count` pieces.
pub fn expected_hashes_size(piece_count: usize) -> usize {
    piece_count * PIECE_HASH_LEN
}
