//! Piece length selection.
//!
//! Smaller pieces verify at a finer grain but grow the `pieces` field (20
//! bytes per piece); larger pieces keep `.torrent` files small. The tiered
//! table keeps typical torrents well under ~50 KiB of hashes.

use crate::constants::{
    MAX_PIECE_SIZE, MAX_TARGET_PIECES, MIN_PIECE_SIZE, MIN_TARGET_PIECES, PIECE_HASH_LEN,
};

/// How the builder picks a piece length when none is given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PieceSizeStrategy {
    /// Fixed size tiers keyed on total content size.
    #[default]
    Tiered,
    /// Tiered start, then doubled/halved toward 1000..=2200 pieces.
    Dynamic,
}

impl PieceSizeStrategy {
    pub fn piece_size(self, total_size: u64) -> u64 {
        match self {
            PieceSizeStrategy::Tiered => calculate_piece_size(total_size),
            PieceSizeStrategy::Dynamic => calculate_dynamic_piece_size(total_size),
        }
    }
}

/// Tiered piece length for `total_size` bytes.
///
/// | Total size | Piece length |
/// |------------|--------------|
/// | 0 | 16 KiB |
/// | < 1 MB | 32 KiB |
/// | < 10 MB | 64 KiB |
/// | < 100 MB | 256 KiB |
/// | < 1 GB | 512 KiB |
/// | < 10 GB | 1 MiB |
/// | otherwise | 2 MiB |
pub fn calculate_piece_size(total_size: u64) -> u64 {
    const KIB: u64 = 1024;
    match total_size {
        0 => MIN_PIECE_SIZE,
        n if n < 1_000_000 => 32 * KIB,
        n if n < 10_000_000 => 64 * KIB,
        n if n < 100_000_000 => 256 * KIB,
        n if n < 1_000_000_000 => 512 * KIB,
        n if n < 10_000_000_000 => 1024 * KIB,
        _ => 2048 * KIB,
    }
}

/// Refines [`calculate_piece_size`] so the piece count lands in
/// `MIN_TARGET_PIECES..=MAX_TARGET_PIECES` where the size bounds allow it.
pub fn calculate_dynamic_piece_size(total_size: u64) -> u64 {
    if total_size == 0 {
        return MIN_PIECE_SIZE;
    }

    let mut piece_size = calculate_piece_size(total_size);
    let mut count = piece_count(total_size, piece_size);

    while count > MAX_TARGET_PIECES && piece_size < MAX_PIECE_SIZE {
        piece_size *= 2;
        count = piece_count(total_size, piece_size);
    }

    while count < MIN_TARGET_PIECES && piece_size > MIN_PIECE_SIZE {
        piece_size /= 2;
        count = piece_count(total_size, piece_size);
    }

    piece_size
}

/// Number of pieces needed to cover `total_size` bytes.
///
/// # Panics
///
/// Panics if `piece_size` is zero.
pub fn piece_count(total_size: u64, piece_size: u64) -> u64 {
    assert!(piece_size > 0, "piece size must be positive");
    total_size.div_ceil(piece_size)
}

/// Rough size of the resulting `.torrent` file: one hash per piece plus
/// about 500 bytes of other metadata.
pub fn estimate_torrent_file_size(piece_count: u64) -> u64 {
    piece_count * PIECE_HASH_LEN as u64 + 500
}

/// A power of two within `MIN_PIECE_SIZE..=MAX_PIECE_SIZE`.
pub fn is_valid_piece_size(piece_size: u64) -> bool {
    (MIN_PIECE_SIZE..=MAX_PIECE_SIZE).contains(&piece_size) && piece_size.is_power_of_two()
}

/// Snaps `piece_size` to the nearest valid power of two, rounding ties up.
pub fn round_to_valid_piece_size(piece_size: u64) -> u64 {
    if piece_size <= MIN_PIECE_SIZE {
        return MIN_PIECE_SIZE;
    }
    if piece_size >= MAX_PIECE_SIZE {
        return MAX_PIECE_SIZE;
    }

    let lower = 1u64 << (63 - piece_size.leading_zeros());
    let upper = lower << 1;

    if piece_size - lower < upper - piece_size {
        lower
    } else {
        upper
    }
}
