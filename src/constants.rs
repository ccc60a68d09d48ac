//! Protocol constants and defaults.
//!
//! Tracker timeouts and peer counts follow what common clients send; piece
//! sizing bounds follow the usual 16 KiB - 16 MiB range accepted by clients.

use std::time::Duration;

// ============================================================================
// Client identification
// ============================================================================

/// Client ID prefix for peer ID generation (Azureus-style)
pub const CLIENT_PREFIX: &[u8; 8] = b"-SS0001-";

/// User agent string for HTTP tracker requests
pub const USER_AGENT: &str = concat!("swarmseed/", env!("CARGO_PKG_VERSION"));

/// Default `created by` tag written into new torrents
pub const DEFAULT_CREATED_BY: &str = concat!("swarmseed/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Tracker defaults
// ============================================================================

/// How long to wait for any single tracker response
pub const DEFAULT_TRACKER_TIMEOUT: Duration = Duration::from_secs(15);

/// Configured retry budget. Stored in `TrackerConfig` but not consulted.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Peers requested per HTTP announce
pub const HTTP_NUMWANT: u32 = 50;

/// Re-announce interval assumed when an HTTP tracker omits `interval`
pub const DEFAULT_ANNOUNCE_INTERVAL: u32 = 1800;

/// Minimum interval assumed when an HTTP tracker omits `min interval`
pub const DEFAULT_MIN_INTERVAL: u32 = 300;

// ============================================================================
// UDP tracker protocol (BEP-15)
// ============================================================================

/// Magic constant identifying a UDP tracker connect request
pub const UDP_PROTOCOL_ID: u64 = 0x41727101980;

pub const UDP_ACTION_CONNECT: u32 = 0;
pub const UDP_ACTION_ANNOUNCE: u32 = 1;
pub const UDP_ACTION_SCRAPE: u32 = 2;
pub const UDP_ACTION_ERROR: u32 = 3;

/// Receive buffer for a single tracker datagram
pub const UDP_MAX_DATAGRAM: usize = 2048;

/// Most info hashes one UDP scrape request may carry
pub const UDP_MAX_SCRAPE_HASHES: usize = 74;

/// Size of an announce request datagram
pub const UDP_ANNOUNCE_REQUEST_LEN: usize = 98;

// ============================================================================
// Piece sizing
// ============================================================================

/// Smallest piece length we produce (16 KiB)
pub const MIN_PIECE_SIZE: u64 = 16 * 1024;

/// Largest piece length we produce (16 MiB)
pub const MAX_PIECE_SIZE: u64 = 16 * 1024 * 1024;

/// Lower bound of the piece count the dynamic strategy aims for
pub const MIN_TARGET_PIECES: u64 = 1000;

/// Upper bound of the piece count the dynamic strategy aims for
pub const MAX_TARGET_PIECES: u64 = 2200;

// ============================================================================
// Hashing
// ============================================================================

/// Length of one SHA-1 piece hash
pub const PIECE_HASH_LEN: usize = 20;

/// Read buffer used when streaming content through the hasher (64 KiB)
pub const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Emit a progress log line every this many pieces
pub const HASH_PROGRESS_INTERVAL: usize = 1024;
