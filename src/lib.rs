//! swarmseed - torrent creation and tracker announcing
//!
//! Build `.torrent` descriptors from files or in-memory content, then tell
//! trackers you are seeding them.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 Bencode encoding/decoding
//! - [`metainfo`] - Piece hashing, torrent descriptors, info hashes and magnet links
//! - [`tracker`] - BEP-3/15/23/48 HTTP and UDP announce and scrape
//! - [`constants`] - Protocol constants and defaults

pub mod bencode;
pub mod constants;
pub mod metainfo;
pub mod tracker;

pub use bencode::{decode, encode, BencodeError, Value};
pub use metainfo::{
    InfoHash, MagnetLink, MetainfoError, PieceHasher, PieceSizeStrategy, TorrentBuilder,
    TorrentDescriptor,
};
pub use tracker::{
    AnnounceRequest, AnnounceResult, PeerId, ScrapeResult, TrackerConfig, TrackerError,
    TrackerEvent, TrackerSet, TrackerStatus,
};
