//! Torrent descriptors ([BEP-3]) and magnet links ([BEP-9]).
//!
//! This module builds `.torrent` descriptors from content, parses them back,
//! and derives the info hash that names a swarm.
//!
//! # Overview
//!
//! A descriptor holds everything a peer needs to verify content:
//! - File names, sizes, and directory structure
//! - One 20-byte SHA-1 hash per piece
//! - Tracker URLs for peer discovery
//!
//! [`TorrentBuilder`] picks a piece length, streams every file through the
//! [`PieceHasher`] and returns an immutable [`TorrentDescriptor`].
//!
//! # Examples
//!
//! ## Building and saving a torrent
//!
//! ```no_run
//! use swarmseed::metainfo::TorrentBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let torrent = TorrentBuilder::new("video.mkv")
//!     .add_file_from_path("media/video.mkv")?
//!     .add_tracker("udp://tracker.opentrackr.org:1337/announce")
//!     .build()?;
//!
//! println!("Info hash: {}", torrent.info_hash());
//! println!("Size: {}", torrent.human_readable_size());
//! println!("Pieces: {} x {} bytes", torrent.piece_count(), torrent.piece_length());
//! println!("Magnet: {}", torrent.magnet_link());
//!
//! torrent.save_to("torrents/video.mkv.torrent")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Parsing a torrent file
//!
//! ```no_run
//! use swarmseed::metainfo::TorrentDescriptor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("example.torrent")?;
//! let torrent = TorrentDescriptor::from_bytes(&data)?;
//!
//! for file in torrent.files() {
//!     println!("  {} ({} bytes)", file.display_path(), file.length);
//! }
//! for tracker in torrent.trackers() {
//!     println!("Tracker: {}", tracker);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Torrent Structure
//!
//! - **info** - hashed to create the info hash
//!   - `name` - suggested file/directory name
//!   - `piece length` - bytes per piece
//!   - `pieces` - concatenated SHA-1 hashes
//!   - `private` - present (as 1) only for private torrents
//!   - `length` (single-file) OR `files` (multi-file)
//! - **announce** - primary tracker URL
//! - **announce-list** - further tracker tiers ([BEP-12])
//! - **url-list** - web seeds ([BEP-19])
//! - **creation date**, **comment**, **created by**
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html
//! [BEP-9]: http://bittorrent.org/beps/bep_0009.html
//! [BEP-12]: http://bittorrent.org/beps/bep_0012.html
//! [BEP-19]: http://bittorrent.org/beps/bep_0019.html

mod builder;
mod error;
mod hasher;
mod info_hash;
mod magnet;
mod piece_size;
mod source;
mod torrent;

pub use builder::TorrentBuilder;
pub use error::MetainfoError;
pub use hasher::{
    expected_hashes_size, hash_pieces, PieceHasher, PieceHashes, MAX_RESERVED_PIECES,
};
pub use info_hash::InfoHash;
pub use magnet::MagnetLink;
pub use piece_size::{
    calculate_dynamic_piece_size, calculate_piece_size, estimate_torrent_file_size,
    is_valid_piece_size, piece_count, round_to_valid_piece_size, PieceSizeStrategy,
};
pub use source::{ContentSource, FileSource, MemorySource};
pub use torrent::{human_readable_size, FileEntry, TorrentDescriptor};
