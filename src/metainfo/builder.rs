//! Torrent descriptor builder.
//!
//! [`TorrentBuilder`] collects content sources and optional metadata, then
//! [`build`](TorrentBuilder::build) streams every source through the piece
//! hasher and yields an immutable [`TorrentDescriptor`].
//!
//! # Examples
//!
//! ## From files on disk
//!
//! ```no_run
//! use swarmseed::metainfo::TorrentBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let torrent = TorrentBuilder::new("holiday-photos")
//!     .add_directory("photos/holiday")?
//!     .add_tracker("udp://tracker.opentrackr.org:1337/announce")
//!     .add_tracker("http://tracker.example.com/announce")
//!     .comment("Summer 2024")
//!     .build()?;
//!
//! torrent.save_to("out/holiday-photos.torrent")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## From memory
//!
//! ```
//! use swarmseed::metainfo::TorrentBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let torrent = TorrentBuilder::new("notes.txt")
//!     .add_file("notes.txt", b"remember the milk".to_vec())
//!     .piece_length(16384)
//!     .private(true)
//!     .build()?;
//!
//! assert!(torrent.is_single_file());
//! assert_eq!(torrent.piece_count(), 1);
//! # Ok(())
//! # }
//! ```

use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use super::error::MetainfoError;
use super::hasher::PieceHasher;
use super::info_hash::InfoHash;
use super::piece_size::{is_valid_piece_size, round_to_valid_piece_size, PieceSizeStrategy};
use super::source::{ContentSource, FileSource, MemorySource};
use super::torrent::{FileEntry, TorrentDescriptor};
use crate::bencode::{encode, Value};
use crate::constants::DEFAULT_CREATED_BY;

/// A file queued for inclusion.
#[derive(Debug)]
struct BuilderFile {
    /// Path components relative to the torrent root.
    path: Vec<String>,
    source: Box<dyn ContentSource>,
}

/// Consuming builder for [`TorrentDescriptor`].
#[derive(Debug)]
pub struct TorrentBuilder {
    name: String,
    files: Vec<BuilderFile>,
    piece_length: Option<u64>,
    strategy: PieceSizeStrategy,
    announce: Option<String>,
    announce_list: Vec<Vec<String>>,
    url_list: Vec<String>,
    private: bool,
    comment: Option<String>,
    created_by: Option<String>,
    creation_date: Option<i64>,
}

impl TorrentBuilder {
    /// Creates a builder for a torrent called `name`.
    ///
    /// The name is the file name in single-file mode and the root directory
    /// in multi-file mode.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            piece_length: None,
            strategy: PieceSizeStrategy::default(),
            announce: None,
            announce_list: Vec::new(),
            url_list: Vec::new(),
            private: false,
            comment: None,
            created_by: Some(DEFAULT_CREATED_BY.to_string()),
            creation_date: None,
        }
    }

    /// Adds in-memory content at `path` (relative to the torrent root).
    pub fn add_file(self, path: impl AsRef<Path>, data: impl Into<Bytes>) -> Self {
        self.add_source(path, MemorySource::new(data))
    }

    /// Adds any content source at `path` (relative to the torrent root).
    pub fn add_source(
        mut self,
        path: impl AsRef<Path>,
        source: impl ContentSource + 'static,
    ) -> Self {
        self.files.push(BuilderFile {
            path: path_components(path.as_ref()),
            source: Box::new(source),
        });
        self
    }

    /// Adds a file from disk under its own file name.
    pub fn add_file_from_path(self, path: impl AsRef<Path>) -> Result<Self, MetainfoError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or(MetainfoError::InvalidField("file name"))?
            .to_string();

        self.add_file_from_path_as(path, filename)
    }

    /// Adds a file from disk with a custom path in the torrent.
    pub fn add_file_from_path_as(
        self,
        disk_path: impl AsRef<Path>,
        torrent_path: impl AsRef<Path>,
    ) -> Result<Self, MetainfoError> {
        let source = FileSource::new(disk_path);
        // Fail early on missing files and directories.
        source.len()?;
        Ok(self.add_source(torrent_path, source))
    }

    /// Adds every regular file under `dir`, recursively.
    ///
    /// Entries are visited in name order so the same tree always yields the
    /// same file list and info hash.
    pub fn add_directory(self, dir: impl AsRef<Path>) -> Result<Self, MetainfoError> {
        let dir = dir.as_ref();
        self.add_directory_recursive(dir, PathBuf::new())
    }

    fn add_directory_recursive(
        mut self,
        base: &Path,
        relative: PathBuf,
    ) -> Result<Self, MetainfoError> {
        let mut entries = std::fs::read_dir(base.join(&relative))?
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let file_type = entry.file_type()?;
            let child = relative.join(entry.file_name());

            if file_type.is_dir() {
                self = self.add_directory_recursive(base, child)?;
            } else if file_type.is_file() {
                self = self.add_source(&child, FileSource::new(entry.path()));
            }
        }

        Ok(self)
    }

    /// Adds a tracker.
    ///
    /// The first tracker becomes `announce`; each later one gets its own
    /// tier in `announce-list`. A non-empty `announce-list` always starts
    /// with the `announce` URL.
    pub fn add_tracker(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if self.announce.is_none() {
            self.announce = Some(url);
        } else {
            self.announce_list.push(vec![url]);
        }
        self
    }

    /// Adds a whole tier to `announce-list`. Empty tiers are ignored.
    pub fn add_tracker_tier(mut self, urls: Vec<String>) -> Self {
        if !urls.is_empty() {
            self.announce_list.push(urls);
        }
        self
    }

    /// Adds a web seed URL (`url-list`).
    pub fn add_web_seed(mut self, url: impl Into<String>) -> Self {
        self.url_list.push(url.into());
        self
    }

    /// Overrides the piece length.
    ///
    /// Values that are not a power of two within 16 KiB..=16 MiB are
    /// snapped to the nearest valid size.
    pub fn piece_length(mut self, length: u64) -> Self {
        self.piece_length = Some(length);
        self
    }

    /// How to pick the piece length when none is set explicitly.
    pub fn piece_size_strategy(mut self, strategy: PieceSizeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Sets the creation date (Unix seconds). Defaults to the build time.
    pub fn creation_date(mut self, timestamp: i64) -> Self {
        self.creation_date = Some(timestamp);
        self
    }

    /// Hashes all content and produces the descriptor.
    ///
    /// This reads every source once, so it blocks on disk I/O; use
    /// [`build_async`](Self::build_async) from async code.
    pub fn build(self) -> Result<TorrentDescriptor, MetainfoError> {
        self.validate()?;

        let lengths = self
            .files
            .iter()
            .map(|f| f.source.len())
            .collect::<Result<Vec<_>, _>>()?;
        let total_size = lengths
            .iter()
            .try_fold(0u64, |sum, &len| sum.checked_add(len))
            .ok_or(MetainfoError::InvalidField("total size"))?;

        let piece_length = match self.piece_length {
            Some(len) if is_valid_piece_size(len) => len,
            Some(len) => {
                let rounded = round_to_valid_piece_size(len);
                tracing::debug!(requested = len, rounded, "piece length snapped to valid size");
                rounded
            }
            None => self.strategy.piece_size(total_size),
        };

        let mut hasher = PieceHasher::with_expected_size(piece_length, total_size);
        hasher.hash_sources(
            self.files
                .iter()
                .map(|f| -> &dyn ContentSource { f.source.as_ref() }),
        )?;
        let pieces = hasher.finish();

        let single_file = self.files.len() == 1 && self.files[0].path.len() == 1;
        let files: Vec<FileEntry> = if single_file {
            vec![FileEntry {
                length: total_size,
                path: vec![self.name.clone()],
            }]
        } else {
            self.files
                .iter()
                .zip(&lengths)
                .map(|(f, &length)| FileEntry {
                    length,
                    path: f.path.clone(),
                })
                .collect()
        };

        let mut info = Value::dict();
        info.insert(b"name", self.name.as_str());
        info.insert(b"piece length", piece_length as i64);
        info.insert(b"pieces", pieces.as_bytes().clone());
        if self.private {
            info.insert(b"private", 1i64);
        }
        if single_file {
            info.insert(b"length", total_size as i64);
        } else {
            let list: Vec<Value> = files.iter().map(file_value).collect();
            info.insert(b"files", list);
        }

        let info_bytes = Bytes::from(encode(&info)?);
        let info_hash = InfoHash::from_info_bytes(&info_bytes);

        let creation_date = self.creation_date.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0)
        });

        tracing::info!(
            name = %self.name,
            info_hash = %info_hash,
            total_size,
            piece_length,
            pieces = pieces.len(),
            "built torrent"
        );

        let mut announce_list = self.announce_list;
        if let Some(ref announce) = self.announce {
            let listed = announce_list.iter().flatten().any(|u| u == announce);
            if !announce_list.is_empty() && !listed {
                announce_list.insert(0, vec![announce.clone()]);
            }
        }

        Ok(TorrentDescriptor {
            name: self.name,
            piece_length,
            pieces,
            files,
            single_file,
            total_size,
            private: self.private,
            announce: self.announce,
            announce_list,
            url_list: self.url_list,
            comment: self.comment,
            created_by: self.created_by,
            creation_date: Some(creation_date),
            info,
            info_bytes,
            info_hash,
        })
    }

    /// Runs [`build`](Self::build) on the blocking thread pool.
    pub async fn build_async(self) -> Result<TorrentDescriptor, MetainfoError> {
        tokio::task::spawn_blocking(move || self.build())
            .await
            .map_err(|e| MetainfoError::Io(std::io::Error::other(e)))?
    }

    fn validate(&self) -> Result<(), MetainfoError> {
        if self.name.is_empty() {
            return Err(MetainfoError::MissingField("name"));
        }

        if self.files.is_empty() {
            return Err(MetainfoError::NoFiles);
        }

        for file in &self.files {
            if file.path.is_empty() {
                return Err(MetainfoError::InvalidField("file path"));
            }
        }

        Ok(())
    }
}

/// Keeps only normal components; `.`/`..`/roots never reach the torrent.
fn path_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

fn file_value(file: &FileEntry) -> Value {
    let mut entry = Value::dict();
    entry.insert(b"length", file.length as i64);
    let path: Vec<Value> = file.path.iter().map(|c| Value::from(c.as_str())).collect();
    entry.insert(b"path", path);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metainfo::piece_count;

    #[test]
    fn test_single_megabyte_file() {
        let torrent = TorrentBuilder::new("data.bin")
            .add_file("data.bin", vec![0u8; 1_000_000])
            .build()
            .unwrap();

        assert_eq!(torrent.piece_length(), 65536);
        assert_eq!(torrent.piece_count(), 16);
        assert_eq!(torrent.piece_count() as u64, piece_count(1_000_000, 65536));
        assert_eq!(torrent.pieces().as_bytes().len(), 16 * 20);
        assert!(torrent.is_single_file());
    }

    #[test]
    fn test_build_is_deterministic() {
        let make = || {
            TorrentBuilder::new("album")
                .add_file("a.txt", b"first".to_vec())
                .add_file("b/c.txt", b"second".to_vec())
                .add_tracker("udp://tracker.example.com:6969/announce")
                .build()
                .unwrap()
        };

        // Creation dates differ between builds; the info hash must not.
        assert_eq!(make().info_hash(), make().info_hash());
        assert_eq!(make().info_bytes(), make().info_bytes());
    }

    #[test]
    fn test_invalid_piece_length_is_rounded() {
        let torrent = TorrentBuilder::new("x")
            .add_file("x", vec![1u8; 100_000])
            .piece_length(50_000)
            .build()
            .unwrap();
        assert_eq!(torrent.piece_length(), 65536);
        assert_eq!(torrent.piece_count(), 2);

        let torrent = TorrentBuilder::new("x")
            .add_file("x", vec![1u8; 100])
            .piece_length(1)
            .build()
            .unwrap();
        assert_eq!(torrent.piece_length(), 16384);
    }

    #[test]
    fn test_dynamic_strategy() {
        let torrent = TorrentBuilder::new("x")
            .add_file("x", vec![0u8; 1_000_000])
            .piece_size_strategy(PieceSizeStrategy::Dynamic)
            .build()
            .unwrap();
        assert_eq!(torrent.piece_length(), 16384);
    }

    #[test]
    fn test_empty_name_fails() {
        let result = TorrentBuilder::new("").add_file("a", b"x".to_vec()).build();
        assert!(matches!(result, Err(MetainfoError::MissingField("name"))));
    }

    #[test]
    fn test_no_files_fails() {
        let result = TorrentBuilder::new("empty").build();
        assert!(matches!(result, Err(MetainfoError::NoFiles)));
    }

    #[test]
    fn test_dot_components_are_dropped() {
        let torrent = TorrentBuilder::new("root")
            .add_file("./dir/../file.txt", b"x".to_vec())
            .add_file("other.txt", b"y".to_vec())
            .build()
            .unwrap();
        assert_eq!(torrent.files()[0].path, vec!["dir", "file.txt"]);

        let result = TorrentBuilder::new("root").add_file("..", b"x".to_vec()).build();
        assert!(matches!(result, Err(MetainfoError::InvalidField("file path"))));
    }

    #[test]
    fn test_zero_length_content() {
        let torrent = TorrentBuilder::new("empty.txt")
            .add_file("empty.txt", Vec::new())
            .build()
            .unwrap();
        assert_eq!(torrent.total_size(), 0);
        assert_eq!(torrent.piece_count(), 0);
        assert_eq!(torrent.piece_length(), 16384);
    }

    /// Declares a length it cannot deliver.
    #[derive(Debug)]
    struct HugeSource;

    impl ContentSource for HugeSource {
        fn len(&self) -> std::io::Result<u64> {
            Ok(u64::MAX / 2 + 1)
        }

        fn open(&self) -> std::io::Result<Box<dyn std::io::Read + Send + '_>> {
            Ok(Box::new(std::io::empty()))
        }
    }

    #[test]
    fn test_total_size_overflow_fails() {
        let result = TorrentBuilder::new("huge")
            .add_source("a", HugeSource)
            .add_source("b", HugeSource)
            .build();
        assert!(matches!(result, Err(MetainfoError::InvalidField("total size"))));
    }

    #[test]
    fn test_oversized_declared_length_is_a_size_mismatch() {
        let result = TorrentBuilder::new("huge").add_source("a", HugeSource).build();
        assert!(matches!(
            result,
            Err(MetainfoError::SizeMismatch { actual: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_build_async() {
        let torrent = TorrentBuilder::new("async.bin")
            .add_file("async.bin", vec![9u8; 40_000])
            .build_async()
            .await
            .unwrap();
        assert_eq!(torrent.piece_length(), 32768);
        assert_eq!(torrent.piece_count(), 2);
    }
}
