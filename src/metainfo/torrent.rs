use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use bytes::Bytes;

use super::error::MetainfoError;
use super::hasher::PieceHashes;
use super::info_hash::InfoHash;
use super::magnet::MagnetLink;
use crate::bencode::{decode, encode, encode_to, Value};

/// A file inside a torrent.
///
/// In single-file mode there is one entry whose path is just the torrent
/// name. In multi-file mode paths are relative to the torrent's root
/// directory (which is the name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub length: u64,
    pub path: Vec<String>,
}

impl FileEntry {
    /// Path components joined with `/`.
    pub fn display_path(&self) -> String {
        self.path.join("/")
    }
}

/// An immutable torrent descriptor.
///
/// Produced by [`TorrentBuilder`](super::TorrentBuilder) or parsed with
/// [`TorrentDescriptor::from_bytes`]. The info hash is computed once from the
/// canonical encoding of the info dictionary and never changes afterwards.
///
/// ```
/// use swarmseed::metainfo::{TorrentBuilder, TorrentDescriptor};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let torrent = TorrentBuilder::new("hello.txt")
///     .add_file("hello.txt", b"Hello, swarm!".to_vec())
///     .add_tracker("udp://tracker.example.com:6969/announce")
///     .creation_date(1_700_000_000)
///     .build()?;
///
/// let bytes = torrent.to_bytes()?;
/// let parsed = TorrentDescriptor::from_bytes(&bytes)?;
/// assert_eq!(parsed.info_hash(), torrent.info_hash());
/// assert_eq!(parsed.total_size(), 13);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TorrentDescriptor {
    pub(super) name: String,
    pub(super) piece_length: u64,
    pub(super) pieces: PieceHashes,
    pub(super) files: Vec<FileEntry>,
    pub(super) single_file: bool,
    pub(super) total_size: u64,
    pub(super) private: bool,
    pub(super) announce: Option<String>,
    pub(super) announce_list: Vec<Vec<String>>,
    pub(super) url_list: Vec<String>,
    pub(super) comment: Option<String>,
    pub(super) created_by: Option<String>,
    pub(super) creation_date: Option<i64>,
    pub(super) info: Value,
    pub(super) info_bytes: Bytes,
    pub(super) info_hash: InfoHash,
}

impl TorrentDescriptor {
    /// Parses an encoded `.torrent` file.
    ///
    /// The info hash is recomputed from the canonical re-encoding of the
    /// info dictionary, so unknown info keys still contribute to it.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetainfoError> {
        let root = decode(data)?;
        let dict = root.as_dict().ok_or(MetainfoError::InvalidField("root"))?;

        let info = dict
            .get(b"info".as_slice())
            .ok_or(MetainfoError::MissingField("info"))?
            .clone();
        let info_dict = info.as_dict().ok_or(MetainfoError::InvalidField("info"))?;

        let name = info_dict
            .get(b"name".as_slice())
            .and_then(|v| v.as_str())
            .ok_or(MetainfoError::MissingField("name"))?
            .to_string();

        let piece_length = info_dict
            .get(b"piece length".as_slice())
            .and_then(|v| v.as_integer())
            .ok_or(MetainfoError::MissingField("piece length"))?;
        if piece_length <= 0 {
            return Err(MetainfoError::InvalidField("piece length"));
        }

        let pieces = info_dict
            .get(b"pieces".as_slice())
            .and_then(|v| v.as_bytes())
            .ok_or(MetainfoError::MissingField("pieces"))?;
        let pieces = PieceHashes::from_bytes(pieces.clone())?;

        let private = info_dict
            .get(b"private".as_slice())
            .and_then(|v| v.as_integer())
            == Some(1);

        let (files, single_file) = parse_files(&name, info_dict)?;
        let total_size = files.iter().map(|f| f.length).sum();

        let info_bytes = Bytes::from(encode(&info)?);
        let info_hash = InfoHash::from_info_bytes(&info_bytes);

        let announce_list = dict
            .get(b"announce-list".as_slice())
            .and_then(|v| v.as_list())
            .map(|tiers| {
                tiers
                    .iter()
                    .filter_map(|tier| tier.as_list().map(|urls| string_list(urls)))
                    .filter(|tier: &Vec<String>| !tier.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let url_list = match dict.get(b"url-list".as_slice()) {
            Some(Value::List(urls)) => string_list(urls),
            Some(v) => v.as_str().map(|s| vec![s.to_string()]).unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(Self {
            name,
            piece_length: piece_length as u64,
            pieces,
            files,
            single_file,
            total_size,
            private,
            announce: text_field(dict, b"announce"),
            announce_list,
            url_list,
            comment: text_field(dict, b"comment"),
            created_by: text_field(dict, b"created by"),
            creation_date: dict
                .get(b"creation date".as_slice())
                .and_then(|v| v.as_integer()),
            info,
            info_bytes,
            info_hash,
        })
    }

    /// The full torrent dictionary.
    pub fn to_value(&self) -> Value {
        let mut root = Value::dict();

        if let Some(ref announce) = self.announce {
            root.insert(b"announce", announce.as_str());
        }

        if !self.announce_list.is_empty() {
            let tiers: Vec<Value> = self
                .announce_list
                .iter()
                .map(|tier| Value::List(tier.iter().map(|u| Value::from(u.as_str())).collect()))
                .collect();
            root.insert(b"announce-list", tiers);
        }

        if let Some(ref comment) = self.comment {
            root.insert(b"comment", comment.as_str());
        }
        if let Some(ref created_by) = self.created_by {
            root.insert(b"created by", created_by.as_str());
        }
        if let Some(date) = self.creation_date {
            root.insert(b"creation date", date);
        }

        match self.url_list.as_slice() {
            [] => {}
            [single] => root.insert(b"url-list", single.as_str()),
            many => {
                let urls: Vec<Value> = many.iter().map(|u| Value::from(u.as_str())).collect();
                root.insert(b"url-list", urls);
            }
        }

        root.insert(b"info", self.info.clone());
        root
    }

    /// Encodes the full torrent file.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MetainfoError> {
        Ok(encode(&self.to_value())?)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), MetainfoError> {
        encode_to(&self.to_value(), writer)?;
        Ok(())
    }

    /// Writes the encoded torrent to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), MetainfoError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)?;

        tracing::info!(
            path = %path.display(),
            info_hash = %self.info_hash,
            bytes = bytes.len(),
            "saved torrent"
        );
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info_hash(&self) -> InfoHash {
        self.info_hash
    }

    /// Canonical encoding of the info dictionary; its SHA-1 is the info hash.
    pub fn info_bytes(&self) -> &Bytes {
        &self.info_bytes
    }

    pub fn piece_length(&self) -> u64 {
        self.piece_length
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn pieces(&self) -> &PieceHashes {
        &self.pieces
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Whether the info dictionary uses `length` rather than `files`.
    pub fn is_single_file(&self) -> bool {
        self.single_file
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn announce(&self) -> Option<&str> {
        self.announce.as_deref()
    }

    pub fn announce_list(&self) -> &[Vec<String>] {
        &self.announce_list
    }

    pub fn web_seeds(&self) -> &[String] {
        &self.url_list
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Unix timestamp in seconds.
    pub fn creation_date(&self) -> Option<i64> {
        self.creation_date
    }

    /// Trackers grouped by tier, primary first.
    ///
    /// The `announce` URL forms its own leading tier unless it already
    /// appears somewhere in `announce-list`.
    pub fn tracker_tiers(&self) -> Vec<Vec<String>> {
        let mut tiers = Vec::with_capacity(self.announce_list.len() + 1);

        if let Some(ref announce) = self.announce {
            let listed = self.announce_list.iter().flatten().any(|u| u == announce);
            if !listed {
                tiers.push(vec![announce.clone()]);
            }
        }

        tiers.extend(self.announce_list.iter().cloned());
        tiers
    }

    /// All tracker URLs, primary first, without duplicates.
    pub fn trackers(&self) -> Vec<String> {
        let mut trackers = Vec::new();

        if let Some(ref announce) = self.announce {
            trackers.push(announce.clone());
        }

        for tracker in self.announce_list.iter().flatten() {
            if !trackers.contains(tracker) {
                trackers.push(tracker.clone());
            }
        }

        trackers
    }

    /// Total size as `B`, `KB`, `MB` or `GB` (binary multiples, two decimals).
    pub fn human_readable_size(&self) -> String {
        human_readable_size(self.total_size)
    }

    /// A magnet link carrying the info hash, name, size, trackers and web seeds.
    pub fn magnet_link(&self) -> MagnetLink {
        MagnetLink::from_descriptor(self)
    }
}

/// Formats a byte count the way torrent listings usually show it.
pub fn human_readable_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        n if n < KB => format!("{} B", n),
        n if n < MB => format!("{:.2} KB", n as f64 / KB as f64),
        n if n < GB => format!("{:.2} MB", n as f64 / MB as f64),
        n => format!("{:.2} GB", n as f64 / GB as f64),
    }
}

fn parse_files(
    name: &str,
    info: &BTreeMap<Bytes, Value>,
) -> Result<(Vec<FileEntry>, bool), MetainfoError> {
    if let Some(length) = info.get(b"length".as_slice()) {
        let length = length
            .as_integer()
            .filter(|n| *n >= 0)
            .ok_or(MetainfoError::InvalidField("length"))?;
        let entry = FileEntry {
            length: length as u64,
            path: vec![name.to_string()],
        };
        return Ok((vec![entry], true));
    }

    let list = info
        .get(b"files".as_slice())
        .ok_or(MetainfoError::MissingField("length or files"))?
        .as_list()
        .ok_or(MetainfoError::InvalidField("files"))?;

    let mut files = Vec::with_capacity(list.len());
    for item in list {
        let file = item.as_dict().ok_or(MetainfoError::InvalidField("files"))?;

        let length = file
            .get(b"length".as_slice())
            .and_then(|v| v.as_integer())
            .ok_or(MetainfoError::MissingField("file length"))?;
        if length < 0 {
            return Err(MetainfoError::InvalidField("file length"));
        }

        let components = file
            .get(b"path".as_slice())
            .and_then(|v| v.as_list())
            .ok_or(MetainfoError::MissingField("file path"))?;
        let path = components
            .iter()
            .map(|c| c.as_str().map(String::from))
            .collect::<Option<Vec<_>>>()
            .filter(|p| !p.is_empty())
            .ok_or(MetainfoError::InvalidField("file path"))?;

        files.push(FileEntry {
            length: length as u64,
            path,
        });
    }

    Ok((files, false))
}

fn text_field(dict: &BTreeMap<Bytes, Value>, key: &[u8]) -> Option<String> {
    dict.get(key).and_then(|v| v.as_str()).map(String::from)
}

fn string_list(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect()
}
