use std::collections::HashMap;
use std::fmt;

use super::error::MetainfoError;
use super::info_hash::InfoHash;
use super::torrent::TorrentDescriptor;

const BTIH_PREFIX: &str = "urn:btih:";

/// A `magnet:?xt=urn:btih:...` URI.
///
/// Only the URI itself is handled here; fetching metadata from peers is out
/// of scope.
///
/// ```
/// use swarmseed::metainfo::{InfoHash, MagnetLink};
///
/// let hash = InfoHash::new([0xab; 20]);
/// let magnet = MagnetLink::new(hash)
///     .with_display_name("file name.txt")
///     .with_exact_length(1000)
///     .with_tracker("udp://tracker.example.com:6969/announce");
///
/// let uri = magnet.to_uri();
/// assert!(uri.starts_with("magnet:?xt=urn:btih:abababab"));
/// assert!(uri.contains("&dn=file%20name.txt"));
/// assert!(uri.contains("&xl=1000"));
///
/// assert_eq!(MagnetLink::parse(&uri).unwrap(), magnet);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetLink {
    pub info_hash: InfoHash,
    pub display_name: Option<String>,
    pub exact_length: Option<u64>,
    pub trackers: Vec<String>,
    pub web_seeds: Vec<String>,
}

impl MagnetLink {
    pub fn new(info_hash: InfoHash) -> Self {
        Self {
            info_hash,
            display_name: None,
            exact_length: None,
            trackers: Vec::new(),
            web_seeds: Vec::new(),
        }
    }

    pub fn from_descriptor(torrent: &TorrentDescriptor) -> Self {
        Self {
            info_hash: torrent.info_hash(),
            display_name: Some(torrent.name().to_string()),
            exact_length: Some(torrent.total_size()).filter(|n| *n > 0),
            trackers: torrent.trackers(),
            web_seeds: torrent.web_seeds().to_vec(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_exact_length(mut self, length: u64) -> Self {
        self.exact_length = Some(length);
        self
    }

    pub fn with_tracker(mut self, url: impl Into<String>) -> Self {
        self.trackers.push(url.into());
        self
    }

    pub fn with_web_seed(mut self, url: impl Into<String>) -> Self {
        self.web_seeds.push(url.into());
        self
    }

    /// Parses a magnet URI with a 40-digit hex or 32-character base32 BTIH.
    ///
    /// Unknown parameters are ignored, as is an `xl` that is not a number.
    pub fn parse(uri: &str) -> Result<Self, MetainfoError> {
        let query = uri.strip_prefix("magnet:?").ok_or_else(|| {
            MetainfoError::InvalidMagnetLink("missing magnet:? prefix".into())
        })?;
        let params = parse_query_string(query);

        let xt = params
            .get("xt")
            .and_then(|v| v.first())
            .ok_or_else(|| MetainfoError::InvalidMagnetLink("missing xt parameter".into()))?;

        let hash = xt.strip_prefix(BTIH_PREFIX).ok_or_else(|| {
            MetainfoError::InvalidMagnetLink("xt must start with urn:btih:".into())
        })?;

        let info_hash = match hash.len() {
            40 => InfoHash::from_hex(hash)?,
            32 => {
                let decoded = base32_decode(hash)
                    .ok_or_else(|| MetainfoError::InvalidMagnetLink("invalid base32".into()))?;
                InfoHash::from_bytes(&decoded)?
            }
            _ => {
                return Err(MetainfoError::InvalidMagnetLink(
                    "invalid info hash length".into(),
                ))
            }
        };

        let first = |key: &str| params.get(key).and_then(|v| v.first()).map(|s| url_decode(s));
        let all = |key: &str| {
            params
                .get(key)
                .map(|v| v.iter().map(|s| url_decode(s)).collect::<Vec<_>>())
                .unwrap_or_default()
        };

        Ok(Self {
            info_hash,
            display_name: first("dn"),
            exact_length: first("xl").and_then(|s| s.parse().ok()),
            trackers: all("tr"),
            web_seeds: all("ws"),
        })
    }

    pub fn to_uri(&self) -> String {
        let mut uri = format!("magnet:?xt={}{}", BTIH_PREFIX, self.info_hash.to_hex());

        if let Some(ref name) = self.display_name {
            if !name.is_empty() {
                uri.push_str(&format!("&dn={}", url_encode(name)));
            }
        }

        if let Some(length) = self.exact_length {
            uri.push_str(&format!("&xl={}", length));
        }

        for tracker in &self.trackers {
            uri.push_str(&format!("&tr={}", url_encode(tracker)));
        }

        for ws in &self.web_seeds {
            uri.push_str(&format!("&ws={}", url_encode(ws)));
        }

        uri
    }
}

impl fmt::Display for MagnetLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

fn parse_query_string(query: &str) -> HashMap<&str, Vec<&str>> {
    let mut params: HashMap<&str, Vec<&str>> = HashMap::new();

    for part in query.split('&') {
        if let Some((key, value)) = part.split_once('=') {
            params.entry(key).or_default().push(value);
        }
    }

    params
}

/// Percent-decodes into bytes first so multi-byte UTF-8 sequences survive.
fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let decoded = bytes
                    .get(i + 1..i + 3)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match decoded {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                        continue;
                    }
                    None => out.push(b'%'),
                }
            }
            b'+' => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn url_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);

    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }

    result
}

fn base32_decode(input: &str) -> Option<Vec<u8>> {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

    let input = input.trim_end_matches('=');
    let mut output = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u64 = 0;
    let mut bits = 0;

    for c in input.bytes() {
        let value = ALPHABET
            .iter()
            .position(|&x| x == c.to_ascii_uppercase())? as u64;
        buffer = (buffer << 5) | value;
        bits += 5;

        if bits >= 8 {
            bits -= 8;
            output.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    Some(output)
}
