use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use super::error::{TrackerError, TrackerErrorKind};
use super::peer_id::PeerId;
use crate::metainfo::InfoHash;

/// A peer returned from a tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub addr: SocketAddr,
    /// Only present in non-compact (dictionary) HTTP responses.
    pub peer_id: Option<PeerId>,
}

impl Peer {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            peer_id: None,
        }
    }

    pub fn with_id(addr: SocketAddr, peer_id: PeerId) -> Self {
        Self {
            addr,
            peer_id: Some(peer_id),
        }
    }

    /// Parses 4 bytes of IPv4 address and 2 bytes of port, both big-endian.
    pub fn from_compact_v4(bytes: &[u8]) -> Option<Self> {
        let chunk: &[u8; 6] = bytes.get(..6)?.try_into().ok()?;
        let ip = Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]);
        let port = u16::from_be_bytes([chunk[4], chunk[5]]);
        Some(Self::new(SocketAddr::new(IpAddr::V4(ip), port)))
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Parses a compact peer string; a trailing partial entry is ignored.
pub fn parse_compact_peers(data: &[u8]) -> Vec<Peer> {
    data.chunks_exact(6)
        .filter_map(Peer::from_compact_v4)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerEvent {
    #[default]
    None,
    Started,
    Stopped,
    Completed,
}

impl TrackerEvent {
    /// The HTTP `event` value; empty for [`TrackerEvent::None`].
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerEvent::None => "",
            TrackerEvent::Started => "started",
            TrackerEvent::Stopped => "stopped",
            TrackerEvent::Completed => "completed",
        }
    }

    pub fn as_udp_id(&self) -> u32 {
        match self {
            TrackerEvent::None => 0,
            TrackerEvent::Completed => 1,
            TrackerEvent::Started => 2,
            TrackerEvent::Stopped => 3,
        }
    }
}

/// Parameters of one announce.
#[derive(Debug, Clone)]
pub struct AnnounceRequest {
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: u64,
    pub event: TrackerEvent,
}

impl AnnounceRequest {
    pub fn new(info_hash: InfoHash, peer_id: PeerId, port: u16) -> Self {
        Self {
            info_hash,
            peer_id,
            port,
            uploaded: 0,
            downloaded: 0,
            left: 0,
            event: TrackerEvent::None,
        }
    }

    pub fn with_event(mut self, event: TrackerEvent) -> Self {
        self.event = event;
        self
    }

    pub fn with_progress(mut self, uploaded: u64, downloaded: u64, left: u64) -> Self {
        self.uploaded = uploaded;
        self.downloaded = downloaded;
        self.left = left;
        self
    }
}

/// Outcome class of a tracker call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    Success,
    Failure,
    Timeout,
}

/// A successfully parsed announce response.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnnounceResponse {
    pub interval: u32,
    pub min_interval: Option<u32>,
    pub seeders: u32,
    pub leechers: u32,
    pub peers: Vec<Peer>,
    pub warning_message: Option<String>,
    pub tracker_id: Option<String>,
}

/// The result of announcing to one tracker.
///
/// Failures are values, not errors: `status` says what happened and, for
/// anything but [`TrackerStatus::Success`], `error` and `error_kind` say why.
#[derive(Debug, Clone)]
pub struct AnnounceResult {
    pub tracker_url: String,
    pub status: TrackerStatus,
    pub seeders: u32,
    pub leechers: u32,
    /// Seconds until the next regular announce.
    pub interval: u32,
    pub min_interval: Option<u32>,
    pub peers: Vec<Peer>,
    pub warning_message: Option<String>,
    pub tracker_id: Option<String>,
    pub error: Option<String>,
    pub error_kind: Option<TrackerErrorKind>,
    pub elapsed: Duration,
}

impl AnnounceResult {
    pub(crate) fn from_outcome(
        tracker_url: &str,
        outcome: Result<AnnounceResponse, TrackerError>,
        elapsed: Duration,
    ) -> Self {
        match outcome {
            Ok(response) => Self {
                tracker_url: tracker_url.to_string(),
                status: TrackerStatus::Success,
                seeders: response.seeders,
                leechers: response.leechers,
                interval: response.interval,
                min_interval: response.min_interval,
                peers: response.peers,
                warning_message: response.warning_message,
                tracker_id: response.tracker_id,
                error: None,
                error_kind: None,
                elapsed,
            },
            Err(err) => Self::failed(tracker_url, &err, elapsed),
        }
    }

    pub(crate) fn failed(tracker_url: &str, err: &TrackerError, elapsed: Duration) -> Self {
        Self {
            tracker_url: tracker_url.to_string(),
            status: status_of(err),
            seeders: 0,
            leechers: 0,
            interval: 0,
            min_interval: None,
            peers: Vec::new(),
            warning_message: None,
            tracker_id: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TrackerStatus::Success
    }
}

/// Swarm statistics for one torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeEntry {
    pub info_hash: InfoHash,
    pub seeders: u32,
    pub completed: u32,
    pub leechers: u32,
}

/// The result of scraping one tracker.
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub tracker_url: String,
    pub status: TrackerStatus,
    pub entries: Vec<ScrapeEntry>,
    pub error: Option<String>,
    pub error_kind: Option<TrackerErrorKind>,
    pub elapsed: Duration,
}

impl ScrapeResult {
    pub(crate) fn from_outcome(
        tracker_url: &str,
        outcome: Result<Vec<ScrapeEntry>, TrackerError>,
        elapsed: Duration,
    ) -> Self {
        let (status, entries, error, error_kind) = match outcome {
            Ok(entries) => (TrackerStatus::Success, entries, None, None),
            Err(err) => (
                status_of(&err),
                Vec::new(),
                Some(err.to_string()),
                Some(err.kind()),
            ),
        };

        Self {
            tracker_url: tracker_url.to_string(),
            status,
            entries,
            error,
            error_kind,
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TrackerStatus::Success
    }

    pub fn get(&self, info_hash: &InfoHash) -> Option<&ScrapeEntry> {
        self.entries.iter().find(|e| &e.info_hash == info_hash)
    }
}

fn status_of(err: &TrackerError) -> TrackerStatus {
    if err.is_timeout() {
        TrackerStatus::Timeout
    } else {
        TrackerStatus::Failure
    }
}
