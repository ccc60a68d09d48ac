use std::net::SocketAddr;
use std::time::Instant;

use async_trait::async_trait;
use rand::Rng as _;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;

use super::client::TrackerClient;
use super::config::TrackerConfig;
use super::error::TrackerError;
use super::response::{
    parse_compact_peers, AnnounceRequest, AnnounceResponse, AnnounceResult, ScrapeEntry,
    ScrapeResult,
};
use super::url::{is_udp_tracker, TrackerUrl};
use crate::constants::{
    UDP_ACTION_ANNOUNCE, UDP_ACTION_CONNECT, UDP_ACTION_ERROR, UDP_ACTION_SCRAPE,
    UDP_ANNOUNCE_REQUEST_LEN, UDP_MAX_DATAGRAM, UDP_MAX_SCRAPE_HASHES, UDP_PROTOCOL_ID,
};
use crate::metainfo::InfoHash;

/// UDP tracker client ([BEP-15]).
///
/// Every call binds a fresh socket, runs connect followed by announce or
/// scrape, and drops the socket; connection ids are never reused.
///
/// [BEP-15]: http://bittorrent.org/beps/bep_0015.html
#[derive(Debug, Clone, Default)]
pub struct UdpTrackerClient {
    config: TrackerConfig,
}

impl UdpTrackerClient {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    async fn try_announce(
        &self,
        url: &str,
        request: &AnnounceRequest,
    ) -> Result<AnnounceResponse, TrackerError> {
        let socket = self.open(url).await?;
        let connection_id = self.connect(&socket, url).await?;

        let transaction_id: u32 = rand::rng().random();
        let key: u32 = rand::rng().random();

        let mut packet = Vec::with_capacity(UDP_ANNOUNCE_REQUEST_LEN);
        packet.extend_from_slice(&connection_id.to_be_bytes());
        packet.extend_from_slice(&UDP_ACTION_ANNOUNCE.to_be_bytes());
        packet.extend_from_slice(&transaction_id.to_be_bytes());
        packet.extend_from_slice(request.info_hash.as_bytes());
        packet.extend_from_slice(request.peer_id.as_bytes());
        packet.extend_from_slice(&request.downloaded.to_be_bytes());
        packet.extend_from_slice(&request.left.to_be_bytes());
        packet.extend_from_slice(&request.uploaded.to_be_bytes());
        packet.extend_from_slice(&request.event.as_udp_id().to_be_bytes());
        packet.extend_from_slice(&0u32.to_be_bytes()); // IP address (0 = sender)
        packet.extend_from_slice(&key.to_be_bytes());
        packet.extend_from_slice(&(-1i32).to_be_bytes()); // num_want (-1 = default)
        packet.extend_from_slice(&request.port.to_be_bytes());

        let datagram = self.exchange(&socket, &packet).await?;
        let body = check_response(&datagram, transaction_id, UDP_ACTION_ANNOUNCE, 20)?;

        Ok(AnnounceResponse {
            interval: read_u32(body, 0),
            leechers: read_u32(body, 4),
            seeders: read_u32(body, 8),
            min_interval: None,
            peers: parse_compact_peers(&body[12..]),
            warning_message: None,
            tracker_id: None,
        })
    }

    async fn try_scrape(
        &self,
        url: &str,
        info_hashes: &[InfoHash],
    ) -> Result<Vec<ScrapeEntry>, TrackerError> {
        if info_hashes.is_empty() {
            return Err(TrackerError::InvalidRequest(
                "udp scrape needs at least one info hash".into(),
            ));
        }
        if info_hashes.len() > UDP_MAX_SCRAPE_HASHES {
            return Err(TrackerError::InvalidRequest(format!(
                "udp scrape takes at most {} info hashes, got {}",
                UDP_MAX_SCRAPE_HASHES,
                info_hashes.len()
            )));
        }

        let socket = self.open(url).await?;
        let connection_id = self.connect(&socket, url).await?;

        let transaction_id: u32 = rand::rng().random();
        let mut packet = Vec::with_capacity(16 + 20 * info_hashes.len());
        packet.extend_from_slice(&connection_id.to_be_bytes());
        packet.extend_from_slice(&UDP_ACTION_SCRAPE.to_be_bytes());
        packet.extend_from_slice(&transaction_id.to_be_bytes());
        for hash in info_hashes {
            packet.extend_from_slice(hash.as_bytes());
        }

        let datagram = self.exchange(&socket, &packet).await?;
        let min_len = 8 + 12 * info_hashes.len();
        let body = check_response(&datagram, transaction_id, UDP_ACTION_SCRAPE, min_len)?;

        Ok(info_hashes
            .iter()
            .zip(body.chunks_exact(12))
            .map(|(hash, entry)| ScrapeEntry {
                info_hash: *hash,
                seeders: read_u32(entry, 0),
                completed: read_u32(entry, 4),
                leechers: read_u32(entry, 8),
            })
            .collect())
    }

    /// Resolves the tracker and returns a socket connected to it.
    async fn open(&self, url: &str) -> Result<UdpSocket, TrackerError> {
        let tracker = TrackerUrl::parse(url)?;
        if !tracker.is_udp() {
            return Err(TrackerError::UnsupportedScheme(tracker.scheme));
        }

        let mut addrs = timeout(
            self.config.timeout,
            lookup_host((tracker.host.as_str(), tracker.port)),
        )
        .await
        .map_err(|_| TrackerError::Timeout)??;
        let addr = addrs
            .next()
            .ok_or_else(|| TrackerError::InvalidUrl(format!("{url}: host has no address")))?;

        let bind: SocketAddr = if addr.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(addr).await?;
        Ok(socket)
    }

    async fn connect(&self, socket: &UdpSocket, url: &str) -> Result<u64, TrackerError> {
        let transaction_id: u32 = rand::rng().random();

        let mut packet = Vec::with_capacity(16);
        packet.extend_from_slice(&UDP_PROTOCOL_ID.to_be_bytes());
        packet.extend_from_slice(&UDP_ACTION_CONNECT.to_be_bytes());
        packet.extend_from_slice(&transaction_id.to_be_bytes());

        let datagram = self.exchange(socket, &packet).await?;
        let body = check_response(&datagram, transaction_id, UDP_ACTION_CONNECT, 16)?;
        let connection_id = u64::from_be_bytes([
            body[0], body[1], body[2], body[3], body[4], body[5], body[6], body[7],
        ]);

        tracing::debug!(tracker = %url, connection_id, "udp connected");
        Ok(connection_id)
    }

    /// Sends one datagram and waits for one reply.
    async fn exchange(&self, socket: &UdpSocket, packet: &[u8]) -> Result<Vec<u8>, TrackerError> {
        socket.send(packet).await?;

        let mut buf = vec![0u8; UDP_MAX_DATAGRAM];
        match timeout(self.config.timeout, socket.recv(&mut buf)).await {
            Ok(Ok(n)) => {
                buf.truncate(n);
                Ok(buf)
            }
            Ok(Err(e)) => Err(TrackerError::Io(e)),
            Err(_) => Err(TrackerError::Timeout),
        }
    }
}

#[async_trait]
impl TrackerClient for UdpTrackerClient {
    fn supports(&self, url: &str) -> bool {
        is_udp_tracker(url)
    }

    async fn announce(&self, url: &str, request: &AnnounceRequest) -> AnnounceResult {
        tracing::debug!(tracker = %url, info_hash = %request.info_hash, "udp announce");

        let start = Instant::now();
        let outcome = self.try_announce(url, request).await;

        match &outcome {
            Ok(response) => tracing::debug!(
                tracker = %url,
                peers = response.peers.len(),
                seeders = response.seeders,
                leechers = response.leechers,
                interval = response.interval,
                "announce complete"
            ),
            Err(e) => tracing::warn!(tracker = %url, error = %e, "announce failed"),
        }

        AnnounceResult::from_outcome(url, outcome, start.elapsed())
    }

    async fn scrape(&self, url: &str, info_hashes: &[InfoHash]) -> ScrapeResult {
        let start = Instant::now();
        let outcome = self.try_scrape(url, info_hashes).await;

        if let Err(ref e) = outcome {
            tracing::warn!(tracker = %url, error = %e, "scrape failed");
        }

        ScrapeResult::from_outcome(url, outcome, start.elapsed())
    }
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Validates a response header and returns the payload after it.
///
/// The transaction id is checked first, so a spoofed error datagram is a
/// protocol violation rather than a tracker failure.
pub(crate) fn check_response(
    datagram: &[u8],
    transaction_id: u32,
    expected_action: u32,
    min_len: usize,
) -> Result<&[u8], TrackerError> {
    if datagram.len() < 8 {
        return Err(TrackerError::Protocol(format!(
            "datagram too short: {} bytes",
            datagram.len()
        )));
    }

    let action = read_u32(datagram, 0);
    let received = read_u32(datagram, 4);

    if received != transaction_id {
        return Err(TrackerError::Protocol(format!(
            "transaction id mismatch: sent {:#010x}, got {:#010x}",
            transaction_id, received
        )));
    }

    if action == UDP_ACTION_ERROR {
        return Err(TrackerError::Failure(
            String::from_utf8_lossy(&datagram[8..]).into_owned(),
        ));
    }

    if action != expected_action {
        return Err(TrackerError::Protocol(format!(
            "unexpected action {}, expected {}",
            action, expected_action
        )));
    }

    if datagram.len() < min_len {
        return Err(TrackerError::Protocol(format!(
            "response too short: {} bytes, need {}",
            datagram.len(),
            min_len
        )));
    }

    Ok(&datagram[8..])
}
