use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};

use super::client::TrackerClient;
use super::config::TrackerConfig;
use super::error::TrackerError;
use super::peer_id::PeerId;
use super::response::{
    parse_compact_peers, AnnounceRequest, AnnounceResponse, AnnounceResult, Peer, ScrapeEntry,
    ScrapeResult,
};
use super::url::{is_http_tracker, scrape_url};
use crate::bencode::{decode, Value};
use crate::constants::{DEFAULT_ANNOUNCE_INTERVAL, DEFAULT_MIN_INTERVAL};
use crate::metainfo::InfoHash;

/// HTTP(S) tracker client ([BEP-3], [BEP-23], [BEP-48]).
///
/// [BEP-3]: http://bittorrent.org/beps/bep_0003.html
/// [BEP-23]: http://bittorrent.org/beps/bep_0023.html
/// [BEP-48]: http://bittorrent.org/beps/bep_0048.html
#[derive(Debug, Clone)]
pub struct HttpTrackerClient {
    client: Client,
    config: TrackerConfig,
}

impl HttpTrackerClient {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(TrackerError::Http)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    async fn try_announce(
        &self,
        url: &str,
        request: &AnnounceRequest,
    ) -> Result<AnnounceResponse, TrackerError> {
        let url = announce_url(url, request, self.config.numwant);
        let body = self.get(&url).await?;
        parse_announce(&body)
    }

    async fn try_scrape(
        &self,
        url: &str,
        info_hashes: &[InfoHash],
    ) -> Result<Vec<ScrapeEntry>, TrackerError> {
        let mut url = scrape_url(url)?;
        for (i, hash) in info_hashes.iter().enumerate() {
            let sep = if i == 0 && !url.contains('?') { '?' } else { '&' };
            let _ = write!(url, "{}info_hash={}", sep, percent_encode(hash.as_bytes()));
        }

        tracing::debug!(url = %url, "scraping");
        let body = self.get(&url).await?;
        parse_scrape(&body, info_hashes)
    }

    async fn get(&self, url: &str) -> Result<Bytes, TrackerError> {
        let response = self.client.get(url).send().await.map_err(http_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TrackerError::HttpStatus(status.as_u16()));
        }

        response.bytes().await.map_err(http_error)
    }
}

#[async_trait]
impl TrackerClient for HttpTrackerClient {
    fn supports(&self, url: &str) -> bool {
        is_http_tracker(url)
    }

    async fn announce(&self, url: &str, request: &AnnounceRequest) -> AnnounceResult {
        tracing::debug!(tracker = %url, info_hash = %request.info_hash, "http announce");

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

fn http_error(e: reqwest::Error) -> TrackerError {
    if e.is_timeout() {
        TrackerError::Timeout
    } else {
        TrackerError::Http(e)
    }
}

/// Builds the announce GET URL, appending to any existing query string.
pub(crate) fn announce_url(base: &str, request: &AnnounceRequest, numwant: u32) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    let mut url = format!(
        "{}{}info_hash={}&peer_id={}&port={}&uploaded={}&downloaded={}&left={}&compact=1&numwant={}",
        base,
        sep,
        percent_encode(request.info_hash.as_bytes()),
        percent_encode(request.peer_id.as_bytes()),
        request.port,
        request.uploaded,
        request.downloaded,
        request.left,
        numwant
    );

    let event = request.event.as_str();
    if !event.is_empty() {
        url.push_str("&event=");
        url.push_str(event);
    }

    url
}

/// Encodes every byte as `%XX`, unreserved characters included.
fn percent_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for b in bytes {
        let _ = write!(out, "%{:02X}", b);
    }
    out
}

fn response_dict(body: &[u8]) -> Result<BTreeMap<Bytes, Value>, TrackerError> {
    let value = decode(body)?;
    let dict = value
        .into_dict()
        .ok_or_else(|| TrackerError::Protocol("response is not a dictionary".into()))?;

    if let Some(reason) = dict.get(b"failure reason".as_slice()).and_then(|v| v.as_bytes()) {
        return Err(TrackerError::Failure(
            String::from_utf8_lossy(reason).into_owned(),
        ));
    }

    Ok(dict)
}

fn count(dict: &BTreeMap<Bytes, Value>, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .and_then(|v| v.as_integer())
        .map(|n| n.clamp(0, u32::MAX as i64) as u32)
}

fn text(dict: &BTreeMap<Bytes, Value>, key: &[u8]) -> Option<String> {
    dict.get(key)
        .and_then(|v| v.as_bytes())
        .map(|b| String::from_utf8_lossy(b).into_owned())
}

pub(crate) fn parse_announce(body: &[u8]) -> Result<AnnounceResponse, TrackerError> {
    let dict = response_dict(body)?;

    let peers = match dict.get(b"peers".as_slice()) {
        Some(Value::Bytes(compact)) => parse_compact_peers(compact),
        Some(Value::List(list)) => list.iter().filter_map(peer_from_dict).collect(),
        _ => Vec::new(),
    };

    Ok(AnnounceResponse {
        interval: count(&dict, b"interval").unwrap_or(DEFAULT_ANNOUNCE_INTERVAL),
        min_interval: Some(count(&dict, b"min interval").unwrap_or(DEFAULT_MIN_INTERVAL)),
        seeders: count(&dict, b"complete").unwrap_or(0),
        leechers: count(&dict, b"incomplete").unwrap_or(0),
        peers,
        warning_message: text(&dict, b"warning message"),
        tracker_id: text(&dict, b"tracker id"),
    })
}

/// Reads one dictionary-form peer. Peers whose `ip` is not a literal address
/// (BEP-3 also allows DNS names) or whose port is out of range are skipped.
fn peer_from_dict(value: &Value) -> Option<Peer> {
    let host = value.get(b"ip").and_then(|v| v.as_str());
    let port = value.get(b"port").and_then(|v| v.as_integer());

    let (Some(ip), Some(port)) = (
        host.and_then(|h| h.parse::<IpAddr>().ok()),
        port.and_then(|p| u16::try_from(p).ok()),
    ) else {
        tracing::debug!(?host, ?port, "skipping peer without a usable address");
        return None;
    };

    let peer_id = value
        .get(b"peer id")
        .and_then(|v| v.as_bytes())
        .and_then(|id| PeerId::from_bytes(id));

    Some(Peer {
        addr: SocketAddr::new(ip, port),
        peer_id,
    })
}

/// Reads the `files` dictionary. Entries follow the order of `requested`;
/// with nothing requested, every entry the tracker sent is returned.
pub(crate) fn parse_scrape(
    body: &[u8],
    requested: &[InfoHash],
) -> Result<Vec<ScrapeEntry>, TrackerError> {
    let dict = response_dict(body)?;
    let files = dict
        .get(b"files".as_slice())
        .and_then(|v| v.as_dict())
        .ok_or_else(|| TrackerError::Protocol("scrape response has no files dictionary".into()))?;

    let entry = |info_hash: InfoHash, stats: &Value| {
        let stats = stats.as_dict()?;
        Some(ScrapeEntry {
            info_hash,
            seeders: count(stats, b"complete").unwrap_or(0),
            completed: count(stats, b"downloaded").unwrap_or(0),
            leechers: count(stats, b"incomplete").unwrap_or(0),
        })
    };

    let entries = if requested.is_empty() {
        files
            .iter()
            .filter_map(|(key, stats)| entry(InfoHash::from_bytes(key).ok()?, stats))
            .collect()
    } else {
        requested
            .iter()
            .filter_map(|hash| entry(*hash, files.get(hash.as_bytes().as_slice())?))
            .collect()
    };

    Ok(entries)
}
