use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;

use super::config::TrackerConfig;
use super::error::TrackerError;
use super::http::HttpTrackerClient;
use super::response::{AnnounceRequest, AnnounceResult, ScrapeResult};
use super::udp::UdpTrackerClient;
use crate::metainfo::InfoHash;

/// One tracker protocol.
///
/// Implementations never fail: every error, timeout included, comes back
/// inside the result so that one bad tracker cannot abort a round.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Whether this client speaks the protocol of `url`'s scheme.
    fn supports(&self, url: &str) -> bool;

    async fn announce(&self, url: &str, request: &AnnounceRequest) -> AnnounceResult;

    /// Fetches swarm statistics for `info_hashes`.
    async fn scrape(&self, url: &str, info_hashes: &[InfoHash]) -> ScrapeResult;
}

/// Dispatches tracker calls to the client that supports each URL.
///
/// ```no_run
/// use swarmseed::tracker::{AnnounceRequest, PeerId, TrackerConfig, TrackerEvent, TrackerSet};
/// use swarmseed::metainfo::InfoHash;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let trackers = TrackerSet::new(TrackerConfig::default())?;
/// let request = AnnounceRequest::new(InfoHash::new([0; 20]), PeerId::generate(), 6881)
///     .with_event(TrackerEvent::Started);
///
/// let urls = vec![
///     "udp://tracker.opentrackr.org:1337/announce".to_string(),
///     "http://tracker.opentrackr.org:1337/announce".to_string(),
/// ];
/// for result in trackers.announce_all(&urls, &request).await {
///     println!("{}: {:?} ({} peers)", result.tracker_url, result.status, result.peers.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct TrackerSet {
    clients: Vec<Arc<dyn TrackerClient>>,
}

impl TrackerSet {
    /// A set with the HTTP and UDP clients sharing `config`.
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        let http = HttpTrackerClient::new(config.clone())?;
        let udp = UdpTrackerClient::new(config);
        Ok(Self::empty().with_client(Arc::new(http)).with_client(Arc::new(udp)))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a client. Earlier clients win when several support a URL.
    pub fn with_client(mut self, client: Arc<dyn TrackerClient>) -> Self {
        self.clients.push(client);
        self
    }

    pub fn client_for(&self, url: &str) -> Option<&Arc<dyn TrackerClient>> {
        self.clients.iter().find(|c| c.supports(url))
    }

    pub async fn announce(&self, url: &str, request: &AnnounceRequest) -> AnnounceResult {
        match self.client_for(url) {
            Some(client) => client.announce(url, request).await,
            None => AnnounceResult::failed(url, &unsupported(url), Duration::ZERO),
        }
    }

    pub async fn scrape(&self, url: &str, info_hashes: &[InfoHash]) -> ScrapeResult {
        match self.client_for(url) {
            Some(client) => client.scrape(url, info_hashes).await,
            None => ScrapeResult::from_outcome(url, Err(unsupported(url)), Duration::ZERO),
        }
    }

    /// Announces to every URL concurrently.
    ///
    /// Results are returned in the order of `urls`, one per URL.
    pub async fn announce_all(
        &self,
        urls: &[String],
        request: &AnnounceRequest,
    ) -> Vec<AnnounceResult> {
        let mut results: Vec<Option<AnnounceResult>> = vec![None; urls.len()];
        let mut tasks = JoinSet::new();

        for (index, url) in urls.iter().enumerate() {
            let Some(client) = self.client_for(url).cloned() else {
                results[index] = Some(AnnounceResult::failed(
                    url,
                    &unsupported(url),
                    Duration::ZERO,
                ));
                continue;
            };

            let url = url.clone();
            let request = request.clone();
            tasks.spawn(async move { (index, client.announce(&url, &request).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::warn!(error = %e, "announce task failed"),
            }
        }

        results
            .into_iter()
            .zip(urls)
            .map(|(result, url)| {
                result.unwrap_or_else(|| {
                    let err = TrackerError::Failure("announce task panicked".into());
                    AnnounceResult::failed(url, &err, Duration::ZERO)
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for TrackerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerSet")
            .field("clients", &self.clients.len())
            .finish()
    }
}

fn unsupported(url: &str) -> TrackerError {
    let scheme = url.split_once("://").map_or(url, |(scheme, _)| scheme);
    tracing::warn!(tracker = %url, "no client for tracker scheme");
    TrackerError::UnsupportedScheme(scheme.to_string())
}
