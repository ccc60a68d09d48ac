use std::fmt;

use url::{Host, Url};

use super::error::TrackerError;

/// A tracker URL split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerUrl {
    pub scheme: String,
    /// Host name or IP address, without IPv6 brackets.
    pub host: String,
    /// Explicit port, or the scheme's default.
    pub port: u16,
    pub path: String,
}

impl TrackerUrl {
    /// Parses an `http`, `https`, `udp`, `ws` or `wss` tracker URL.
    ///
    /// ```
    /// use swarmseed::tracker::TrackerUrl;
    ///
    /// let url = TrackerUrl::parse("udp://tracker.example.com:1337/announce").unwrap();
    /// assert_eq!(url.host, "tracker.example.com");
    /// assert_eq!(url.port, 1337);
    /// assert_eq!(url.path, "/announce");
    ///
    /// let url = TrackerUrl::parse("http://tracker.example.com/announce").unwrap();
    /// assert_eq!(url.port, 80);
    /// ```
    pub fn parse(input: &str) -> Result<Self, TrackerError> {
        let url =
            Url::parse(input).map_err(|e| TrackerError::InvalidUrl(format!("{input}: {e}")))?;

        let scheme = url.scheme().to_string();
        let default_port = default_port(&scheme)
            .ok_or_else(|| TrackerError::UnsupportedScheme(scheme.clone()))?;

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(TrackerError::InvalidUrl(format!("{input}: missing host"))),
        };

        Ok(Self {
            port: url.port().unwrap_or(default_port),
            path: url.path().to_string(),
            scheme,
            host,
        })
    }

    pub fn is_udp(&self) -> bool {
        self.scheme == "udp"
    }

    pub fn is_http(&self) -> bool {
        matches!(self.scheme.as_str(), "http" | "https")
    }

    pub fn is_websocket(&self) -> bool {
        matches!(self.scheme.as_str(), "ws" | "wss")
    }

    /// `host:port`, bracketing IPv6 addresses.
    pub fn host_port(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for TrackerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host_port(), self.path)
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        "udp" => Some(6969),
        _ => None,
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    url.split_once("://")
        .is_some_and(|(scheme, _)| schemes.iter().any(|s| scheme.eq_ignore_ascii_case(s)))
}

pub fn is_udp_tracker(url: &str) -> bool {
    has_scheme(url, &["udp"])
}

pub fn is_http_tracker(url: &str) -> bool {
    has_scheme(url, &["http", "https"])
}

pub fn is_websocket_tracker(url: &str) -> bool {
    has_scheme(url, &["ws", "wss"])
}

/// Derives the scrape URL from an announce URL.
///
/// The last path segment must start with `announce`, which is replaced by
/// `scrape`; anything after it (including a query string) is kept.
///
/// ```
/// use swarmseed::tracker::scrape_url;
///
/// assert_eq!(
///     scrape_url("http://example.com/x/announce.php?key=1").unwrap(),
///     "http://example.com/x/scrape.php?key=1"
/// );
/// assert!(scrape_url("http://example.com/a").is_err());
/// ```
pub fn scrape_url(announce_url: &str) -> Result<String, TrackerError> {
    let (path, query) = match announce_url.find('?') {
        Some(i) => announce_url.split_at(i),
        None => (announce_url, ""),
    };

    let slash = path
        .rfind('/')
        .ok_or_else(|| TrackerError::InvalidUrl(announce_url.to_string()))?;
    let segment = &path[slash + 1..];

    match segment.strip_prefix("announce") {
        Some(rest) => Ok(format!("{}scrape{}{}", &path[..=slash], rest, query)),
        None => Err(TrackerError::InvalidUrl(format!(
            "{announce_url}: no announce segment to derive a scrape url from"
        ))),
    }
}

const UDP_TRACKERS: &[&str] = &[
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://open.stealth.si:80/announce",
    "udp://tracker.torrent.eu.org:451/announce",
    "udp://tracker.bittor.pw:1337/announce",
    "udp://public.popcorn-tracker.org:6969/announce",
    "udp://tracker.dler.org:6969/announce",
    "udp://exodus.desync.com:6969/announce",
    "udp://open.demonii.com:1337/announce",
    "udp://tracker.openbittorrent.com:6969/announce",
    "udp://tracker.moeking.me:6969/announce",
];

const HTTP_TRACKERS: &[&str] = &[
    "http://tracker.opentrackr.org:1337/announce",
    "http://tracker.openbittorrent.com:80/announce",
    "http://tracker.bt4g.com:2095/announce",
];

const WEBSOCKET_TRACKERS: &[&str] = &[
    "wss://tracker.openwebtorrent.com:443/announce",
    "wss://tracker.btorrent.xyz:443/announce",
    "wss://tracker.fastcast.nz:443/announce",
];

fn owned(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|s| s.to_string()).collect()
}

/// Well-known public UDP trackers.
pub fn default_udp_trackers() -> Vec<String> {
    owned(UDP_TRACKERS)
}

pub fn default_http_trackers() -> Vec<String> {
    owned(HTTP_TRACKERS)
}

/// WebTorrent trackers; no client in this crate speaks their protocol.
pub fn default_websocket_trackers() -> Vec<String> {
    owned(WEBSOCKET_TRACKERS)
}

pub fn all_default_trackers() -> Vec<String> {
    [UDP_TRACKERS, HTTP_TRACKERS, WEBSOCKET_TRACKERS]
        .concat()
        .into_iter()
        .map(String::from)
        .collect()
}

/// A short list for new torrents: three UDP trackers, one HTTP fallback and
/// one WebTorrent tracker.
pub fn recommended_trackers() -> Vec<String> {
    owned(&[
        UDP_TRACKERS[0],
        UDP_TRACKERS[1],
        UDP_TRACKERS[2],
        HTTP_TRACKERS[0],
        WEBSOCKET_TRACKERS[0],
    ])
}

/// Public trackers grouped into `announce-list` tiers.
pub fn default_tracker_tiers() -> Vec<Vec<String>> {
    vec![
        owned(&UDP_TRACKERS[0..2]),
        owned(&UDP_TRACKERS[2..4]),
        owned(&HTTP_TRACKERS[0..2]),
        owned(&WEBSOCKET_TRACKERS[0..2]),
    ]
}
