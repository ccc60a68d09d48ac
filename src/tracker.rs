//! Tracker clients (BEP-3, BEP-15, BEP-23, BEP-48)
//!
//! HTTP(S) and UDP announce and scrape, plus tracker URL helpers and lists of
//! well-known public trackers. Calls never return errors: each one yields an
//! [`AnnounceResult`] or [`ScrapeResult`] whose `status` tells success,
//! failure and timeout apart.

mod client;
mod config;
mod error;
mod http;
mod peer_id;
mod response;
mod udp;
mod url;

pub use client::{TrackerClient, TrackerSet};
pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerErrorKind};
pub use http::HttpTrackerClient;
pub use peer_id::PeerId;
pub use response::{
    parse_compact_peers, AnnounceRequest, AnnounceResult, Peer, ScrapeEntry, ScrapeResult,
    TrackerEvent, TrackerStatus,
};
pub use udp::UdpTrackerClient;
pub use self::url::{
    all_default_trackers, default_http_trackers, default_tracker_tiers, default_udp_trackers,
    default_websocket_trackers, is_http_tracker, is_udp_tracker, is_websocket_tracker,
    recommended_trackers, scrape_url, TrackerUrl,
};

#[cfg(test)]
mod tests;
