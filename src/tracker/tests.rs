use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

use super::http::{announce_url, parse_announce, parse_scrape};
use super::udp::check_response;
use super::*;
use crate::bencode::{encode, Value};
use crate::constants::UDP_PROTOCOL_ID;
use crate::metainfo::InfoHash;

const CONNECTION_ID: u64 = 0x1122_3344_5566_7788;

fn hash(byte: u8) -> InfoHash {
    InfoHash::new([byte; 20])
}

fn request() -> AnnounceRequest {
    AnnounceRequest::new(hash(0xab), PeerId::generate(), 6881)
        .with_event(TrackerEvent::Started)
        .with_progress(10, 20, 30)
}

fn quick_config() -> TrackerConfig {
    TrackerConfig::default().with_timeout(Duration::from_millis(300))
}

fn bencoded(value: &Value) -> Vec<u8> {
    encode(value).unwrap()
}

// ----------------------------------------------------------------------------
// Fake UDP tracker
// ----------------------------------------------------------------------------

/// Answers each datagram with whatever `handler` returns; `None` stays silent.
async fn spawn_udp_tracker(
    handler: fn(&[u8]) -> Option<Vec<u8>>,
) -> (String, Arc<AtomicUsize>) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    let received = Arc::new(AtomicUsize::new(0));
    let counter = received.clone();

    tokio::spawn(async move {
        let mut buf = [0u8; 2048];
        loop {
            let Ok((n, from)) = socket.recv_from(&mut buf).await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(reply) = handler(&buf[..n]) {
                let _ = socket.send_to(&reply, from).await;
            }
        }
    });

    (format!("udp://{}/announce", addr), received)
}

fn action_of(packet: &[u8]) -> u32 {
    u32::from_be_bytes(packet[8..12].try_into().unwrap())
}

fn tid_of(packet: &[u8]) -> u32 {
    u32::from_be_bytes(packet[12..16].try_into().unwrap())
}

fn header(action: u32, tid: u32) -> Vec<u8> {
    let mut out = action.to_be_bytes().to_vec();
    out.extend_from_slice(&tid.to_be_bytes());
    out
}

fn connect_reply(packet: &[u8]) -> Option<Vec<u8>> {
    if packet.len() != 16 || packet[..8] != UDP_PROTOCOL_ID.to_be_bytes() {
        return None;
    }
    let mut out = header(0, tid_of(packet));
    out.extend_from_slice(&CONNECTION_ID.to_be_bytes());
    Some(out)
}

fn is_connected(packet: &[u8]) -> bool {
    packet.len() >= 16 && packet[..8] == CONNECTION_ID.to_be_bytes()
}

/// A well-behaved tracker: two peers, 7 seeders, 3 leechers.
fn honest_tracker(packet: &[u8]) -> Option<Vec<u8>> {
    match action_of(packet) {
        0 => connect_reply(packet),
        1 => {
            // Reject anything that is not a started announce from port 6881.
            if packet.len() != 98 || !is_connected(packet) {
                return None;
            }
            if packet[80..84] != 2u32.to_be_bytes() || packet[96..98] != 6881u16.to_be_bytes() {
                return None;
            }
            if packet[16..36] != [0xab; 20] || &packet[36..44] != b"-SS0001-" {
                return None;
            }
            let mut out = header(1, tid_of(packet));
            out.extend_from_slice(&900u32.to_be_bytes());
            out.extend_from_slice(&3u32.to_be_bytes());
            out.extend_from_slice(&7u32.to_be_bytes());
            out.extend_from_slice(&[10, 0, 0, 1, 0x1A, 0xE1, 10, 0, 0, 2, 0x1A, 0xE2]);
            Some(out)
        }
        2 => {
            if !is_connected(packet) || (packet.len() - 16) % 20 != 0 {
                return None;
            }
            let mut out = header(2, tid_of(packet));
            for (i, _) in packet[16..].chunks_exact(20).enumerate() {
                let i = i as u32;
                out.extend_from_slice(&(10 + i).to_be_bytes());
                out.extend_from_slice(&(100 + i).to_be_bytes());
                out.extend_from_slice(&(20 + i).to_be_bytes());
            }
            Some(out)
        }
        _ => None,
    }
}

fn spoofing_tracker(packet: &[u8]) -> Option<Vec<u8>> {
    let mut out = header(0, tid_of(packet) ^ 1);
    out.extend_from_slice(&CONNECTION_ID.to_be_bytes());
    Some(out)
}

fn refusing_tracker(packet: &[u8]) -> Option<Vec<u8>> {
    match action_of(packet) {
        0 => connect_reply(packet),
        _ => {
            let mut out = header(3, tid_of(packet));
            out.extend_from_slice(b"torrent not registered");
            Some(out)
        }
    }
}

fn silent_tracker(_: &[u8]) -> Option<Vec<u8>> {
    None
}

// ----------------------------------------------------------------------------
// Fake HTTP tracker
// ----------------------------------------------------------------------------

/// Serves one canned response per connection and records request lines.
async fn spawn_http_tracker(
    status: &'static str,
    body: Vec<u8>,
) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };

            let mut head: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }

            let text = String::from_utf8_lossy(&head);
            if let Some(line) = text.lines().next() {
                seen.lock().unwrap().push(line.to_string());
            }

            let mut response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            )
            .into_bytes();
            response.extend_from_slice(&body);
            let _ = stream.write_all(&response).await;
            let _ = stream.shutdown().await;
        }
    });

    (addr, requests)
}

fn announce_body() -> Vec<u8> {
    let mut dict = Value::dict();
    dict.insert(b"complete", 5i64);
    dict.insert(b"incomplete", 2i64);
    dict.insert(b"interval", 600i64);
    dict.insert(
        b"peers",
        vec![192u8, 168, 1, 1, 0x1A, 0xE1, 10, 0, 0, 1, 0x1A, 0xE2],
    );
    bencoded(&dict)
}

fn scrape_body(entries: &[(InfoHash, i64, i64, i64)]) -> Vec<u8> {
    let mut files = BTreeMap::new();
    for (info_hash, complete, downloaded, incomplete) in entries {
        let mut stats = Value::dict();
        stats.insert(b"complete", *complete);
        stats.insert(b"downloaded", *downloaded);
        stats.insert(b"incomplete", *incomplete);
        files.insert(Bytes::copy_from_slice(info_hash.as_bytes()), stats);
    }

    let mut dict = Value::dict();
    dict.insert(b"files", files);
    bencoded(&dict)
}

// ----------------------------------------------------------------------------
// Wire helpers
// ----------------------------------------------------------------------------

#[test]
fn test_tracker_event() {
    assert_eq!(TrackerEvent::default(), TrackerEvent::None);
    assert_eq!(TrackerEvent::Started.as_str(), "started");
    assert_eq!(TrackerEvent::Stopped.as_str(), "stopped");
    assert_eq!(TrackerEvent::Completed.as_str(), "completed");
    assert_eq!(TrackerEvent::None.as_str(), "");

    assert_eq!(TrackerEvent::None.as_udp_id(), 0);
    assert_eq!(TrackerEvent::Completed.as_udp_id(), 1);
    assert_eq!(TrackerEvent::Started.as_udp_id(), 2);
    assert_eq!(TrackerEvent::Stopped.as_udp_id(), 3);
}

#[test]
fn test_compact_peer_v4() {
    let bytes = [192, 168, 1, 1, 0x1A, 0xE1]; // 192.168.1.1:6881
    let peer = Peer::from_compact_v4(&bytes).unwrap();

    assert_eq!(peer.addr, "192.168.1.1:6881".parse::<SocketAddr>().unwrap());
    assert_eq!(peer.port(), 6881);
    assert!(peer.peer_id.is_none());
    assert!(Peer::from_compact_v4(&bytes[..5]).is_none());
}

#[test]
fn test_parse_compact_peers_ignores_trailing_bytes() {
    let data = [
        192, 168, 1, 1, 0x1A, 0xE1, // 192.168.1.1:6881
        10, 0, 0, 1, 0x1A, 0xE1, // 10.0.0.1:6881
        1, 2, 3,
    ];

    let peers = parse_compact_peers(&data);
    assert_eq!(peers.len(), 2);
    assert_eq!(peers[1].addr, "10.0.0.1:6881".parse::<SocketAddr>().unwrap());
    assert!(parse_compact_peers(&[]).is_empty());
}

#[test]
fn test_announce_url_encodes_every_byte() {
    let request = AnnounceRequest::new(
        InfoHash::new(*b"ABCDEFGHIJ0123456789"),
        PeerId(*b"-SS0001-abcdefghijkl"),
        6881,
    )
    .with_event(TrackerEvent::Started)
    .with_progress(1, 2, 3);

    let url = announce_url("http://t.example/announce", &request, 50);

    assert!(url.starts_with(
        "http://t.example/announce?info_hash=%41%42%43%44%45%46%47%48%49%4A%30%31"
    ));
    assert!(url.contains("&peer_id=%2D%53%53%30%30%30%31%2D"));
    assert!(url.contains("&port=6881&uploaded=1&downloaded=2&left=3"));
    assert!(url.contains("&compact=1&numwant=50"));
    assert!(url.ends_with("&event=started"));
}

#[test]
fn test_announce_url_existing_query_and_no_event() {
    let request = AnnounceRequest::new(hash(0xff), PeerId([0; 20]), 1);
    let url = announce_url("http://t.example/announce?passkey=abc", &request, 10);

    assert!(url.starts_with("http://t.example/announce?passkey=abc&info_hash=%FF%FF"));
    assert!(!url.contains("event="));
    assert_eq!(url.matches('?').count(), 1);
}

#[test]
fn test_parse_announce_compact() {
    let response = parse_announce(&announce_body()).unwrap();

    assert_eq!(response.interval, 600);
    assert_eq!(response.min_interval, Some(300));
    assert_eq!(response.seeders, 5);
    assert_eq!(response.leechers, 2);
    assert_eq!(response.peers.len(), 2);
    assert_eq!(response.peers[0].addr, "192.168.1.1:6881".parse::<SocketAddr>().unwrap());
    assert!(response.warning_message.is_none());
}

#[test]
fn test_parse_announce_defaults_and_dict_peers() {
    let mut peer = Value::dict();
    peer.insert(b"ip", "10.1.2.3");
    peer.insert(b"port", 51413i64);
    peer.insert(b"peer id", "-XX0100-123456789012");

    let mut bad_peer = Value::dict();
    bad_peer.insert(b"ip", "not an address");
    bad_peer.insert(b"port", 1i64);

    let mut named_peer = Value::dict();
    named_peer.insert(b"ip", "peer.example.com");
    named_peer.insert(b"port", 6881i64);

    let mut bad_port = Value::dict();
    bad_port.insert(b"ip", "10.1.2.4");
    bad_port.insert(b"port", 70_000i64);

    let mut dict = Value::dict();
    dict.insert(b"peers", vec![peer, bad_peer, named_peer, bad_port]);
    dict.insert(b"min interval", 60i64);
    dict.insert(b"warning message", "slow down");
    dict.insert(b"tracker id", "abc");

    let response = parse_announce(&bencoded(&dict)).unwrap();

    assert_eq!(response.interval, 1800);
    assert_eq!(response.min_interval, Some(60));
    assert_eq!(response.seeders, 0);
    assert_eq!(response.leechers, 0);
    assert_eq!(response.peers.len(), 1);
    assert_eq!(response.peers[0].addr, "10.1.2.3:51413".parse::<SocketAddr>().unwrap());
    assert_eq!(
        response.peers[0].peer_id.unwrap().client_id(),
        Some("XX0100")
    );
    assert_eq!(response.warning_message.as_deref(), Some("slow down"));
    assert_eq!(response.tracker_id.as_deref(), Some("abc"));
}

#[test]
fn test_parse_announce_failure_reason_wins() {
    let mut dict = Value::dict();
    dict.insert(b"failure reason", "unregistered torrent");
    dict.insert(b"interval", 600i64);
    // Malformed peers must not matter once a failure is reported.
    dict.insert(b"peers", 42i64);

    match parse_announce(&bencoded(&dict)) {
        Err(TrackerError::Failure(reason)) => assert_eq!(reason, "unregistered torrent"),
        other => panic!("expected failure, got {:?}", other),
    }

    dict.insert(b"peers", vec![1u8, 2, 3, 4, 5]);
    assert!(matches!(
        parse_announce(&bencoded(&dict)),
        Err(TrackerError::Failure(_))
    ));
}

#[test]
fn test_parse_announce_malformed() {
    let err = parse_announce(b"d8:intervali").unwrap_err();
    assert_eq!(err.kind(), TrackerErrorKind::MalformedEncoding);

    let err = parse_announce(b"li1ee").unwrap_err();
    assert_eq!(err.kind(), TrackerErrorKind::ProtocolViolation);
}

#[test]
fn test_parse_scrape() {
    let body = scrape_body(&[(hash(1), 4, 9, 1), (hash(2), 0, 0, 3)]);

    let entries = parse_scrape(&body, &[hash(2), hash(3), hash(1)]).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].info_hash, hash(2));
    assert_eq!(entries[0].leechers, 3);
    assert_eq!(entries[1].info_hash, hash(1));
    assert_eq!(entries[1].seeders, 4);
    assert_eq!(entries[1].completed, 9);

    let all = parse_scrape(&body, &[]).unwrap();
    assert_eq!(all.len(), 2);

    let err = parse_scrape(b"de", &[]).unwrap_err();
    assert_eq!(err.kind(), TrackerErrorKind::ProtocolViolation);
}

#[test]
fn test_check_response() {
    let mut ok = header(1, 42);
    ok.extend_from_slice(&[0; 12]);
    assert_eq!(check_response(&ok, 42, 1, 20).unwrap().len(), 12);

    let err = check_response(&ok, 43, 1, 20).unwrap_err();
    assert_eq!(err.kind(), TrackerErrorKind::ProtocolViolation);

    let err = check_response(&ok, 42, 2, 20).unwrap_err();
    assert_eq!(err.kind(), TrackerErrorKind::ProtocolViolation);

    let err = check_response(&ok, 42, 1, 26).unwrap_err();
    assert_eq!(err.kind(), TrackerErrorKind::ProtocolViolation);

    let err = check_response(&[0, 0, 0], 42, 1, 8).unwrap_err();
    assert_eq!(err.kind(), TrackerErrorKind::ProtocolViolation);

    let mut failure = header(3, 42);
    failure.extend_from_slice(b"go away");
    match check_response(&failure, 42, 1, 20) {
        Err(TrackerError::Failure(msg)) => assert_eq!(msg, "go away"),
        other => panic!("expected failure, got {:?}", other),
    }

    // An error datagram with someone else's transaction id is not trusted.
    let err = check_response(&failure, 7, 1, 20).unwrap_err();
    assert_eq!(err.kind(), TrackerErrorKind::ProtocolViolation);
}

#[test]
fn test_error_kinds() {
    assert!(TrackerError::Timeout.is_timeout());
    assert_eq!(TrackerError::HttpStatus(404).kind(), TrackerErrorKind::ProtocolViolation);
    assert_eq!(
        TrackerError::UnsupportedScheme("ws".into()).kind(),
        TrackerErrorKind::InvalidRequest
    );
    assert_eq!(TrackerError::Failure("x".into()).to_string(), "x");
}

// ----------------------------------------------------------------------------
// URLs and tracker lists
// ----------------------------------------------------------------------------

#[test]
fn test_tracker_url_parse() {
    let parsed = TrackerUrl::parse("udp://tracker.example.com/announce").unwrap();
    assert_eq!(parsed.port, 6969);
    assert!(parsed.is_udp());

    let parsed = TrackerUrl::parse("https://tracker.example.com/a/announce").unwrap();
    assert_eq!(parsed.port, 443);
    assert_eq!(parsed.path, "/a/announce");
    assert!(parsed.is_http());

    let parsed = TrackerUrl::parse("wss://tracker.example.com").unwrap();
    assert!(parsed.is_websocket());

    let parsed = TrackerUrl::parse("udp://[::1]:1337/announce").unwrap();
    assert_eq!(parsed.host, "::1");
    assert_eq!(parsed.host_port(), "[::1]:1337");
    assert_eq!(parsed.to_string(), "udp://[::1]:1337/announce");
}

#[test]
fn test_tracker_url_rejects() {
    assert!(matches!(
        TrackerUrl::parse("ftp://tracker.example.com/announce"),
        Err(TrackerError::UnsupportedScheme(s)) if s == "ftp"
    ));
    assert!(matches!(
        TrackerUrl::parse("not a url"),
        Err(TrackerError::InvalidUrl(_))
    ));
}

#[test]
fn test_scheme_predicates() {
    assert!(is_udp_tracker("udp://a:1/announce"));
    assert!(is_udp_tracker("UDP://a:1/announce"));
    assert!(!is_udp_tracker("http://a/announce"));
    assert!(is_http_tracker("http://a/announce"));
    assert!(is_http_tracker("https://a/announce"));
    assert!(!is_http_tracker("udp://a/announce"));
    assert!(is_websocket_tracker("wss://a"));
    assert!(is_websocket_tracker("ws://a"));
    assert!(!is_websocket_tracker("tracker.example.com"));
}

#[test]
fn test_scrape_url() {
    assert_eq!(
        scrape_url("http://example.com/announce").unwrap(),
        "http://example.com/scrape"
    );
    assert_eq!(
        scrape_url("http://example.com/announce?passkey=1").unwrap(),
        "http://example.com/scrape?passkey=1"
    );
    assert!(scrape_url("http://example.com/announce/x").is_err());
    assert!(scrape_url("http://example.com/a?next=/announce").is_err());
}

#[test]
fn test_default_tracker_lists() {
    assert!(default_udp_trackers().iter().all(|u| is_udp_tracker(u)));
    assert!(default_http_trackers().iter().all(|u| is_http_tracker(u)));
    assert!(default_websocket_trackers()
        .iter()
        .all(|u| is_websocket_tracker(u)));

    let all = all_default_trackers();
    assert_eq!(
        all.len(),
        default_udp_trackers().len()
            + default_http_trackers().len()
            + default_websocket_trackers().len()
    );
    assert!(all.iter().all(|u| TrackerUrl::parse(u).is_ok()));

    let recommended = recommended_trackers();
    assert_eq!(recommended.len(), 5);
    assert!(recommended.iter().all(|u| all.contains(u)));

    let tiers = default_tracker_tiers();
    assert_eq!(tiers.len(), 4);
    assert!(tiers.iter().all(|tier| tier.len() == 2));
}

#[test]
fn test_peer_id() {
    let a = PeerId::generate();
    let b = PeerId::generate();
    assert_ne!(a, b);
    assert_eq!(a.client_id(), Some("SS0001"));
    assert_eq!(format!("{:?}", a), "PeerId(SS0001)");
    assert_eq!(a.to_string().len(), 40);

    assert!(PeerId::from_bytes(&[0; 19]).is_none());
    let raw = PeerId::from_bytes(&[0; 20]).unwrap();
    assert_eq!(raw.client_id(), None);
}

#[test]
fn test_config_defaults() {
    let config = TrackerConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(15));
    assert_eq!(config.retry_count, 3);
    assert_eq!(config.numwant, 50);
    assert!(config.user_agent.starts_with("swarmseed/"));

    let config = config.with_retry_count(0).with_user_agent("probe/1.0");
    assert_eq!(config.retry_count, 0);
    assert_eq!(config.user_agent, "probe/1.0");
}

// ----------------------------------------------------------------------------
// UDP client against a local tracker
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_udp_announce() {
    let (url, received) = spawn_udp_tracker(honest_tracker).await;
    let client = UdpTrackerClient::new(quick_config());

    let result = client.announce(&url, &request()).await;

    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.tracker_url, url);
    assert_eq!(result.interval, 900);
    assert_eq!(result.leechers, 3);
    assert_eq!(result.seeders, 7);
    assert_eq!(result.min_interval, None);
    assert_eq!(result.peers.len(), 2);
    assert_eq!(result.peers[1].addr, "10.0.0.2:6882".parse::<SocketAddr>().unwrap());
    assert!(result.error.is_none());
    assert_eq!(received.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_udp_spoofed_transaction_id() {
    let (url, received) = spawn_udp_tracker(spoofing_tracker).await;
    let client = UdpTrackerClient::new(quick_config());

    let result = client.announce(&url, &request()).await;

    assert_eq!(result.status, TrackerStatus::Failure);
    assert_eq!(result.error_kind, Some(TrackerErrorKind::ProtocolViolation));
    assert!(result.peers.is_empty());
    // Nothing is sent after the bad connect reply.
    assert_eq!(received.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_udp_tracker_error() {
    let (url, _) = spawn_udp_tracker(refusing_tracker).await;
    let client = UdpTrackerClient::new(quick_config());

    let result = client.announce(&url, &request()).await;

    assert_eq!(result.status, TrackerStatus::Failure);
    assert_eq!(result.error_kind, Some(TrackerErrorKind::TrackerFailure));
    assert_eq!(result.error.as_deref(), Some("torrent not registered"));
}

#[tokio::test]
async fn test_udp_timeout() {
    let (url, received) = spawn_udp_tracker(silent_tracker).await;
    let client =
        UdpTrackerClient::new(TrackerConfig::default().with_timeout(Duration::from_millis(100)));

    let result = client.announce(&url, &request()).await;

    assert_eq!(result.status, TrackerStatus::Timeout);
    assert_eq!(result.error_kind, Some(TrackerErrorKind::Timeout));
    assert!(result.elapsed >= Duration::from_millis(100));
    assert_eq!(received.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_udp_scrape() {
    let (url, _) = spawn_udp_tracker(honest_tracker).await;
    let client = UdpTrackerClient::new(quick_config());

    let result = client.scrape(&url, &[hash(1), hash(2)]).await;

    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.entries[0].info_hash, hash(1));
    assert_eq!(result.entries[0].seeders, 10);
    assert_eq!(result.entries[0].completed, 100);
    assert_eq!(result.entries[0].leechers, 20);
    assert_eq!(result.get(&hash(2)).map(|e| e.seeders), Some(11));
}

#[tokio::test]
async fn test_udp_scrape_rejects_bad_hash_counts() {
    let client = UdpTrackerClient::new(quick_config());
    // Port 9 is never contacted: the request is refused before any I/O.
    let url = "udp://127.0.0.1:9/announce";

    let too_many: Vec<InfoHash> = (0..75).map(|i| hash(i as u8)).collect();
    let result = client.scrape(url, &too_many).await;
    assert_eq!(result.status, TrackerStatus::Failure);
    assert_eq!(result.error_kind, Some(TrackerErrorKind::InvalidRequest));

    let result = client.scrape(url, &[]).await;
    assert_eq!(result.error_kind, Some(TrackerErrorKind::InvalidRequest));
}

// ----------------------------------------------------------------------------
// HTTP client against a local tracker
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_http_announce() {
    let (addr, requests) = spawn_http_tracker("200 OK", announce_body()).await;
    let client = HttpTrackerClient::new(quick_config()).unwrap();
    let url = format!("http://{}/announce", addr);

    let result = client.announce(&url, &request()).await;

    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.interval, 600);
    assert_eq!(result.min_interval, Some(300));
    assert_eq!(result.seeders, 5);
    assert_eq!(result.leechers, 2);
    assert_eq!(result.peers.len(), 2);

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let line = &requests[0];
    assert!(line.starts_with("GET /announce?info_hash=%AB%AB"));
    assert!(line.contains("&port=6881&uploaded=10&downloaded=20&left=30"));
    assert!(line.contains("&compact=1"));
    assert!(line.contains("&event=started"));
}

#[tokio::test]
async fn test_http_failure_reason() {
    let mut dict = Value::dict();
    dict.insert(b"failure reason", "not found");
    let (addr, _) = spawn_http_tracker("200 OK", bencoded(&dict)).await;
    let client = HttpTrackerClient::new(quick_config()).unwrap();

    let result = client
        .announce(&format!("http://{}/announce", addr), &request())
        .await;

    assert_eq!(result.status, TrackerStatus::Failure);
    assert_eq!(result.error_kind, Some(TrackerErrorKind::TrackerFailure));
    assert_eq!(result.error.as_deref(), Some("not found"));
}

#[tokio::test]
async fn test_http_error_status() {
    let (addr, _) = spawn_http_tracker("404 Not Found", Vec::new()).await;
    let client = HttpTrackerClient::new(quick_config()).unwrap();

    let result = client
        .announce(&format!("http://{}/announce", addr), &request())
        .await;

    assert_eq!(result.status, TrackerStatus::Failure);
    assert_eq!(result.error_kind, Some(TrackerErrorKind::ProtocolViolation));
}

#[tokio::test]
async fn test_http_scrape() {
    let body = scrape_body(&[(hash(1), 4, 9, 1)]);
    let (addr, requests) = spawn_http_tracker("200 OK", body).await;
    let client = HttpTrackerClient::new(quick_config()).unwrap();

    let result = client
        .scrape(&format!("http://{}/announce", addr), &[hash(1)])
        .await;

    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].completed, 9);

    let requests = requests.lock().unwrap();
    assert!(requests[0].starts_with("GET /scrape?info_hash=%01%01"));
}

#[tokio::test]
async fn test_http_scrape_without_announce_segment() {
    let client = HttpTrackerClient::new(quick_config()).unwrap();
    let result = client.scrape("http://127.0.0.1:9/tracker", &[hash(1)]).await;

    assert_eq!(result.status, TrackerStatus::Failure);
    assert_eq!(result.error_kind, Some(TrackerErrorKind::InvalidRequest));
}

// ----------------------------------------------------------------------------
// TrackerSet
// ----------------------------------------------------------------------------

/// Answers every `stub://` announce with a fixed swarm size.
struct StubClient {
    seeders: u32,
}

#[async_trait]
impl TrackerClient for StubClient {
    fn supports(&self, url: &str) -> bool {
        url.starts_with("stub://")
    }

    async fn announce(&self, url: &str, _request: &AnnounceRequest) -> AnnounceResult {
        let response = super::response::AnnounceResponse {
            seeders: self.seeders,
            interval: 60,
            ..Default::default()
        };
        AnnounceResult::from_outcome(url, Ok(response), Duration::ZERO)
    }

    async fn scrape(&self, url: &str, _info_hashes: &[InfoHash]) -> ScrapeResult {
        ScrapeResult::from_outcome(url, Ok(Vec::new()), Duration::ZERO)
    }
}

#[tokio::test]
async fn test_tracker_set_dispatch() {
    let set = TrackerSet::empty()
        .with_client(Arc::new(StubClient { seeders: 1 }))
        .with_client(Arc::new(StubClient { seeders: 2 }));

    let result = set.announce("stub://a", &request()).await;
    assert_eq!(result.seeders, 1);

    let result = set.announce("udp://127.0.0.1:9/announce", &request()).await;
    assert_eq!(result.status, TrackerStatus::Failure);
    assert_eq!(result.error_kind, Some(TrackerErrorKind::InvalidRequest));

    let result = set.scrape("stub://a", &[hash(1)]).await;
    assert!(result.is_success());
}

#[tokio::test]
async fn test_announce_all_keeps_order() {
    let (udp_url, _) = spawn_udp_tracker(honest_tracker).await;
    let (http_addr, _) = spawn_http_tracker("200 OK", announce_body()).await;
    let (silent_url, _) = spawn_udp_tracker(silent_tracker).await;

    let set = TrackerSet::new(quick_config()).unwrap();
    assert!(set.client_for("wss://tracker.example.com").is_none());

    let urls = vec![
        silent_url.clone(),
        udp_url.clone(),
        "wss://tracker.example.com/announce".to_string(),
        format!("http://{}/announce", http_addr),
    ];
    let results = set.announce_all(&urls, &request()).await;

    assert_eq!(results.len(), 4);
    for (result, url) in results.iter().zip(&urls) {
        assert_eq!(&result.tracker_url, url);
    }

    assert_eq!(results[0].status, TrackerStatus::Timeout);
    assert!(results[1].is_success());
    assert_eq!(results[1].seeders, 7);
    assert_eq!(results[2].status, TrackerStatus::Failure);
    assert_eq!(results[2].error_kind, Some(TrackerErrorKind::InvalidRequest));
    assert_eq!(results[2].elapsed, Duration::ZERO);
    assert!(results[3].is_success());
    assert_eq!(results[3].seeders, 5);
}
