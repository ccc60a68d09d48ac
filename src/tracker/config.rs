use std::time::Duration;

use crate::constants::{DEFAULT_RETRY_COUNT, DEFAULT_TRACKER_TIMEOUT, HTTP_NUMWANT, USER_AGENT};

/// Settings shared read-only by the tracker clients.
///
/// ```
/// use std::time::Duration;
/// use swarmseed::tracker::TrackerConfig;
///
/// let config = TrackerConfig::default()
///     .with_timeout(Duration::from_secs(5))
///     .with_numwant(30);
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Per-request timeout. For UDP it applies to each phase separately.
    pub timeout: Duration,
    /// Stored for callers that schedule their own retries; the clients
    /// themselves make a single attempt.
    pub retry_count: u32,
    pub user_agent: String,
    /// Peers requested from HTTP trackers.
    pub numwant: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TRACKER_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            user_agent: USER_AGENT.to_string(),
            numwant: HTTP_NUMWANT,
        }
    }
}

impl TrackerConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_numwant(mut self, numwant: u32) -> Self {
        self.numwant = numwant;
        self
    }
}
