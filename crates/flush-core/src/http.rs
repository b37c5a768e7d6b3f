//! HTTP options shared by the probe and section fetchers.

use std::time::Duration;

/// Timeouts applied to every curl handle this crate creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub probe_timeout: Duration,
    pub transfer_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(3600),
        }
    }
}

/// True for the statuses the planner treats as a one-hop redirect.
pub fn is_redirect(status: u32) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}
