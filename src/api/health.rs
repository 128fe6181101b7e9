//! Shared health counters for the /health endpoint.
//! Updated by the Fetcher and the fallback chains in the service layer.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Upstream traffic counters. Written by the fetch path, read by the API.
#[derive(Default)]
pub struct HealthState {
    /// Upstream calls actually sent over the network.
    upstream_requests: AtomicU64,
    /// Calls that failed (network, non-2xx, unreadable body).
    upstream_failures: AtomicU64,
    /// Calls answered from the response cache.
    cache_hits: AtomicU64,
    /// Times a JSON feed was skipped in favour of an HTML scrape.
    html_fallbacks: AtomicU64,
    /// Unix seconds of the last successful upstream call (0 = none yet).
    last_success_at: AtomicU64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub ok: bool,
    pub upstream_requests: u64,
    pub upstream_failures: u64,
    pub cache_hits: u64,
    pub html_fallbacks: u64,
    pub last_success_at: Option<u64>,
    pub cached_responses: usize,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.upstream_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, unix_secs: u64) {
        self.last_success_at.store(unix_secs, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_html_fallback(&self) {
        self.html_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn upstream_requests(&self) -> u64 {
        self.upstream_requests.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn html_fallbacks(&self) -> u64 {
        self.html_fallbacks.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, cached_responses: usize) -> HealthSnapshot {
        let last = self.last_success_at.load(Ordering::Relaxed);
        HealthSnapshot {
            ok: true,
            upstream_requests: self.upstream_requests(),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits(),
            html_fallbacks: self.html_fallbacks(),
            last_success_at: (last > 0).then_some(last),
            cached_responses,
        }
    }
}
