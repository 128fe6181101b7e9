//! Per-source upstream latency histograms.
//! The Fetcher records one sample per network call; /stats/latency reads them.

use std::time::Duration;

use dashmap::DashMap;
use hdrhistogram::Histogram;
use serde::Serialize;

/// Values stored in milliseconds, 1ms to 10min, 3 significant figures.
const MAX_TRACKED_MS: u64 = 600_000;

#[derive(Default)]
pub struct LatencyStats {
    /// source label → histogram
    by_source: DashMap<&'static str, Histogram<u64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLatency {
    pub source: &'static str,
    pub samples: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub max_ms: u64,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, source: &'static str, elapsed: Duration) {
        let ms = (elapsed.as_millis().min(u128::from(MAX_TRACKED_MS)) as u64).max(1);
        let mut entry = match self.by_source.entry(source) {
            dashmap::mapref::entry::Entry::Occupied(e) => e.into_ref(),
            dashmap::mapref::entry::Entry::Vacant(v) => {
                let Ok(h) = Histogram::new_with_bounds(1, MAX_TRACKED_MS, 3) else {
                    return;
                };
                v.insert(h)
            }
        };
        let _ = entry.record(ms);
    }

    /// One row per source that has samples, sorted by source label.
    pub fn snapshot(&self) -> Vec<SourceLatency> {
        let mut rows: Vec<SourceLatency> = self
            .by_source
            .iter()
            .filter(|h| h.len() > 0)
            .map(|h| SourceLatency {
                source: *h.key(),
                samples: h.len(),
                p50_ms: h.value_at_quantile(0.5),
                p95_ms: h.value_at_quantile(0.95),
                p99_ms: h.value_at_quantile(0.99),
                max_ms: h.max(),
            })
            .collect();
        rows.sort_by_key(|r| r.source);
        rows
    }
}
