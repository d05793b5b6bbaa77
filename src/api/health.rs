//! Shared upstream health counters for the /health endpoint.
//! Updated by NbaStatsClient on every provider call.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Default)]
pub struct HealthState {
    /// Provider calls attempted, retries included.
    upstream_requests: AtomicU64,
    /// Attempts that timed out and were retried.
    upstream_retries: AtomicU64,
    /// Calls that ended in an error after any retries.
    upstream_failures: AtomicU64,
    /// Nanosecond timestamp of the last successful call (0 = none).
    last_success_at_ns: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub upstream_requests: u64,
    pub upstream_retries: u64,
    pub upstream_failures: u64,
    pub last_success_at_ns: Option<u64>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_upstream_requests(&self) {
        self.upstream_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_upstream_retries(&self) {
        self.upstream_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_upstream_failures(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_last_success_at_ns(&self, ns: u64) {
        self.last_success_at_ns.store(ns, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let last = self.last_success_at_ns.load(Ordering::Relaxed);
        HealthSnapshot {
            status: "ok",
            upstream_requests: self.upstream_requests.load(Ordering::Relaxed),
            upstream_retries: self.upstream_retries.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            last_success_at_ns: (last != 0).then_some(last),
        }
    }
}
