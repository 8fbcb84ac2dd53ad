// # Metrics
//
// In-process metrics backing the built-in `metrics` provider and the
// application-level request counters. Transports (Prometheus text,
// push gateways) live outside the core; this module only accumulates.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;

/// Application-wide metrics registry. Counters and timers are created
/// on first touch; snapshots are cheap clones for export.
#[derive(Default)]
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, u64>>,
    timers: RwLock<HashMap<String, TimerAccumulator>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TimerAccumulator {
    pub count: u64,
    pub total_micros: u64,
    pub max_micros: u64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    pub fn increment_by(&self, name: &str, by: u64) {
        let mut counters = self.counters.write();
        *counters.entry(name.to_string()).or_insert(0) += by;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.read().get(name).copied().unwrap_or(0)
    }

    pub fn observe(&self, name: &str, elapsed: Duration) {
        let micros = elapsed.as_micros() as u64;
        let mut timers = self.timers.write();
        let entry = timers.entry(name.to_string()).or_default();
        entry.count += 1;
        entry.total_micros += micros;
        entry.max_micros = entry.max_micros.max(micros);
    }

    pub fn timer(&self, name: &str) -> TimerAccumulator {
        self.timers.read().get(name).copied().unwrap_or_default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.read().clone(),
            timers: self.timers.read().clone(),
        }
    }
}

/// Point-in-time copy of all accumulated metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub timers: HashMap<String, TimerAccumulator>,
}

/// Per-request recorder handed to handlers through the `metrics`
/// built-in provider. Marks named checkpoints against the request start
/// and folds into the registry when the request completes.
pub struct RequestMetrics {
    started: Instant,
    marks: RwLock<Vec<(String, Duration)>>,
    counters: RwLock<HashMap<String, u64>>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            marks: RwLock::new(Vec::new()),
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Record a named checkpoint at the current elapsed offset.
    pub fn mark(&self, label: impl Into<String>) {
        self.marks.write().push((label.into(), self.started.elapsed()));
    }

    pub fn increment(&self, name: &str) {
        let mut counters = self.counters.write();
        *counters.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.read().get(name).copied().unwrap_or(0)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn marks(&self) -> Vec<(String, Duration)> {
        self.marks.read().clone()
    }

    /// Fold this request's data into the application registry.
    pub fn fold_into(&self, registry: &MetricsRegistry, status: u16) {
        registry.increment("requests_total");
        registry.increment(&format!("responses_status_{}", status));
        registry.observe("request_duration", self.elapsed());
        for (name, count) in self.counters.read().iter() {
            registry.increment_by(name, *count);
        }
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}
