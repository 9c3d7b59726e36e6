//! Metric events emitted by the pipeline, plus a few ready-made sinks.

use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

use crate::traits::MetricsSink;
use crate::types::Strategy;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum MetricEvent {
    QueryStarted { query_id: String },
    QueryCompleted { query_id: String, strategy: Strategy, results: usize, elapsed: Duration, from_cache: bool },
    CacheHit { fingerprint: String },
    CacheMiss { fingerprint: String },
    RerankInvoked { candidates: usize, kept: usize, fallbacks: usize, elapsed: Duration },
    BranchDegraded { failed: Strategy, used: Strategy, reason: String },
    Error { query_id: String, kind: &'static str },
}

impl MetricEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MetricEvent::QueryStarted { .. } => "query-started",
            MetricEvent::QueryCompleted { .. } => "query-completed",
            MetricEvent::CacheHit { .. } => "cache-hit",
            MetricEvent::CacheMiss { .. } => "cache-miss",
            MetricEvent::RerankInvoked { .. } => "rerank-invoked",
            MetricEvent::BranchDegraded { .. } => "branch-degraded",
            MetricEvent::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record(&self, _event: &MetricEvent) {}
}

/// Forwards every event to `tracing` under the `passage::metrics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record(&self, event: &MetricEvent) {
        match event {
            MetricEvent::QueryCompleted { query_id, strategy, results, elapsed, from_cache } => tracing::info!(
                target: "passage::metrics",
                event = event.name(),
                %query_id,
                %strategy,
                results,
                elapsed_ms = elapsed.as_millis() as u64,
                from_cache,
            ),
            MetricEvent::BranchDegraded { failed, used, reason } => tracing::warn!(
                target: "passage::metrics",
                event = event.name(),
                %failed,
                %used,
                %reason,
            ),
            MetricEvent::Error { query_id, kind } => tracing::warn!(
                target: "passage::metrics",
                event = event.name(),
                %query_id,
                kind,
            ),
            other => tracing::debug!(target: "passage::metrics", event = other.name(), detail = ?other),
        }
    }
}

/// Keeps every event in memory. Used by tests and by callers that want the
/// rerank summary.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    events: Mutex<Vec<MetricEvent>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RerankReport {
    pub total_rerankings: u64,
    pub total_processing_time: Duration,
    pub average_processing_time: Duration,
}

impl RecordingMetrics {
    pub fn new() -> Self { Self::default() }

    pub fn events(&self) -> Vec<MetricEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.lock().map(|e| e.iter().filter(|ev| ev.name() == name).count()).unwrap_or(0)
    }

    pub fn rerank_report(&self) -> RerankReport {
        let events = self.events();
        let durations: Vec<Duration> = events
            .iter()
            .filter_map(|e| match e {
                MetricEvent::RerankInvoked { elapsed, .. } => Some(*elapsed),
                _ => None,
            })
            .collect();
        let total: Duration = durations.iter().sum();
        let count = durations.len() as u32;
        RerankReport {
            total_rerankings: u64::from(count),
            total_processing_time: total,
            average_processing_time: if count > 0 { total / count } else { Duration::ZERO },
        }
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, event: &MetricEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_counts_by_name() {
        let sink = RecordingMetrics::new();
        sink.record(&MetricEvent::CacheMiss { fingerprint: "f".into() });
        sink.record(&MetricEvent::CacheHit { fingerprint: "f".into() });
        sink.record(&MetricEvent::CacheHit { fingerprint: "f".into() });
        assert_eq!(sink.count("cache-hit"), 2);
        assert_eq!(sink.count("cache-miss"), 1);
        assert_eq!(sink.count("error"), 0);
    }

    #[test]
    fn rerank_report_averages() {
        let sink = RecordingMetrics::new();
        assert_eq!(sink.rerank_report(), RerankReport::default());
        for ms in [10, 30] {
            sink.record(&MetricEvent::RerankInvoked {
                candidates: 8,
                kept: 3,
                fallbacks: 0,
                elapsed: Duration::from_millis(ms),
            });
        }
        let report = sink.rerank_report();
        assert_eq!(report.total_rerankings, 2);
        assert_eq!(report.total_processing_time, Duration::from_millis(40));
        assert_eq!(report.average_processing_time, Duration::from_millis(20));
    }
}
