//! Metrics collection seam.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Records request counts and duration observations.
///
/// The metrics executor passes fully-qualified metric names and a label
/// slice; implementations decide how to store or export them.
pub trait MetricsCollector: Send + Sync {
    /// Add `value` to the named counter.
    fn increment_counter(&self, name: &str, value: u64, labels: &[(&str, &str)]);

    /// Record one observation in the named histogram.
    fn record_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]);
}

/// Thread-safe in-memory collector for tests, development, and applications
/// without an exporter.
#[derive(Default)]
pub struct InMemoryMetricsCollector {
    counters: RwLock<HashMap<String, u64>>,
    histograms: RwLock<HashMap<String, Vec<f64>>>,
}

impl InMemoryMetricsCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, 0 when never incremented.
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters
            .read()
            .get(&Self::key(name, labels))
            .copied()
            .unwrap_or(0)
    }

    /// Recorded observations of a histogram, empty when never recorded.
    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Vec<f64> {
        self.histograms
            .read()
            .get(&Self::key(name, labels))
            .cloned()
            .unwrap_or_default()
    }

    /// Drop all recorded metrics.
    pub fn reset(&self) {
        self.counters.write().clear();
        self.histograms.write().clear();
    }

    fn key(name: &str, labels: &[(&str, &str)]) -> String {
        let mut key = name.to_string();
        key.push('{');
        for (i, (label, value)) in labels.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(label);
            key.push('=');
            key.push_str(value);
        }
        key.push('}');
        key
    }
}

impl MetricsCollector for InMemoryMetricsCollector {
    fn increment_counter(&self, name: &str, value: u64, labels: &[(&str, &str)]) {
        *self
            .counters
            .write()
            .entry(Self::key(name, labels))
            .or_insert(0) += value;
    }

    fn record_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        self.histograms
            .write()
            .entry(Self::key(name, labels))
            .or_default()
            .push(value);
    }
}

/// Collector that discards everything.
#[derive(Debug, Default)]
pub struct NoopMetricsCollector;

impl MetricsCollector for NoopMetricsCollector {
    fn increment_counter(&self, _name: &str, _value: u64, _labels: &[(&str, &str)]) {}

    fn record_histogram(&self, _name: &str, _value: f64, _labels: &[(&str, &str)]) {}
}
