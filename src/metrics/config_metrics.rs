//! Configuration metrics tracking using OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::Arc;
use std::time::Instant;

/// Metrics collector for live configuration cells.
///
/// One collector can be shared by many cells; each cell labels its
/// measurements with its own section through [`ConfigMetrics::with_section`].
///
/// # Examples
///
/// ```rust,no_run
/// use live_config::metrics::ConfigMetrics;
/// use opentelemetry::global;
///
/// let metrics = ConfigMetrics::new(global::meter("live-config")).with_section("database");
///
/// let timer = metrics.start_reload();
/// // ... perform reload ...
/// metrics.record_reload_success(timer);
/// ```
#[derive(Clone)]
pub struct ConfigMetrics {
    reload_attempts: Counter<u64>,
    reload_success: Counter<u64>,
    reload_failures: Counter<u64>,
    reload_duration: Histogram<f64>,
    active_subscribers: Gauge<i64>,
    validation_failures: Counter<u64>,
    attributes: Arc<[KeyValue]>,
}

impl ConfigMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let reload_attempts = meter
            .u64_counter("live_config.reload.attempts")
            .with_description("Total number of reload attempts")
            .build();

        let reload_success = meter
            .u64_counter("live_config.reload.success")
            .with_description("Number of successful reloads")
            .build();

        let reload_failures = meter
            .u64_counter("live_config.reload.failures")
            .with_description("Number of reloads that kept the last known good value")
            .build();

        let reload_duration = meter
            .f64_histogram("live_config.reload.duration")
            .with_description("Duration of reload operations in seconds")
            .with_unit("s")
            .build();

        let active_subscribers = meter
            .i64_gauge("live_config.subscribers.active")
            .with_description("Number of active subscribers")
            .build();

        let validation_failures = meter
            .u64_counter("live_config.validation.failures")
            .with_description("Number of parsed values rejected by validation")
            .build();

        Self {
            reload_attempts,
            reload_success,
            reload_failures,
            reload_duration,
            active_subscribers,
            validation_failures,
            attributes: Arc::from(Vec::new()),
        }
    }

    /// Label every measurement with `section`.
    pub fn with_section(mut self, section: &str) -> Self {
        self.attributes = Arc::from(vec![KeyValue::new("section", section.to_string())]);
        self
    }

    /// Start a reload operation timer.
    ///
    /// Pass the returned `Instant` to `record_reload_success` or
    /// `record_reload_failure` when the reload completes.
    pub fn start_reload(&self) -> Instant {
        self.reload_attempts.add(1, &self.attributes);
        Instant::now()
    }

    /// Record a reload that replaced the stored value.
    pub fn record_reload_success(&self, start: Instant) {
        self.reload_success.add(1, &self.attributes);
        self.reload_duration
            .record(start.elapsed().as_secs_f64(), &self.attributes);
    }

    /// Record a reload that kept the last known good value.
    pub fn record_reload_failure(&self, start: Instant) {
        self.reload_failures.add(1, &self.attributes);
        self.reload_duration
            .record(start.elapsed().as_secs_f64(), &self.attributes);
    }

    /// Record a parsed value rejected by validation.
    pub fn record_validation_failure(&self) {
        self.validation_failures.add(1, &self.attributes);
    }

    /// Update the number of active subscribers.
    pub fn update_subscriber_count(&self, count: i64) {
        self.active_subscribers.record(count, &self.attributes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LiveConfigCell;
    use crate::sources::MemorySource;
    use opentelemetry::global;

    #[test]
    fn test_metrics_operations() {
        let metrics = ConfigMetrics::new(global::meter("test")).with_section("server");

        let timer = metrics.start_reload();
        metrics.record_reload_success(timer);

        let timer = metrics.start_reload();
        metrics.record_reload_failure(timer);

        metrics.record_validation_failure();
        metrics.update_subscriber_count(5);
        assert_eq!(metrics.attributes.len(), 1);
    }

    #[test]
    fn test_cell_with_metrics() {
        let source = Arc::new(MemorySource::new());
        let cell = LiveConfigCell::<i64>::builder("port")
            .with_metrics(ConfigMetrics::new(global::meter("test")))
            .build(source.clone())
            .unwrap();

        let _subscription = cell.subscribe_fn(|_port: Arc<i64>| {}).unwrap();
        source.set("port", 8080i64);
        source.set("port", "not a number");

        assert_eq!(*cell.get_value().unwrap(), 8080);
        assert_eq!(cell.stats().failures, 1);
    }
}
