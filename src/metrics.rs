//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Process-wide operation metrics
pub struct Metrics {
    registry: Registry,

    // Counters
    pub operations_total: IntCounterVec,
    pub operations_submitted: IntCounterVec,
    pub operations_noop: IntCounterVec,
    pub operations_failed: IntCounterVec,
    pub swap_requests_total: IntCounterVec,
    pub existence_checks_missing: IntCounter,

    // Histograms
    pub assembly_latency: Histogram,
    pub submission_latency: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new("operations_total", "Facade operations started"),
            &["operation"],
        )?;

        let operations_submitted = IntCounterVec::new(
            Opts::new("operations_submitted", "Operations that produced a confirmed submission"),
            &["operation"],
        )?;

        let operations_noop = IntCounterVec::new(
            Opts::new("operations_noop", "Operations that completed without submitting"),
            &["operation", "reason"],
        )?;

        let operations_failed = IntCounterVec::new(
            Opts::new("operations_failed", "Operations that returned an error"),
            &["operation", "category"],
        )?;

        let swap_requests_total = IntCounterVec::new(
            Opts::new("swap_requests_total", "Requests made to the swap routing service"),
            &["stage", "outcome"],
        )?;

        let existence_checks_missing = IntCounter::with_opts(Opts::new(
            "existence_checks_missing",
            "Existence checks that found no account",
        ))?;

        let assembly_latency = Histogram::with_opts(
            HistogramOpts::new("assembly_latency_seconds", "Transaction assembly latency")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        )?;

        let submission_latency = Histogram::with_opts(
            HistogramOpts::new("submission_latency_seconds", "Send-and-confirm latency")
                .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        )?;

        registry.register(Box::new(operations_total.clone()))?;
        registry.register(Box::new(operations_submitted.clone()))?;
        registry.register(Box::new(operations_noop.clone()))?;
        registry.register(Box::new(operations_failed.clone()))?;
        registry.register(Box::new(swap_requests_total.clone()))?;
        registry.register(Box::new(existence_checks_missing.clone()))?;
        registry.register(Box::new(assembly_latency.clone()))?;
        registry.register(Box::new(submission_latency.clone()))?;

        Ok(Self {
            registry,
            operations_total,
            operations_submitted,
            operations_noop,
            operations_failed,
            swap_requests_total,
            existence_checks_missing,
            assembly_latency,
            submission_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn gather_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_exported() {
        let metrics = Metrics::new().unwrap();
        metrics.operations_total.with_label_values(&["open_order"]).inc();
        metrics
            .operations_noop
            .with_label_values(&["collect_fee", "fee_below_threshold"])
            .inc();

        let text = metrics.gather_text().unwrap();
        assert!(text.contains("operations_total{operation=\"open_order\"} 1"));
        assert!(text.contains("reason=\"fee_below_threshold\""));
    }

    #[test]
    fn test_timer_observes_histogram() {
        let metrics = Metrics::new().unwrap();
        let timer = Timer::new();
        timer.observe_duration(&metrics.assembly_latency);
        assert_eq!(metrics.assembly_latency.get_sample_count(), 1);
    }
}
