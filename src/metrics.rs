//! Performance metrics and statistics tracking for the prediction service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

use crate::types::response::AttritionLabel;

/// Metrics collector for the prediction pipeline
pub struct ServiceMetrics {
    /// Total predictions served
    pub predictions_served: AtomicU64,
    /// Predictions labeled OUI (will leave)
    pub predictions_positive: AtomicU64,
    /// Predictions labeled NON
    pub predictions_negative: AtomicU64,
    /// Requests aborted by a model or store failure
    pub prediction_failures: AtomicU64,
    /// Audit log writes that failed and were discarded
    pub log_write_failures: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            predictions_positive: AtomicU64::new(0),
            predictions_negative: AtomicU64::new(0),
            prediction_failures: AtomicU64::new(0),
            log_write_failures: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a served prediction
    pub fn record_prediction(&self, processing_time: Duration, label: AttritionLabel) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        match label {
            AttritionLabel::Oui => self.predictions_positive.fetch_add(1, Ordering::Relaxed),
            AttritionLabel::Non => self.predictions_negative.fetch_add(1, Ordering::Relaxed),
        };

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Record a failed prediction request
    pub fn record_failure(&self) {
        self.prediction_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a discarded audit log write
    pub fn record_log_failure(&self) {
        self.log_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times,
            Err(_) => return ProcessingStats::default(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (predictions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let positive = self.predictions_positive.load(Ordering::Relaxed);
        let negative = self.predictions_negative.load(Ordering::Relaxed);
        let failures = self.prediction_failures.load(Ordering::Relaxed);
        let log_failures = self.log_write_failures.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();

        info!(
            predictions = served,
            oui = positive,
            non = negative,
            failures,
            log_failures,
            throughput = format!("{:.2}/s", self.get_throughput()),
            "service metrics"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            max_us = processing.max_us,
            "prediction latency"
        );
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic reporter that prints metric summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), AttritionLabel::Non);
        metrics.record_prediction(Duration::from_micros(200), AttritionLabel::Oui);
        metrics.record_failure();
        metrics.record_log_failure();

        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.predictions_positive.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.predictions_negative.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.prediction_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.log_write_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ServiceMetrics::new();
        for us in [100, 200, 300, 400] {
            metrics.record_prediction(Duration::from_micros(us), AttritionLabel::Non);
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
    }
}
