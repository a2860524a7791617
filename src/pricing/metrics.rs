// Performance Metrics for the pricing service
//
// Tracks quote volume per mode, refused and failed quotes, execution time
// and slow quotes.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

use crate::pricing::types::PricingMode;

/// Default threshold above which a quote counts as slow
pub const DEFAULT_SLOW_QUOTE_THRESHOLD_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    slow_threshold_ms: u64,

    // Outcome counts
    individual_quotes: AtomicU64,
    package_quotes: AtomicU64,
    refused_quotes: AtomicU64,
    failed_quotes: AtomicU64,

    // Timing (microseconds), over every finished quote
    total_quote_time_us: AtomicU64,
    slow_quotes: AtomicU64,
}

/// How a timed quote ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteOutcome {
    Priced(PricingMode),
    /// Booking data could not be priced (booth size, price, unknown ids)
    Refused,
    /// Infrastructure failure or a timer dropped before an outcome was set
    Failed,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::with_slow_threshold(DEFAULT_SLOW_QUOTE_THRESHOLD_MS)
    }

    pub fn with_slow_threshold(slow_threshold_ms: u64) -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                slow_threshold_ms,
                individual_quotes: AtomicU64::new(0),
                package_quotes: AtomicU64::new(0),
                refused_quotes: AtomicU64::new(0),
                failed_quotes: AtomicU64::new(0),
                total_quote_time_us: AtomicU64::new(0),
                slow_quotes: AtomicU64::new(0),
            }),
        }
    }

    /// Start timing a quote; the timer records once when dropped
    pub fn start_quote(&self) -> QuoteTimer {
        QuoteTimer {
            start: Instant::now(),
            outcome: QuoteOutcome::Failed,
            metrics: self.clone(),
        }
    }

    fn record_quote(&self, outcome: QuoteOutcome, duration: Duration) {
        let counter = match outcome {
            QuoteOutcome::Priced(PricingMode::Individual) => &self.inner.individual_quotes,
            QuoteOutcome::Priced(PricingMode::Package) => &self.inner.package_quotes,
            QuoteOutcome::Refused => &self.inner.refused_quotes,
            QuoteOutcome::Failed => &self.inner.failed_quotes,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        self.inner
            .total_quote_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > self.inner.slow_threshold_ms {
            self.inner.slow_quotes.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Slow quote ({:?}): {}ms", outcome, duration.as_millis());
        }
    }

    fn total_quotes(&self) -> u64 {
        self.inner.individual_quotes.load(Ordering::Relaxed)
            + self.inner.package_quotes.load(Ordering::Relaxed)
            + self.inner.refused_quotes.load(Ordering::Relaxed)
            + self.inner.failed_quotes.load(Ordering::Relaxed)
    }

    /// Average quote time in milliseconds
    pub fn avg_quote_time_ms(&self) -> f64 {
        let count = self.total_quotes();
        let total_us = self.inner.total_quote_time_us.load(Ordering::Relaxed);

        if count == 0 {
            0.0
        } else {
            (total_us as f64 / count as f64) / 1000.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_quotes: self.total_quotes(),
            individual_quotes: self.inner.individual_quotes.load(Ordering::Relaxed),
            package_quotes: self.inner.package_quotes.load(Ordering::Relaxed),
            refused_quotes: self.inner.refused_quotes.load(Ordering::Relaxed),
            failed_quotes: self.inner.failed_quotes.load(Ordering::Relaxed),
            avg_quote_time_ms: self.avg_quote_time_ms(),
            slow_quotes: self.inner.slow_quotes.load(Ordering::Relaxed),
            slow_threshold_ms: self.inner.slow_threshold_ms,
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            "Pricing metrics: {} quotes ({} individual, {} package, {} refused, {} failed), \
             avg {:.2}ms, {} slow",
            summary.total_quotes,
            summary.individual_quotes,
            summary.package_quotes,
            summary.refused_quotes,
            summary.failed_quotes,
            summary.avg_quote_time_ms,
            summary.slow_quotes,
        );
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer for one quote
pub struct QuoteTimer {
    start: Instant,
    outcome: QuoteOutcome,
    metrics: PerformanceMetrics,
}

impl QuoteTimer {
    pub fn set_outcome(&mut self, outcome: QuoteOutcome) {
        self.outcome = outcome;
    }
}

impl Drop for QuoteTimer {
    fn drop(&mut self) {
        self.metrics.record_quote(self.outcome, self.start.elapsed());
    }
}

/// Snapshot of the pricing metrics
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MetricsSummary {
    pub total_quotes: u64,
    pub individual_quotes: u64,
    pub package_quotes: u64,
    pub refused_quotes: u64,
    pub failed_quotes: u64,
    pub avg_quote_time_ms: f64,
    pub slow_quotes: u64,
    pub slow_threshold_ms: u64,
}
