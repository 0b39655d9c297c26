//! Prometheus metrics.
//!
//! A single global registry exposed at `GET /metrics` in text exposition
//! format. Counters and histograms are registered once through the `Lazy`
//! initializer.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, TextEncoder};

pub static METRICS: Lazy<CartageMetrics> = Lazy::new(CartageMetrics::init);

pub struct CartageMetrics {
    pub http_requests_total: IntCounterVec,
    pub queries_total: IntCounter,
    pub query_errors_total: IntCounter,
    pub query_duration: Histogram,
}

impl CartageMetrics {
    fn init() -> Self {
        let http_requests_total = IntCounterVec::new(
            Opts::new("cartage_http_requests_total", "HTTP requests by status class"),
            &["status"],
        )
        .expect("failed to build http request counter");

        let queries_total =
            IntCounter::with_opts(Opts::new("cartage_queries_total", "Total queries executed"))
                .expect("failed to build query counter");

        let query_errors_total = IntCounter::with_opts(Opts::new(
            "cartage_query_errors_total",
            "Queries that returned an error",
        ))
        .expect("failed to build query error counter");

        let query_duration = Histogram::with_opts(HistogramOpts::new(
            "cartage_query_duration_seconds",
            "Duration of queries",
        ))
        .expect("failed to build query duration histogram");

        let registry = prometheus::default_registry();
        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("failed to register http request counter");
        registry
            .register(Box::new(queries_total.clone()))
            .expect("failed to register query counter");
        registry
            .register(Box::new(query_errors_total.clone()))
            .expect("failed to register query error counter");
        registry
            .register(Box::new(query_duration.clone()))
            .expect("failed to register query duration histogram");

        Self {
            http_requests_total,
            queries_total,
            query_errors_total,
            query_duration,
        }
    }

    pub fn record_query_duration(&self, elapsed: std::time::Duration) {
        self.queries_total.inc();
        self.query_duration.observe(elapsed.as_secs_f64());
    }

    pub fn record_query_error(&self) {
        self.query_errors_total.inc();
    }

    pub fn record_http_response(&self, status: u16) {
        let class = match status {
            200..=299 => "2xx",
            400..=499 => "4xx",
            _ => "5xx",
        };
        self.http_requests_total.with_label_values(&[class]).inc();
    }
}

/// Render all registered metrics in Prometheus text exposition format.
pub fn gather_text() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {e}");
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_record_and_gather() {
        METRICS.record_query_duration(std::time::Duration::from_millis(5));
        METRICS.record_query_error();
        METRICS.record_http_response(200);
        METRICS.record_http_response(404);
        METRICS.record_http_response(500);

        let text = String::from_utf8(gather_text()).unwrap();
        assert!(text.contains("cartage_queries_total"));
        assert!(text.contains("cartage_http_requests_total"));
    }
}
