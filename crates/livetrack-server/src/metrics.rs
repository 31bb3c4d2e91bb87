//! Prometheus metrics for the livetrack server
//!
//! All metrics use the `livetrack_` prefix and are served at `/metrics`.

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Request latency by method and matched route
    pub http_request_duration_seconds: HistogramVec,
    /// Responses with a 4xx or 5xx status by code and matched route
    pub http_errors_total: IntCounterVec,
    /// Pilots currently in the registry
    pub pilots: IntGauge,
    /// Registry writes turned into stream snapshots
    pub snapshots_published_total: IntCounter,
    /// Connected stream clients
    pub stream_clients: IntGauge,
    /// Snapshot frames written to stream clients
    pub stream_frames_sent_total: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "livetrack_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        let http_errors_total = IntCounterVec::new(
            Opts::new("livetrack_http_errors_total", "HTTP error responses"),
            &["code", "path"],
        )?;
        registry.register(Box::new(http_errors_total.clone()))?;

        let pilots = IntGauge::with_opts(Opts::new(
            "livetrack_pilots",
            "Pilots currently in the registry",
        ))?;
        registry.register(Box::new(pilots.clone()))?;

        let snapshots_published_total = IntCounter::with_opts(Opts::new(
            "livetrack_snapshots_published_total",
            "Registry snapshots published to the stream",
        ))?;
        registry.register(Box::new(snapshots_published_total.clone()))?;

        let stream_clients = IntGauge::with_opts(Opts::new(
            "livetrack_stream_clients",
            "Connected stream clients",
        ))?;
        registry.register(Box::new(stream_clients.clone()))?;

        let stream_frames_sent_total = IntCounter::with_opts(Opts::new(
            "livetrack_stream_frames_sent_total",
            "Snapshot frames sent to stream clients",
        ))?;
        registry.register(Box::new(stream_frames_sent_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            http_request_duration_seconds,
            http_errors_total,
            pilots,
            snapshots_published_total,
            stream_clients,
            stream_frames_sent_total,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_else(|e| {
                tracing::error!("Failed to encode metrics: {}", e);
                String::new()
            })
    }

    pub fn observe_request(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(elapsed.as_secs_f64());
        if status >= 400 {
            self.http_errors_total
                .with_label_values(&[status.to_string().as_str(), path])
                .inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_render_with_prefix() {
        let metrics = Metrics::new().expect("metrics");
        metrics.pilots.set(3);
        let output = metrics.render();
        assert!(output.contains("livetrack_pilots 3"));
        assert!(output.contains("livetrack_stream_clients 0"));
    }

    #[test]
    fn only_failed_requests_count_as_errors() {
        let metrics = Metrics::new().expect("metrics");
        metrics.observe_request("GET", "/v1/pilots", 200, Duration::from_millis(2));
        metrics.observe_request("PUT", "/v1/pilots", 422, Duration::from_millis(3));

        assert_eq!(
            metrics
                .http_errors_total
                .with_label_values(&["422", "/v1/pilots"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .http_errors_total
                .with_label_values(&["200", "/v1/pilots"])
                .get(),
            0
        );
        assert_eq!(
            metrics
                .http_request_duration_seconds
                .with_label_values(&["GET", "/v1/pilots"])
                .get_sample_count(),
            1
        );
    }
}
