//! Prometheus metrics for observability.
//!
//! HTTP request metrics are recorded by the metrics middleware. Job counts
//! and worker pool usage are collected from the composer right before each
//! scrape. The core's job and subprocess metrics share the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

use composer_core::JobStatus;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "composer_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("composer_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "composer_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Composer Metrics
// =============================================================================

/// Composer jobs by current status (collected dynamically).
pub static JOBS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("composer_jobs_by_status", "Current composer job count by status"),
        &["status"],
    )
    .unwrap()
});

pub static WORKERS_BUSY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("composer_workers_busy", "Worker slots currently running a job").unwrap()
});

pub static ACTIVE_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "composer_active_jobs",
        "Jobs whose execution routine is running",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Composer
    registry
        .register(Box::new(JOBS_BY_STATUS.clone()))
        .unwrap();
    registry.register(Box::new(WORKERS_BUSY.clone())).unwrap();
    registry.register(Box::new(ACTIVE_JOBS.clone())).unwrap();

    // Core metrics (jobs, subprocesses, inspection)
    composer_core::metrics::register_metrics(registry).unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Collect dynamic metrics from the composer before a scrape.
pub fn collect_dynamic_metrics(state: &AppState) {
    let composer = state.composer();
    let status = composer.status();
    WORKERS_BUSY.set(status.max_workers.saturating_sub(status.available_workers) as i64);
    ACTIVE_JOBS.set(status.active_jobs.len() as i64);

    for job_status in [
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Finished,
        JobStatus::Failed,
    ] {
        if let Ok(count) = composer.count_jobs(Some(job_status), None) {
            JOBS_BY_STATUS
                .with_label_values(&[job_status.as_str()])
                .set(count as i64);
        }
    }
}

static UUID_SEGMENT: Lazy<regex_lite::Regex> = Lazy::new(|| {
    regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap()
});

/// Normalize a path for metric labels (replace job ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    UUID_SEGMENT.replace_all(path, "{id}").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/jobs/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}");
    }

    #[test]
    fn test_normalize_path_dispatch() {
        let path = "/api/v1/jobs/550e8400-e29b-41d4-a716-446655440000/dispatch";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}/dispatch");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/profiles/mp4-hd"), "/api/v1/profiles/mp4-hd");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("composer_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        composer_core::metrics::JOBS_TOTAL
            .with_label_values(&["Encode", "finished"])
            .inc();
        JOBS_BY_STATUS.with_label_values(&["queued"]).set(0);
        WORKERS_BUSY.set(0);

        let output = encode_metrics().unwrap();
        assert!(output.contains("composer_jobs_total"));
        assert!(output.contains("composer_jobs_by_status"));
        assert!(output.contains("composer_workers_busy"));
    }
}
