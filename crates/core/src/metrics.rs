//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Composer jobs (outcomes, durations)
//! - Engines (subprocess exits)
//! - Inspection barrier (wait time)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Composer Metrics
// =============================================================================

/// Composer jobs by operation and result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("composer_jobs_total", "Total composer jobs executed"),
        &["operation", "result"], // result: "finished", "failed"
    )
    .unwrap()
});

/// Execution routine duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "composer_job_duration_seconds",
            "Duration of composer job execution",
        )
        .buckets(vec![
            1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0,
        ]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Engine Metrics
// =============================================================================

/// Subprocess exits by engine and result.
pub static SUBPROCESS_EXITS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "composer_subprocess_exits_total",
            "Total engine subprocess exits",
        ),
        &["engine", "result"], // result: "success", "failure"
    )
    .unwrap()
});

// =============================================================================
// Inspection Metrics
// =============================================================================

/// Time spent waiting for inspection jobs.
pub static INSPECTION_WAIT: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "composer_inspection_wait_seconds",
            "Time spent waiting for artifact inspection",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]),
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(SUBPROCESS_EXITS.clone()),
        Box::new(INSPECTION_WAIT.clone()),
    ]
}

/// Registers all core metrics in the given registry.
pub fn register_metrics(registry: &prometheus::Registry) -> prometheus::Result<()> {
    for metric in all_metrics() {
        registry.register(metric)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        let registry = prometheus::Registry::new();
        register_metrics(&registry).unwrap();

        JOBS_TOTAL.with_label_values(&["encode", "finished"]).inc();
        INSPECTION_WAIT.observe(0.2);

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"composer_jobs_total".to_string()));
        assert!(names.contains(&"composer_inspection_wait_seconds".to_string()));
    }
}
