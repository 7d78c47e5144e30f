//! Worker metrics (spec C8, `SPEC_FULL.md` ambient stack): a queue-depth
//! gauge and jobs-processed/jobs-failed counters, in the same
//! `lazy_static! { static ref PROM_REGISTRY }` shape as
//! `policy-engine::metrics` and `metadata-helper::main`.

use commons::metrics::HasRegistry;
use prometheus::{IntCounterVec, IntGauge, Opts, Registry};

/// Common prefix for worker metrics.
static WORKER_METRICS_PREFIX: &str = "jobcore_worker";

lazy_static::lazy_static! {
    /// Number of jobs completed with a terminal status, labeled by outcome
    /// (`finished`, `failed`, `timed_out`).
    static ref JOBS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("jobs_total", "Total number of jobs reaching a terminal status"),
        &["outcome"],
    )
    .expect("failed to build jobs_total metric");

    /// Approximate depth of this worker's queue, refreshed on every pop.
    static ref QUEUE_DEPTH: IntGauge = IntGauge::new(
        "queue_depth",
        "Approximate number of jobs waiting on this worker's queue",
    )
    .expect("failed to build queue_depth metric");
}

/// Build and register this process's metrics registry.
pub fn new_registry() -> anyhow::Result<Registry> {
    let registry = commons::metrics::new_registry(Some(WORKER_METRICS_PREFIX.to_string()))?;
    registry.register(Box::new(JOBS_TOTAL.clone()))?;
    registry.register(Box::new(QUEUE_DEPTH.clone()))?;
    Ok(registry)
}

/// Record a terminal outcome for one job.
pub fn record_outcome(outcome: &str) {
    JOBS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Update the queue-depth gauge with a freshly observed value.
pub fn set_queue_depth(depth: i64) {
    QUEUE_DEPTH.set(depth);
}

/// Wraps a `&'static Registry` so [`commons::metrics::serve`] can be
/// mounted directly as a route handler.
#[derive(Clone)]
pub struct RegistryWrapper(pub &'static Registry);

impl HasRegistry for RegistryWrapper {
    fn registry(&self) -> &'static Registry {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_outcomes_without_panicking() {
        record_outcome("finished");
        record_outcome("failed");
        set_queue_depth(3);
    }
}
