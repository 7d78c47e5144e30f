//! Gateway metrics (spec C8, `SPEC_FULL.md` ambient stack): request
//! counters per endpoint kind and a queue-depth gauge, mirroring
//! `worker::metrics` and the teacher's `policy-engine::metrics`.

use commons::metrics::HasRegistry;
use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};

static GATEWAY_METRICS_PREFIX: &str = "jobcore_gateway";

lazy_static::lazy_static! {
    /// Enqueue requests accepted, labeled by job kind.
    static ref JOBS_ENQUEUED: IntCounterVec = IntCounterVec::new(
        Opts::new("jobs_enqueued_total", "Total number of jobs accepted for enqueue"),
        &["kind"],
    )
    .expect("failed to build jobs_enqueued_total metric");

    /// Requests rejected by admission (spec §4.9).
    static ref ADMISSION_REJECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("admission_rejections_total", "Requests rejected by admission"),
        &["path"],
    )
    .expect("failed to build admission_rejections_total metric");

    /// Last-observed depth per queue, refreshed by `/health`.
    static ref QUEUE_DEPTH: IntGaugeVec = IntGaugeVec::new(
        Opts::new("queue_depth", "Approximate depth of each known queue"),
        &["queue"],
    )
    .expect("failed to build queue_depth metric");
}

/// Build and register this process's metrics registry.
pub fn new_registry() -> anyhow::Result<Registry> {
    let registry = commons::metrics::new_registry(Some(GATEWAY_METRICS_PREFIX.to_string()))?;
    registry.register(Box::new(JOBS_ENQUEUED.clone()))?;
    registry.register(Box::new(ADMISSION_REJECTIONS.clone()))?;
    registry.register(Box::new(QUEUE_DEPTH.clone()))?;
    Ok(registry)
}

/// Record a successfully enqueued job of `kind`.
pub fn record_enqueued(kind: &str) {
    JOBS_ENQUEUED.with_label_values(&[kind]).inc();
}

/// Record an admission rejection for `path`.
pub fn record_admission_rejection(path: &str) {
    ADMISSION_REJECTIONS.with_label_values(&[path]).inc();
}

/// Refresh the queue-depth gauge for `queue`.
pub fn set_queue_depth(queue: &str, depth: i64) {
    QUEUE_DEPTH.with_label_values(&[queue]).set(depth);
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
    fn records_without_panicking() {
        record_enqueued("ifcconvert");
        record_admission_rejection("/ifcconvert");
        set_queue_depth("ifcconvert", 2);
    }
}
