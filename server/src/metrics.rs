use commonware_runtime::Metrics as RuntimeMetrics;
use prometheus_client::{
    encoding::{EncodeLabelSet, EncodeLabelValue},
    metrics::{counter::Counter, family::Family, gauge::Gauge},
};

/// What the accept policy did with a new connection.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Outcome {
    /// Enqueued.
    Accepted,
    /// Closed without a response (below the reject floor).
    Dropped,
    /// Sent the static unavailable response.
    Rejected,
    /// Sent an unavailable response with a retry hint (queue full).
    Busy,
}

/// Label for connection metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct Label {
    pub outcome: Outcome,
}

/// Metrics for the [`Controller`](crate::Controller).
#[derive(Default)]
pub struct Metrics {
    /// Number of new connections by outcome
    pub connections: Family<Label, Counter>,
    /// Number of admissions to active processing
    pub admitted: Counter,
    /// Number of times an active request deferred
    pub deferred: Counter,
    /// Number of requests that finished
    pub completed: Counter,
    /// Number of requests waiting for admission
    pub queued: Gauge,
    /// Number of requests active or deferred
    pub active: Gauge,
}

impl Metrics {
    /// Create and return a new set of metrics, registered with the given context.
    pub fn init<E: RuntimeMetrics>(context: E) -> Self {
        let metrics = Self::default();
        context.register(
            "connections",
            "Number of new connections by outcome",
            metrics.connections.clone(),
        );
        context.register(
            "admitted",
            "Number of admissions to active processing",
            metrics.admitted.clone(),
        );
        context.register(
            "deferred",
            "Number of times an active request deferred",
            metrics.deferred.clone(),
        );
        context.register(
            "completed",
            "Number of requests that finished",
            metrics.completed.clone(),
        );
        context.register(
            "queued",
            "Number of requests waiting for admission",
            metrics.queued.clone(),
        );
        context.register(
            "active",
            "Number of requests active or deferred",
            metrics.active.clone(),
        );
        metrics
    }

    /// Count a new connection.
    pub fn connection(&self, outcome: Outcome) {
        self.connections.get_or_create(&Label { outcome }).inc();
    }
}
