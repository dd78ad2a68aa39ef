// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

use crate::domain::order::{OrderError, OrderStatus};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the order lifecycle
// ============================================================================
//
// - Orders created and status transitions (from -> to)
// - Delivery assignment outcomes
// - Per-operation latency and failures by error kind
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub status_transitions: IntCounterVec,
    pub assignments: IntCounterVec,

    pub operation_failures: IntCounterVec,
    pub operation_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Order status transitions applied"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let assignments = IntCounterVec::new(
            Opts::new("order_assignments_total", "Delivery assignment attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(assignments.clone()))?;

        let operation_failures = IntCounterVec::new(
            Opts::new("order_operation_failures_total", "Failed order operations"),
            &["operation", "reason"],
        )?;
        registry.register(Box::new(operation_failures.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new("order_operation_duration_seconds", "Order operation duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            status_transitions,
            assignments,
            operation_failures,
            operation_duration,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Latency for every call, plus a failure count keyed by error kind
    pub fn record_operation(&self, operation: &str, duration_secs: f64, error: Option<&OrderError>) {
        self.operation_duration.with_label_values(&[operation]).observe(duration_secs);
        if let Some(error) = error {
            self.operation_failures.with_label_values(&[operation, error.kind()]).inc();
        }
    }

    pub fn record_transition(&self, from: OrderStatus, to: OrderStatus) {
        self.status_transitions.with_label_values(&[from.as_str(), to.as_str()]).inc();
    }

    pub fn record_assignment(&self, outcome: &str) {
        self.assignments.with_label_values(&[outcome]).inc();
    }

    pub fn record_order_created(&self) {
        self.orders_created.inc();
    }
}
