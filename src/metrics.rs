//! Prometheus metrics exporter
//!
//! Features:
//! - Read/write operation counters per database, table and outcome
//! - Database count gauge

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::{error, info};

use crate::storage::{Access, Operation};

lazy_static::lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    pub static ref WRITES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("sandboxdb_writes_total", "Total write operations"),
        &["operation", "database", "table", "status"]
    ).expect("valid writes_total metric");

    pub static ref READS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("sandboxdb_reads_total", "Total read operations"),
        &["operation", "database", "table", "status"]
    ).expect("valid reads_total metric");

    pub static ref DATABASES: IntGauge = IntGauge::new(
        "sandboxdb_databases",
        "Number of databases"
    ).expect("valid databases metric");
}

/// Initialize metrics registry
pub fn init_metrics() {
    info!("Initializing Prometheus metrics");

    METRICS_REGISTRY.register(Box::new(WRITES_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(READS_TOTAL.clone())).ok();
    METRICS_REGISTRY.register(Box::new(DATABASES.clone())).ok();
}

/// Count one store operation.
pub fn record_operation(operation: Operation, database: &str, table: &str, success: bool) {
    let status = if success { "ok" } else { "error" };
    let counter: &IntCounterVec = match operation.access() {
        Access::Read => &READS_TOTAL,
        Access::Write => &WRITES_TOTAL,
    };
    counter
        .with_label_values(&[operation.as_str(), database, table, status])
        .inc();
}

pub fn set_database_count(count: usize) {
    DATABASES.set(count as i64);
}

/// Export metrics in Prometheus text format
pub fn export_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_export() {
        init_metrics();
        record_operation(Operation::Insert, "metricsdb", "t", true);
        record_operation(Operation::Get, "metricsdb", "t", false);
        set_database_count(1);

        let text = export_metrics();
        assert!(text.contains("sandboxdb_writes_total"));
        assert!(text.contains("sandboxdb_reads_total"));
        assert!(text.contains("metricsdb"));
    }
}
