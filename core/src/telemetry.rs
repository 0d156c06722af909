//! Metric names shared by the emitting storage crates and the exporter.

/// Counter of repository operations, labelled by `op` and `outcome`.
pub const REPOSITORY_OPERATIONS_TOTAL: &str = "todokv_repository_operations_total";

/// Histogram of repository operation latency, labelled by `op`.
pub const REPOSITORY_OPERATION_DURATION_SECONDS: &str =
    "todokv_repository_operation_duration_seconds";

/// Counter of storage transactions rolled back, labelled by `reason`.
pub const STORAGE_ROLLBACKS_TOTAL: &str = "todokv_storage_rollbacks_total";
