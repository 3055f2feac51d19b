//! Tunables shared across the core services.

/// Width of the price-sync fan-out. The storage pool is sized to match
/// so every in-flight task can hold a connection.
pub const DEFAULT_SYNC_WORKERS: usize = 10;
