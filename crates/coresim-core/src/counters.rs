//! Global (cross-core) performance counters (the other half of the picture
//! is per-core and lives in `coresim_cache::CacheCounters`).

/// Simulation-wide counters that are not attributable to a single core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalCounters {
    /// Current/total simulated cycles, including the final flush.
    pub total_cycles: u64,
    /// Total invalidations across all transactions (one per remote line
    /// that transitioned from valid to Invalid).
    pub invalidations: u64,
    /// Total bus traffic in bytes (cache-to-cache transfers, memory
    /// fetches, and writebacks).
    pub bus_data_traffic: u64,
    /// Total number of transactions dispatched by the bus.
    pub bus_transactions: u64,
}
