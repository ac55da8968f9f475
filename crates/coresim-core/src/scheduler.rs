//! The cycle scheduler: the global tick loop that orders core steps, bus
//! dispatch, and the clock tick, and performs final-flush accounting once
//! every trace has drained.

use coresim_cache::{Cache, CacheGeometry};

use crate::bus::Bus;
use crate::counters::GlobalCounters;
use crate::driver::{self, StepResult};
use crate::invariant;
use crate::trace::Trace;

/// Number of cores simulated: four private L1 caches on one shared bus.
pub const NUM_CORES: usize = crate::NUM_CORES;

/// A finished simulation: the four caches (with their final counters and
/// coherence state) plus global counters and the geometry they ran under.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Per-core caches after the run (including any still-Modified lines
    /// before the final flush was folded into the counters).
    pub caches: [Cache; NUM_CORES],
    /// Cross-core counters.
    pub global: GlobalCounters,
    /// Geometry the simulation ran under.
    pub geometry: CacheGeometry,
}

/// Drive all four traces to completion under `geometry`, returning the
/// final per-core and global counters.
///
/// Per cycle: step every core in order 0..3, check for termination, dispatch
/// at most one bus transaction, then tick the clock. After the loop, any
/// line still Modified anywhere incurs a 100-cycle final-flush writeback.
#[must_use]
pub fn run(geometry: CacheGeometry, traces: [Trace; NUM_CORES]) -> SimulationResult {
    let mut caches: [Cache; NUM_CORES] = std::array::from_fn(|_| Cache::new(geometry));
    let mut bus = Bus::new();
    let mut heads = [0usize; NUM_CORES];
    let mut global = GlobalCounters::default();

    log::info!("starting simulation: {geometry:?}");

    loop {
        // 1. Core step, in fixed order 0..3.
        for core in 0..NUM_CORES {
            if heads[core] >= traces[core].len() {
                continue;
            }
            let bus_available = bus.idle() && bus.pending_is_empty();
            let result = driver::step_core(&mut caches[core], &traces[core], &mut heads[core], core, bus_available);
            if let StepResult::BusRequestIssued(req) = result {
                bus.enqueue(req);
            }
        }

        // 2. Termination check.
        let all_drained = (0..NUM_CORES).all(|c| heads[c] >= traces[c].len());
        if all_drained && bus.pending_is_empty() && bus.idle() {
            break;
        }

        // 3. Bus dispatch.
        if bus.idle() && !bus.pending_is_empty() {
            bus.dispatch_one(&mut caches, geometry, &mut global);
            invariant::check_coherence(&caches);
        }

        // 4. Clock tick.
        global.total_cycles += 1;
        bus.tick();
    }

    // Final flush: every line still Modified anywhere pays a 100-cycle
    // writeback that the trace never triggered explicitly.
    for cache in &mut caches {
        let dirty_lines: Vec<(u32, usize)> = cache.modified_lines().collect();
        for _ in dirty_lines {
            global.total_cycles += 100;
            cache.counters_mut().memory_cycles += 100;
        }
    }

    log::info!(
        "simulation complete: {} cycles, {} bus transactions",
        global.total_cycles,
        global.bus_transactions
    );

    SimulationResult { caches, global, geometry }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{TraceEntry, TraceOp};
    use coresim_cache::MesiState;

    fn geometry() -> CacheGeometry {
        CacheGeometry::from_bits(1, 4, 2).unwrap()
    }

    fn empty_traces() -> [Trace; NUM_CORES] {
        std::array::from_fn(|_| Vec::new())
    }

    #[test]
    fn empty_traces_terminate_with_zero_cycles() {
        let result = run(geometry(), empty_traces());
        assert_eq!(result.global.total_cycles, 0);
        assert_eq!(result.global.bus_transactions, 0);
    }

    #[test]
    fn single_core_cold_read_then_hit_matches_s1() {
        let mut traces = empty_traces();
        traces[0] = vec![
            TraceEntry { op: TraceOp::Read, address: 0 },
            TraceEntry { op: TraceOp::Read, address: 0 },
        ];
        let result = run(geometry(), traces);
        let c0 = result.caches[0].counters();
        assert_eq!(c0.reads, 2);
        assert_eq!(c0.misses, 1);
        assert_eq!(c0.execution_cycles(), 101);
        assert_eq!(result.global.invalidations, 0);
        assert_eq!(result.global.bus_data_traffic, 16);
        assert_eq!(result.caches[0].line_state(0, 0), MesiState::Exclusive);
    }

    #[test]
    fn read_migration_matches_s2() {
        let mut traces = empty_traces();
        traces[0] = vec![TraceEntry { op: TraceOp::Read, address: 0 }];
        traces[1] = vec![TraceEntry { op: TraceOp::Read, address: 0 }];
        let result = run(geometry(), traces);
        assert_eq!(result.caches[0].line_state(0, 0), MesiState::Shared);
        assert_eq!(result.caches[1].line_state(0, 0), MesiState::Shared);
        assert_eq!(result.global.invalidations, 0);
        assert_eq!(result.global.bus_data_traffic, 32);
        assert_eq!(result.caches[1].counters().memory_cycles, 8);
    }

    #[test]
    fn write_invalidation_matches_s3() {
        let mut traces = empty_traces();
        traces[0] = vec![TraceEntry { op: TraceOp::Read, address: 0 }];
        traces[1] = vec![TraceEntry { op: TraceOp::Read, address: 0 }];
        traces[2] = vec![TraceEntry { op: TraceOp::Write, address: 0 }];
        let result = run(geometry(), traces);
        assert_eq!(result.caches[0].line_state(0, 0), MesiState::Invalid);
        assert_eq!(result.caches[1].line_state(0, 0), MesiState::Invalid);
        assert_eq!(result.caches[2].line_state(0, 0), MesiState::Modified);
        assert_eq!(result.global.invalidations, 2);
        assert_eq!(result.caches[2].counters().invalidations, 1);
    }

    #[test]
    fn dirty_eviction_matches_s4() {
        let geom = CacheGeometry::from_bits(0, 4, 1).unwrap(); // 1 set, direct-mapped
        let mut traces = empty_traces();
        traces[0] = vec![
            TraceEntry { op: TraceOp::Write, address: 0x00 },
            TraceEntry { op: TraceOp::Read, address: 0x10 },
        ];
        let result = run(geom, traces);
        let c0 = result.caches[0].counters();
        assert_eq!(c0.writebacks, 1);
        assert_eq!(c0.evictions, 1);
        // 100 for the first write's own memory fetch, then 100 (writeback
        // of the dirty victim) + 100 (fetch of the new block) for the
        // eviction in the second op.
        assert_eq!(c0.memory_cycles, 300);
        assert_eq!(result.caches[0].line_state(0, 0), MesiState::Exclusive);
    }

    // S5 (upgrade on write-hit-to-Shared) is exercised directly against
    // `Bus::dispatch_one` in bus.rs: the core-order tie-break means a trace
    // built to reach this scenario end-to-end races core 0's own follow-up
    // write against core 1's first read for the same block and the two
    // cores can never be put in the narrated order without controlling
    // dispatch directly. See DESIGN.md for the ordering rationale.

    #[test]
    fn final_flush_matches_s6() {
        let mut traces = empty_traces();
        traces[0] = vec![TraceEntry { op: TraceOp::Write, address: 0 }];
        let result = run(geometry(), traces);
        // hit_cycles(0) + memory_cycles(100 fetch + 100 final flush)
        assert_eq!(result.global.total_cycles, 200);
    }

    #[test]
    fn read_only_traces_never_invalidate_or_writeback() {
        let mut traces = empty_traces();
        for core_trace in traces.iter_mut() {
            *core_trace = vec![
                TraceEntry { op: TraceOp::Read, address: 0 },
                TraceEntry { op: TraceOp::Read, address: 0x100 },
            ];
        }
        let result = run(geometry(), traces);
        assert_eq!(result.global.invalidations, 0);
        for cache in &result.caches {
            assert_eq!(cache.counters().writebacks, 0);
        }
    }

    #[test]
    fn identical_trace_replay_is_deterministic() {
        let mut traces = empty_traces();
        traces[0] = vec![
            TraceEntry { op: TraceOp::Write, address: 0 },
            TraceEntry { op: TraceOp::Read, address: 0x10 },
            TraceEntry { op: TraceOp::Write, address: 0x20 },
        ];
        let first = run(geometry(), traces.clone());
        let second = run(geometry(), traces);
        assert_eq!(first.global, second.global);
    }
}
