//! The miss handler: orchestrates eviction (with writeback if dirty), snoop,
//! and fill, choosing the final MESI state of the fetched line.

use coresim_cache::{Cache, CacheGeometry, MesiState};

use crate::counters::GlobalCounters;
use crate::snoop;

/// Outcome of handling one miss, carrying what the scheduler needs to bill
/// bus occupancy and initiator stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissOutcome {
    /// `true` if a remote cache supplied the block cache-to-cache.
    pub supplied: bool,
    /// `true` if the initiator's own victim was a dirty (Modified) line.
    pub evicted_dirty: bool,
    /// `true` if a remote cache had to write back a Modified copy during
    /// the snoop (write miss only).
    pub remote_dirty_writeback: bool,
}

/// Handle a miss dequeued by the scheduler on `initiator`'s cache at `addr`.
///
/// Picks a victim, evicts it (with writeback if dirty), snoops peers,
/// installs the new line in the chosen final state, and accounts for where
/// the data came from.
pub fn handle_miss(
    caches: &mut [Cache; crate::NUM_CORES],
    initiator: usize,
    geometry: CacheGeometry,
    addr: u32,
    is_write: bool,
    global: &mut GlobalCounters,
) -> MissOutcome {
    let (tag, set_index, _offset) = geometry.decode(addr);

    let way = caches[initiator].victim(set_index);
    let victim_state = caches[initiator].line_state(set_index, way);
    let mut evicted_dirty = false;
    if victim_state.is_valid() {
        caches[initiator].counters_mut().evictions += 1;
        if victim_state.is_dirty() {
            evicted_dirty = true;
            global.bus_data_traffic += u64::from(geometry.block_size_bytes);
            caches[initiator].counters_mut().data_traffic += u64::from(geometry.block_size_bytes);
            caches[initiator].counters_mut().writebacks += 1;
            // The writeback's 100-cycle bus occupancy is memory time from
            // the initiator's perspective too, not just stall (S4).
            caches[initiator].counters_mut().memory_cycles += 100;
        }
    }

    let outcome = snoop::snoop(caches, initiator, geometry, addr, is_write, global, false);
    if outcome.any_invalidated {
        caches[initiator].counters_mut().invalidations += 1;
    }

    caches[initiator].counters_mut().misses += 1;

    let final_state = if is_write {
        MesiState::Modified
    } else if outcome.supplied {
        MesiState::Shared
    } else {
        MesiState::Exclusive
    };
    caches[initiator].install(set_index, way, tag, final_state);

    if outcome.supplied {
        caches[initiator].counters_mut().memory_cycles += 2 * u64::from(geometry.words_per_block());
    } else {
        global.bus_data_traffic += u64::from(geometry.block_size_bytes);
        caches[initiator].counters_mut().data_traffic += u64::from(geometry.block_size_bytes);
        caches[initiator].counters_mut().memory_cycles += 100;
    }

    log::trace!(
        "core {initiator} miss victim_dirty={evicted_dirty} final_state={final_state:?}",
    );

    MissOutcome {
        supplied: outcome.supplied,
        evicted_dirty,
        remote_dirty_writeback: outcome.remote_dirty_writeback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coresim_cache::CacheGeometry;

    fn geometry() -> CacheGeometry {
        CacheGeometry::from_bits(1, 4, 2).unwrap()
    }

    #[test]
    fn cold_read_miss_installs_exclusive() {
        let geom = geometry();
        let mut caches: [Cache; 4] = std::array::from_fn(|_| Cache::new(geom));
        let mut global = GlobalCounters::default();
        let outcome = handle_miss(&mut caches, 0, geom, 0x0, false, &mut global);
        assert!(!outcome.supplied);
        assert!(!outcome.evicted_dirty);
        assert_eq!(caches[0].classify(0x0), coresim_cache::ClassifyResult::Hit { way: 0, state: MesiState::Exclusive });
        assert_eq!(global.bus_data_traffic, u64::from(geom.block_size_bytes));
    }

    #[test]
    fn read_miss_supplied_by_remote_installs_shared_on_both() {
        let geom = geometry();
        let mut caches: [Cache; 4] = std::array::from_fn(|_| Cache::new(geom));
        let way = caches[1].victim(0);
        caches[1].install(0, way, 0, MesiState::Exclusive);
        let mut global = GlobalCounters::default();
        let outcome = handle_miss(&mut caches, 0, geom, 0x0, false, &mut global);
        assert!(outcome.supplied);
        assert_eq!(caches[0].line_state(0, 0), MesiState::Shared);
        assert_eq!(caches[1].line_state(0, 0), MesiState::Shared);
    }

    #[test]
    fn write_miss_always_installs_modified() {
        let geom = geometry();
        let mut caches: [Cache; 4] = std::array::from_fn(|_| Cache::new(geom));
        let way = caches[1].victim(0);
        caches[1].install(0, way, 0, MesiState::Exclusive);
        let mut global = GlobalCounters::default();
        let outcome = handle_miss(&mut caches, 0, geom, 0x0, true, &mut global);
        assert!(!outcome.supplied, "write miss never transfers cache-to-cache");
        assert_eq!(caches[0].line_state(0, 0), MesiState::Modified);
        assert_eq!(caches[1].line_state(0, 0), MesiState::Invalid);
    }

    #[test]
    fn dirty_eviction_counts_writeback_and_traffic() {
        let geom = CacheGeometry::from_bits(0, 4, 1).unwrap(); // 1 set, direct-mapped
        let mut caches: [Cache; 4] = std::array::from_fn(|_| Cache::new(geom));
        let mut global = GlobalCounters::default();
        handle_miss(&mut caches, 0, geom, 0x0, true, &mut global);
        assert_eq!(caches[0].line_state(0, 0), MesiState::Modified);

        let outcome = handle_miss(&mut caches, 0, geom, 0x10, false, &mut global);
        assert!(outcome.evicted_dirty);
        assert_eq!(caches[0].counters().writebacks, 1);
        assert_eq!(caches[0].counters().evictions, 1);
    }
}
