//! The snoop responder: visits every non-initiator cache in response to a
//! bus transaction and updates its MESI state.

use coresim_cache::{Cache, CacheGeometry, MesiState};

use crate::counters::GlobalCounters;

/// Result of walking the non-initiator caches for one transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnoopOutcome {
    /// `true` if any remote cache held the block valid.
    pub shared: bool,
    /// `true` if a remote cache can (or did) supply the block.
    pub supplied: bool,
    /// `true` if at least one remote line was invalidated (write case);
    /// the initiator's `invalidations` counter is bumped once, not per line.
    pub any_invalidated: bool,
    /// `true` if a remote Modified line had to write back to memory as
    /// part of this transaction (write case only; billed as extra bus
    /// occupancy by the dispatcher).
    pub remote_dirty_writeback: bool,
}

/// Visit every cache other than `initiator`, updating MESI state for any
/// line matching `addr`'s (set, tag).
///
/// `preseeded_shared` seeds the `shared` output to `true` before the walk;
/// the dispatcher passes `true` for a write-hit-to-Shared upgrade (the
/// initiator's own Shared copy already establishes that the block was
/// shared), `false` for an ordinary miss.
pub fn snoop(
    caches: &mut [Cache; crate::NUM_CORES],
    initiator: usize,
    geometry: CacheGeometry,
    addr: u32,
    is_write: bool,
    global: &mut GlobalCounters,
    preseeded_shared: bool,
) -> SnoopOutcome {
    let (tag, set_index, _offset) = geometry.decode(addr);
    let mut shared = preseeded_shared;
    let mut supplied = false;
    let mut any_invalidated = false;
    let mut remote_dirty_writeback = false;

    for (core_idx, cache) in caches.iter_mut().enumerate() {
        if core_idx == initiator {
            continue;
        }
        let Some(way) = cache.lookup_in_set(set_index, tag) else {
            continue;
        };
        let state = cache.line_state(set_index, way);
        debug_assert!(state.is_valid());

        if is_write {
            if state == MesiState::Modified {
                global.bus_data_traffic += u64::from(geometry.block_size_bytes);
                cache.counters_mut().data_traffic += u64::from(geometry.block_size_bytes);
                cache.counters_mut().writebacks += 1;
                remote_dirty_writeback = true;
            }
            cache.set_line_state(set_index, way, MesiState::Invalid);
            global.invalidations += 1;
            any_invalidated = true;
        } else {
            // Read miss: Modified, Exclusive, and Shared remotes can all
            // supply the block; only the first supplier bills transfer
            // traffic.
            if !shared {
                global.bus_data_traffic += u64::from(geometry.block_size_bytes);
            }
            cache.set_line_state(set_index, way, MesiState::Shared);
            supplied = true;
            shared = true;
        }
    }

    SnoopOutcome {
        shared,
        supplied,
        any_invalidated,
        remote_dirty_writeback,
    }
}
