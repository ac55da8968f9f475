//! Debug-only cross-cache coherence invariant checks.
//!
//! Internal invariant violations are bugs in the simulator, not reportable
//! runtime conditions; if detected (in debug builds), abort with
//! diagnostics rather than try to recover. These are `debug_assert!`s,
//! compiled out of release builds, run after every bus dispatch (the only
//! point at which coherence state crosses cache boundaries).

use std::collections::HashMap;

use coresim_cache::{Cache, MesiState};

/// Check single-writer exclusivity, Modified exclusivity, and Exclusive
/// isolation across all four caches. No-op outside debug builds.
pub fn check_coherence(caches: &[Cache; crate::NUM_CORES]) {
    if !cfg!(debug_assertions) {
        return;
    }

    let num_sets = caches[0].geometry().num_sets;
    for set_index in 0..num_sets {
        let mut holders: HashMap<u32, Vec<(usize, MesiState)>> = HashMap::new();
        for (core_idx, cache) in caches.iter().enumerate() {
            for way in 0..cache.geometry().assoc as usize {
                let state = cache.line_state(set_index, way);
                if !state.is_valid() {
                    continue;
                }
                let tag = cache.line_tag(set_index, way);
                holders.entry(tag).or_default().push((core_idx, state));
            }
        }

        for block_holders in holders.values() {
            let modified = block_holders.iter().filter(|(_, s)| *s == MesiState::Modified).count();
            debug_assert!(modified <= 1, "block held Modified by more than one cache");
            if modified == 1 {
                debug_assert!(
                    block_holders.len() == 1,
                    "a Modified block is also held valid by another cache"
                );
            }
            let exclusive = block_holders.iter().filter(|(_, s)| *s == MesiState::Exclusive).count();
            if exclusive == 1 {
                debug_assert!(
                    block_holders.len() == 1,
                    "an Exclusive block is also held valid by another cache"
                );
            }
        }
    }
}
