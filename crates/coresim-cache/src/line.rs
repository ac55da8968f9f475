//! Cache lines and sets: storage, lookup, and LRU bookkeeping.

use crate::mesi::MesiState;

/// A single cache line (one way within a set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLine {
    /// Current MESI state. `Invalid` lines have undefined tag semantics.
    pub state: MesiState,
    /// Tag bits of the cached block. Meaningless when `state` is `Invalid`.
    pub tag: u32,
    /// LRU rank: smaller is more recently used. Forms a total order within
    /// the owning set, a permutation of `0..assoc`.
    pub rank: u32,
}

impl CacheLine {
    fn invalid_at_rank(rank: u32) -> Self {
        Self {
            state: MesiState::Invalid,
            tag: 0,
            rank,
        }
    }
}

/// An associativity-wide collection of ways sharing one index.
#[derive(Debug, Clone)]
pub struct CacheSet {
    ways: Vec<CacheLine>,
}

impl CacheSet {
    /// Create an empty set with `assoc` invalid ways.
    #[must_use]
    pub fn new(assoc: u32) -> Self {
        let ways = (0..assoc).map(CacheLine::invalid_at_rank).collect();
        Self { ways }
    }

    /// Number of ways in this set.
    #[must_use]
    pub fn assoc(&self) -> usize {
        self.ways.len()
    }

    /// Read-only access to a way.
    #[must_use]
    pub fn way(&self, way: usize) -> &CacheLine {
        &self.ways[way]
    }

    /// Linear scan for a valid line with a matching tag.
    ///
    /// Returns the first match; the set-uniqueness invariant guarantees
    /// there is at most one.
    #[must_use]
    pub fn lookup(&self, tag: u32) -> Option<usize> {
        self.ways
            .iter()
            .position(|line| line.state.is_valid() && line.tag == tag)
    }

    /// Choose a victim way: an `Invalid` way if one exists (ties broken by
    /// lowest index), else the way with the largest rank (least recently
    /// used).
    #[must_use]
    pub fn victim(&self) -> usize {
        if let Some(idx) = self.ways.iter().position(|line| !line.state.is_valid()) {
            return idx;
        }
        self.ways
            .iter()
            .enumerate()
            .max_by_key(|(_, line)| line.rank)
            .map(|(idx, _)| idx)
            .expect("cache set has at least one way")
    }

    /// Promote `way` to rank 0, shifting every way that was more recently
    /// used than it (strictly smaller previous rank) down by one.
    pub fn touch(&mut self, way: usize) {
        let old_rank = self.ways[way].rank;
        for (idx, line) in self.ways.iter_mut().enumerate() {
            if idx != way && line.rank < old_rank {
                line.rank += 1;
            }
        }
        self.ways[way].rank = 0;
    }

    /// Overwrite `way` with a freshly-installed line and touch it (MRU).
    pub fn install(&mut self, way: usize, tag: u32, state: MesiState) {
        self.ways[way].tag = tag;
        self.ways[way].state = state;
        self.touch(way);
    }

    /// Set `way`'s state directly without touching tag or rank (used for
    /// in-place upgrades such as write-hit-to-Shared and for snoop-driven
    /// downgrades/invalidations).
    pub fn set_state(&mut self, way: usize, state: MesiState) {
        self.ways[way].state = state;
    }

    /// `true` if every valid way has a distinct tag.
    #[must_use]
    pub fn tags_are_unique(&self) -> bool {
        let mut seen = Vec::with_capacity(self.ways.len());
        for line in &self.ways {
            if !line.state.is_valid() {
                continue;
            }
            if seen.contains(&line.tag) {
                return false;
            }
            seen.push(line.tag);
        }
        true
    }

    /// `true` if ranks form a permutation of `0..assoc` (invariant I5).
    #[must_use]
    pub fn ranks_are_permutation(&self) -> bool {
        let mut ranks: Vec<u32> = self.ways.iter().map(|line| line.rank).collect();
        ranks.sort_unstable();
        ranks.into_iter().eq(0..self.ways.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::any;

    #[test]
    fn empty_set_prefers_invalid_victim() {
        let set = CacheSet::new(4);
        assert_eq!(set.victim(), 0);
    }

    #[test]
    fn lookup_misses_on_empty_set() {
        let set = CacheSet::new(4);
        assert_eq!(set.lookup(0x42), None);
    }

    #[test]
    fn install_then_lookup_hits() {
        let mut set = CacheSet::new(2);
        set.install(0, 0xAB, MesiState::Exclusive);
        assert_eq!(set.lookup(0xAB), Some(0));
        assert_eq!(set.way(0).state, MesiState::Exclusive);
    }

    #[test]
    fn victim_prefers_lru_once_all_ways_valid() {
        let mut set = CacheSet::new(2);
        set.install(0, 1, MesiState::Exclusive);
        set.install(1, 2, MesiState::Exclusive);
        // way 0 is now LRU (touched first, then way 1 touched).
        assert_eq!(set.victim(), 0);
        set.touch(0);
        assert_eq!(set.victim(), 1);
    }

    #[test]
    fn touch_maintains_total_order() {
        let mut set = CacheSet::new(4);
        for way in 0..4 {
            set.install(way, way as u32, MesiState::Shared);
        }
        assert!(set.ranks_are_permutation());
        set.touch(2);
        assert!(set.ranks_are_permutation());
        assert_eq!(set.way(2).rank, 0);
    }

    #[test]
    fn assoc_plus_one_distinct_tags_evict_exactly_once() {
        // P3: assoc+1 distinct tags mapping to the same set yields exactly
        // one eviction on that set.
        let assoc = 2;
        let mut set = CacheSet::new(assoc);
        let mut evictions = 0;
        for tag in 0..(assoc as u32 + 1) {
            if set.lookup(tag).is_some() {
                continue;
            }
            let way = set.victim();
            if set.way(way).state.is_valid() {
                evictions += 1;
            }
            set.install(way, tag, MesiState::Exclusive);
        }
        assert_eq!(evictions, 1);
    }

    proptest::proptest! {
        #[test]
        fn arbitrary_install_sequences_preserve_invariants(
            ops in proptest::collection::vec((0u32..6, any::<bool>()), 0..64)
        ) {
            let mut set = CacheSet::new(4);
            for (tag, is_write) in ops {
                let way = match set.lookup(tag) {
                    Some(way) => way,
                    None => {
                        let way = set.victim();
                        let state = if is_write { MesiState::Modified } else { MesiState::Exclusive };
                        set.install(way, tag, state);
                        way
                    }
                };
                set.touch(way);
                proptest::prop_assert!(set.tags_are_unique());
                proptest::prop_assert!(set.ranks_are_permutation());
            }
        }
    }
}
