//! Per-core cache: owns its sets and counters.

use crate::counters::CacheCounters;
use crate::geometry::CacheGeometry;
use crate::line::CacheSet;
use crate::mesi::MesiState;

/// Outcome of classifying a reference against the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyResult {
    /// The reference hit an existing valid line.
    Hit {
        /// Way within the addressed set that matched.
        way: usize,
        /// The line's MESI state at the moment of classification.
        state: MesiState,
    },
    /// No valid line in the addressed set matched the tag.
    Miss,
}

impl ClassifyResult {
    /// `true` if this is a [`ClassifyResult::Hit`].
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }
}

/// One core's private L1 data cache: geometry, sets, counters, and stall
/// state. Has no notion of peer caches or a bus; coherence is entirely the
/// concern of `coresim-core`.
#[derive(Debug, Clone)]
pub struct Cache {
    geometry: CacheGeometry,
    sets: Vec<CacheSet>,
    counters: CacheCounters,
    stall_remaining: u32,
}

impl Cache {
    /// Create an empty cache with the given geometry.
    #[must_use]
    pub fn new(geometry: CacheGeometry) -> Self {
        let sets = (0..geometry.num_sets)
            .map(|_| CacheSet::new(geometry.assoc))
            .collect();
        Self {
            geometry,
            sets,
            counters: CacheCounters::default(),
            stall_remaining: 0,
        }
    }

    /// The cache's (immutable) geometry.
    #[must_use]
    pub const fn geometry(&self) -> CacheGeometry {
        self.geometry
    }

    /// Decode an address via this cache's geometry.
    #[must_use]
    pub fn decode(&self, addr: u32) -> (u32, u32, u32) {
        self.geometry.decode(addr)
    }

    /// Classify a reference as hit or miss without mutating any state.
    #[must_use]
    pub fn classify(&self, addr: u32) -> ClassifyResult {
        let (tag, set_index, _offset) = self.geometry.decode(addr);
        match self.sets[set_index as usize].lookup(tag) {
            Some(way) => ClassifyResult::Hit {
                way,
                state: self.sets[set_index as usize].way(way).state,
            },
            None => ClassifyResult::Miss,
        }
    }

    /// Look up a tag directly within a given set (used by the snoop
    /// responder, which already knows the set index from the transaction
    /// address).
    #[must_use]
    pub fn lookup_in_set(&self, set_index: u32, tag: u32) -> Option<usize> {
        self.sets[set_index as usize].lookup(tag)
    }

    /// MESI state of a specific way.
    #[must_use]
    pub fn line_state(&self, set_index: u32, way: usize) -> MesiState {
        self.sets[set_index as usize].way(way).state
    }

    /// Tag of a specific way.
    #[must_use]
    pub fn line_tag(&self, set_index: u32, way: usize) -> u32 {
        self.sets[set_index as usize].way(way).tag
    }

    /// Choose the victim way for a set (largest rank, `Invalid` preferred).
    #[must_use]
    pub fn victim(&self, set_index: u32) -> usize {
        self.sets[set_index as usize].victim()
    }

    /// Promote `way` in `set_index` to Modified and touch it (write hit to
    /// Modified/Exclusive, or a write-hit-to-Shared bus upgrade).
    pub fn promote_on_write(&mut self, set_index: u32, way: usize) {
        let set = &mut self.sets[set_index as usize];
        set.set_state(way, MesiState::Modified);
        set.touch(way);
        self.debug_check_set(set_index);
    }

    /// Install a freshly-fetched or transferred line, tagged and in the
    /// given final MESI state, touching it (MRU).
    pub fn install(&mut self, set_index: u32, way: usize, tag: u32, state: MesiState) {
        self.sets[set_index as usize].install(way, tag, state);
        self.debug_check_set(set_index);
    }

    /// Directly set a line's MESI state without touching tag or rank (used
    /// by the snoop responder for remote downgrades/invalidations).
    pub fn set_line_state(&mut self, set_index: u32, way: usize, state: MesiState) {
        self.sets[set_index as usize].set_state(way, state);
        self.debug_check_set(set_index);
    }

    /// Touch a way (promote to MRU) without changing its state or tag.
    pub fn touch(&mut self, set_index: u32, way: usize) {
        self.sets[set_index as usize].touch(way);
        self.debug_check_set(set_index);
    }

    fn debug_check_set(&self, set_index: u32) {
        debug_assert!(
            self.sets[set_index as usize].tags_are_unique(),
            "set {set_index} has duplicate valid tags"
        );
        debug_assert!(
            self.sets[set_index as usize].ranks_are_permutation(),
            "set {set_index} LRU ranks are not a permutation"
        );
    }

    /// Read-only counters.
    #[must_use]
    pub const fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    /// Mutable counters, for the scheduler/miss-handler/snoop-responder to
    /// update per spec.
    pub fn counters_mut(&mut self) -> &mut CacheCounters {
        &mut self.counters
    }

    /// Cycles remaining before this core may make progress again.
    #[must_use]
    pub const fn stall_remaining(&self) -> u32 {
        self.stall_remaining
    }

    /// `true` if this core is not stalled (may attempt progress this cycle).
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.stall_remaining == 0
    }

    /// Add cycles to the stall countdown (used when a bus transaction
    /// completes and bills the initiator).
    pub fn add_stall(&mut self, cycles: u32) {
        self.stall_remaining += cycles;
    }

    /// Set the stall countdown directly.
    pub fn set_stall(&mut self, cycles: u32) {
        self.stall_remaining = cycles;
    }

    /// Decrement the stall countdown by one, saturating at zero.
    pub fn decrement_stall(&mut self) {
        self.stall_remaining = self.stall_remaining.saturating_sub(1);
    }

    /// Scan every set for a line still in Modified state (used by the
    /// scheduler's final-flush accounting).
    pub fn modified_lines(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.sets.iter().enumerate().flat_map(|(set_index, set)| {
            (0..set.assoc()).filter_map(move |way| {
                (set.way(way).state == MesiState::Modified).then_some((set_index as u32, way))
            })
        })
    }
}
