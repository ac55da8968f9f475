//! Per-core MESI cache model for the four-core coherence simulator.
//!
//! This crate provides the address decoder, cache line/set storage with
//! LRU bookkeeping, and the per-core `Cache` type. It has no notion of a
//! bus or of peer caches: a `Cache` answers "hit or miss" and "which way is
//! the victim", and nothing about what happens to other cores when this one
//! misses. Coherence across caches is the concern of `coresim-core`.
//!
//! # Example
//!
//! ```
//! use coresim_cache::{Cache, CacheGeometry, ClassifyResult, MesiState};
//!
//! let geometry = CacheGeometry::from_bits(1, 4, 2).unwrap();
//! let mut cache = Cache::new(geometry);
//!
//! let (tag, set_index, _offset) = cache.decode(0x0000_0000);
//! assert_eq!(cache.classify(0x0000_0000), ClassifyResult::Miss);
//!
//! let way = cache.victim(set_index);
//! cache.install(set_index, way, tag, MesiState::Exclusive);
//! assert!(matches!(cache.classify(0x0000_0000), ClassifyResult::Hit { .. }));
//! ```

#![warn(missing_docs)]

mod cache;
mod counters;
mod error;
mod geometry;
mod line;
mod mesi;

pub use cache::{Cache, ClassifyResult};
pub use counters::CacheCounters;
pub use error::GeometryError;
pub use geometry::CacheGeometry;
pub use line::{CacheLine, CacheSet};
pub use mesi::MesiState;
