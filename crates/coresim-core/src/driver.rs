//! The per-core driver: advances one core's trace pointer when unblocked,
//! classifies the next reference, and either completes it locally or hands
//! a request to the bus.

use coresim_cache::{Cache, ClassifyResult, MesiState};

use crate::bus::BusRequest;
use crate::trace::{Trace, TraceOp};

/// What happened to a core in one scheduler cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The trace is exhausted; nothing to do.
    Done,
    /// The core was stalled on a prior bus transaction; stall decremented.
    Stalled,
    /// A read hit, or a write hit to Modified/Exclusive, completed locally.
    HitCompleted,
    /// The reference needs the bus but it is unavailable this cycle; the
    /// trace head was not advanced.
    WaitingForBus,
    /// The reference needed the bus and the bus was available; the trace
    /// head was advanced and the scheduler should enqueue this request.
    BusRequestIssued(BusRequest),
}

/// Advance `core`'s trace by at most one reference.
///
/// `bus_available` is `true` iff the bus is idle and its queue is empty (the
/// precondition under which a miss or write-hit-to-Shared may be admitted
/// onto the bus this cycle).
pub fn step_core(cache: &mut Cache, trace: &Trace, head: &mut usize, core: usize, bus_available: bool) -> StepResult {
    if *head >= trace.len() {
        return StepResult::Done;
    }
    if cache.stall_remaining() > 0 {
        cache.decrement_stall();
        return StepResult::Stalled;
    }

    let entry = trace[*head];
    let (_, set_index, _offset) = cache.decode(entry.address);

    match cache.classify(entry.address) {
        ClassifyResult::Hit { way, state } => match (entry.op, state) {
            (TraceOp::Read, _) => {
                cache.touch(set_index, way);
                cache.counters_mut().reads += 1;
                cache.counters_mut().hit_cycles += 1;
                *head += 1;
                StepResult::HitCompleted
            }
            (TraceOp::Write, MesiState::Modified) => {
                cache.touch(set_index, way);
                cache.counters_mut().writes += 1;
                cache.counters_mut().hit_cycles += 1;
                *head += 1;
                StepResult::HitCompleted
            }
            (TraceOp::Write, MesiState::Exclusive) => {
                cache.promote_on_write(set_index, way);
                cache.counters_mut().writes += 1;
                cache.counters_mut().hit_cycles += 1;
                *head += 1;
                StepResult::HitCompleted
            }
            (TraceOp::Write, MesiState::Shared) => {
                if bus_available {
                    cache.counters_mut().writes += 1;
                    *head += 1;
                    StepResult::BusRequestIssued(BusRequest {
                        initiator_core: core,
                        address: entry.address,
                        is_write: true,
                        is_writeback: false,
                    })
                } else {
                    cache.counters_mut().idle_cycles += 1;
                    StepResult::WaitingForBus
                }
            }
            (TraceOp::Write, MesiState::Invalid) => {
                unreachable!("classify never reports a Hit with Invalid state")
            }
        },
        ClassifyResult::Miss => {
            if bus_available {
                match entry.op {
                    TraceOp::Read => cache.counters_mut().reads += 1,
                    TraceOp::Write => cache.counters_mut().writes += 1,
                }
                *head += 1;
                StepResult::BusRequestIssued(BusRequest {
                    initiator_core: core,
                    address: entry.address,
                    is_write: entry.op == TraceOp::Write,
                    is_writeback: false,
                })
            } else {
                cache.counters_mut().idle_cycles += 1;
                StepResult::WaitingForBus
            }
        }
    }
}
