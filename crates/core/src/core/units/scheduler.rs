//! Event-driven scheduler (component D, §4.4).
//!
//! A priority queue of deferred callbacks, keyed by absolute fire cycle
//! with insertion order as a FIFO tie-break — two events due on the same
//! cycle run in the order they were scheduled, mirroring `sched_add`'s
//! linked-list-append-on-tie behaviour in the original implementation.
//! Generic over the target type a callback mutates, so this module has no
//! dependency on [`crate::sim::simulator::Simulator`].
//!
//! A callback reschedules itself by *returning* the next absolute fire
//! cycle rather than calling back into its own host's scheduler field: the
//! host (e.g. `Simulator`) owns its `Scheduler<Simulator>` as a plain
//! field, and a callback already holds `&mut Simulator` while `run_due` is
//! still borrowing that same field, so a callback cannot reach back into
//! `target.scheduler` itself without aliasing it. Folding a reschedule
//! request into the callback's return value keeps the re-insertion inside
//! `run_due`, where it belongs, and keeps the cascade-cap bookkeeping below
//! correct for rescheduling chains that span many calls.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::common::SimError;

/// A handle returned by [`Scheduler::add`], used to cancel a pending event
/// before it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventId(u64);

type Callback<T> = Box<dyn FnMut(&mut T) -> Option<u64>>;

struct Event<T> {
    fire_at: u64,
    seq: u64,
    id: EventId,
    callback: Callback<T>,
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}
impl<T> Eq for Event<T> {}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Event<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse both fields so the earliest
        // fire cycle (and, on a tie, the earliest insertion) sorts first.
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// The event-driven scheduler.
pub struct Scheduler<T> {
    queue: BinaryHeap<Event<T>>,
    next_seq: u64,
    next_id: u64,
    cascade_cap: u32,
}

impl<T> Scheduler<T> {
    /// Builds a scheduler with the configured zero-delay cascade cap
    /// (`sim.scheduler_cascade_cap`).
    #[must_use]
    pub fn new(cascade_cap: u32) -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
            next_id: 0,
            cascade_cap,
        }
    }

    /// Schedules `callback` to run when the clock reaches `fire_at`
    /// (absolute cycle count, not a delta). `callback` returns `Some(next)`
    /// to reschedule itself at absolute cycle `next`, or `None` to run only
    /// once. Returns a handle that can later cancel the event with
    /// [`Scheduler::cancel`].
    pub fn add(&mut self, fire_at: u64, callback: impl FnMut(&mut T) -> Option<u64> + 'static) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Event {
            fire_at,
            seq,
            id,
            callback: Box::new(callback),
        });
        id
    }

    /// Cancels a pending event by handle. Returns whether an event was
    /// found and removed.
    pub fn cancel(&mut self, id: EventId) -> bool {
        let before = self.queue.len();
        let remaining: Vec<Event<T>> = self.queue.drain().filter(|e| e.id != id).collect();
        let found = remaining.len() != before;
        self.queue = remaining.into_iter().collect();
        found
    }

    /// Returns the fire cycle of the next pending event, if any.
    #[must_use]
    pub fn next_fire_time(&self) -> Option<u64> {
        self.queue.peek().map(|e| e.fire_at)
    }

    /// Runs every event due at or before `now`, in fire-cycle then
    /// insertion order. A callback that reschedules itself for the same
    /// cycle (a zero-delay cascade) may cause further events to become due
    /// within this same call; `cascade_cap` bounds how many times that is
    /// allowed to happen before this reports an error; §4.4 treats this as
    /// a misbehaving event re-scheduling itself rather than legitimate
    /// work.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::SchedulerCascadeOverflow`] if more than
    /// `cascade_cap` rounds of newly-due events occur within this call.
    pub fn run_due(&mut self, now: u64, target: &mut T) -> Result<(), SimError> {
        let seq_at_entry = self.next_seq;
        let mut induced = 0u32;
        while let Some(next) = self.queue.peek() {
            if next.fire_at > now {
                break;
            }
            let mut event = self.queue.pop().expect("peeked Some");
            if event.seq >= seq_at_entry {
                induced += 1;
                if induced > self.cascade_cap {
                    return Err(SimError::SchedulerCascadeOverflow {
                        limit: self.cascade_cap,
                    });
                }
            }
            if let Some(next_fire_at) = (event.callback)(target) {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.queue.push(Event {
                    fire_at: next_fire_at,
                    seq,
                    id: event.id,
                    callback: event.callback,
                });
            }
        }
        Ok(())
    }
}

impl<T> PartialEq for EventId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
