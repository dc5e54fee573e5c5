//! Tick-driven deferred work.
//!
//! Continuations are plain data: callers schedule a payload for a future tick
//! and the host loop hands due payloads back to whoever understands them.
//! Payloads due on the same tick come back in scheduling order.

use std::collections::{BTreeMap, VecDeque};

use stuck_core::SimTick;
use tracing::trace;

/// Deferred execution on the main tick loop.
pub trait Scheduler<T> {
    /// Current tick.
    fn now(&self) -> SimTick;

    /// Queue `task` to become due `delay` ticks from now. A zero delay makes
    /// it due on the next [`TickScheduler::advance`].
    fn schedule_after(&mut self, delay: u64, task: T);
}

/// Deterministic single-threaded scheduler keyed by tick.
#[derive(Debug)]
pub struct TickScheduler<T> {
    now: SimTick,
    queue: BTreeMap<SimTick, VecDeque<T>>,
    pending: usize,
}

impl<T> Default for TickScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TickScheduler<T> {
    pub fn new() -> Self {
        Self::starting_at(SimTick::ZERO)
    }

    pub fn starting_at(now: SimTick) -> Self {
        Self {
            now,
            queue: BTreeMap::new(),
            pending: 0,
        }
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending == 0
    }

    /// Step one tick forward and drain everything now due.
    pub fn advance(&mut self) -> Vec<T> {
        self.now = self.now.advance(1);
        self.drain_due()
    }

    /// Step `ticks` forward, returning everything that became due on the way.
    pub fn advance_by(&mut self, ticks: u64) -> Vec<T> {
        let mut due = Vec::new();
        for _ in 0..ticks {
            due.extend(self.advance());
        }
        due
    }

    fn drain_due(&mut self) -> Vec<T> {
        let mut due = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            if *entry.key() > self.now {
                break;
            }
            due.extend(entry.remove());
        }
        self.pending -= due.len();
        if !due.is_empty() {
            trace!(tick = self.now.0, count = due.len(), "scheduled tasks due");
        }
        due
    }
}

impl<T> Scheduler<T> for TickScheduler<T> {
    fn now(&self) -> SimTick {
        self.now
    }

    fn schedule_after(&mut self, delay: u64, task: T) {
        let due = self.now.advance(delay.max(1));
        self.queue.entry(due).or_default().push_back(task);
        self.pending += 1;
    }
}
