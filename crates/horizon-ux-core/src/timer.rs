//! One-shot timer queue for Horizon UX.
//!
//! Widgets use timers for debouncing and for deferring work until the
//! current input event has settled. The queue never reads the clock itself:
//! callers pass the current [`Instant`] in, which keeps timer behaviour
//! deterministic for the host's event loop and for tests.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TimerError};
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
    /// Insertion order, so timers with equal deadlines fire first-in first-out.
    sequence: u64,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time && self.sequence == other.sequence
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other
            .fire_time
            .cmp(&self.fire_time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Manages pending one-shot timers.
#[derive(Debug, Default)]
pub struct TimerQueue {
    /// Deadlines of all pending timers.
    timers: SlotMap<TimerId, Instant>,
    /// Priority queue of pending timer fires (min-heap by fire time).
    queue: BinaryHeap<TimerQueueEntry>,
    /// Next insertion sequence number.
    next_sequence: u64,
}

impl TimerQueue {
    /// Create an empty timer queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a one-shot timer firing `delay` after `now`.
    ///
    /// A zero delay defers the timer to the next call of
    /// [`process_expired`](Self::process_expired).
    pub fn start_one_shot(&mut self, now: Instant, delay: Duration) -> TimerId {
        let fire_time = now + delay;
        let id = self.timers.insert(fire_time);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push(TimerQueueEntry {
            id,
            fire_time,
            sequence,
        });
        tracing::trace!(target: targets::TIMER, ?id, ?delay, "timer started");
        id
    }

    /// Stop and remove a pending timer.
    ///
    /// Returns an error if the timer already fired or was stopped before.
    pub fn stop(&mut self, id: TimerId) -> Result<()> {
        if self.timers.remove(id).is_some() {
            tracing::trace!(target: targets::TIMER, ?id, "timer stopped");
            Ok(())
        } else {
            Err(TimerError::InvalidTimerId.into())
        }
    }

    /// Check if a timer is still pending.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// The deadline of the earliest pending timer, if any.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_stopped();
        self.queue.peek().map(|entry| entry.fire_time)
    }

    /// Duration from `now` until the next timer fires.
    ///
    /// Returns `None` if there are no pending timers.
    pub fn time_until_next(&mut self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Remove and return all timers due at `now`, earliest first.
    #[tracing::instrument(skip(self), target = "horizon_ux_core::timer", level = "trace")]
    pub fn process_expired(&mut self, now: Instant) -> Vec<TimerId> {
        let mut fired = Vec::new();

        while let Some(entry) = self.queue.peek() {
            if entry.fire_time > now {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };
            // Stopped timers leave stale heap entries behind.
            if self.timers.remove(entry.id).is_some() {
                tracing::trace!(target: targets::TIMER, id = ?entry.id, "timer fired");
                fired.push(entry.id);
            }
        }

        fired
    }

    /// Get the number of pending timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Stop every pending timer.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.queue.clear();
    }

    fn discard_stopped(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.timers.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }
    }
}
