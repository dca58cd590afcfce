//! Last-value-wins storage.
//!
//! Producers overwrite, consumers read whatever is newest. Nothing queues, so a
//! slow reader sees a newer value on its next read instead of a backlog.

use std::sync::Arc;

use parking_lot::Mutex;

struct SlotState<T> {
    value: Option<Arc<T>>,
    sequence: u64,
    consumed_sequence: u64,
    overwritten: u64,
}

/// A single guarded slot holding the most recent value.
pub struct LatestSlot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                value: None,
                sequence: 0,
                consumed_sequence: 0,
                overwritten: 0,
            }),
        }
    }

    /// Store `value`, replacing anything already held. Returns the new sequence number.
    pub fn publish(&self, value: T) -> u64 {
        self.publish_with(|_| value)
    }

    /// Build the next value from the current one while holding the lock.
    pub fn publish_with(&self, build: impl FnOnce(Option<&T>) -> T) -> u64 {
        let mut state = self.state.lock();
        let next = build(state.value.as_deref());
        if state.value.is_some() && state.sequence > state.consumed_sequence {
            state.overwritten = state.overwritten.saturating_add(1);
        }
        state.value = Some(Arc::new(next));
        state.sequence = state.sequence.saturating_add(1);
        state.sequence
    }

    /// Newest value without marking it consumed.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.state.lock().value.clone()
    }

    /// Newest value plus its sequence number, marking it consumed.
    pub fn consume(&self) -> Option<(u64, Arc<T>)> {
        let mut state = self.state.lock();
        let value = state.value.clone()?;
        state.consumed_sequence = state.sequence;
        Some((state.sequence, value))
    }

    /// Newest value only if it arrived after the last `consume`.
    pub fn consume_fresh(&self) -> Option<(u64, Arc<T>)> {
        let mut state = self.state.lock();
        if state.sequence == state.consumed_sequence {
            return None;
        }
        let value = state.value.clone()?;
        state.consumed_sequence = state.sequence;
        Some((state.sequence, value))
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().value.is_none()
    }

    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.value = None;
        state.consumed_sequence = state.sequence;
    }

    pub fn stats(&self) -> SlotStats {
        let state = self.state.lock();
        SlotStats {
            published_count: state.sequence,
            overwritten_count: state.overwritten,
        }
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Slot statistics for monitoring upstream burstiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotStats {
    pub published_count: u64,
    /// Values replaced before any consumer read them.
    pub overwritten_count: u64,
}
