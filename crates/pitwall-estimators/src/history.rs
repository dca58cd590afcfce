//! Fixed-capacity FIFO sample window.

use std::collections::VecDeque;

/// Samples kept per car unless configured otherwise.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// A FIFO window that evicts its oldest sample once `capacity` is reached.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedHistory {
    window: VecDeque<f64>,
    capacity: usize,
}

impl BoundedHistory {
    /// Capacity is clamped to at least one sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `value`, returning the evicted sample if the window was full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.window.len() == self.capacity {
            self.window.pop_front()
        } else {
            None
        };
        self.window.push_back(value);
        evicted
    }

    pub fn mean(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        let sum: f64 = self.window.iter().sum();
        Some(sum / self.window.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<f64> {
        self.window.back().copied()
    }

    /// Samples oldest first.
    pub fn to_vec(&self) -> Vec<f64> {
        self.window.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

impl Default for BoundedHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}
