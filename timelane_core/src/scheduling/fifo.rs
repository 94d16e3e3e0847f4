//! FIFO queue backing each lane's pending jobs.

use std::collections::VecDeque;

/// Unbounded FIFO with O(1) push and pop.
#[derive(Debug)]
pub struct Fifo<T> {
    items: VecDeque<T>,
}

impl<T> Fifo<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append an item at the tail.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Remove and return the head, `None` if empty.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for Fifo<T> {
    fn default() -> Self {
        Self::new()
    }
}
