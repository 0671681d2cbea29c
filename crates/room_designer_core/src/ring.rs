// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-capacity circular buffer.

/// Circular buffer that evicts its oldest item once full.
///
/// Logical index `0` is always the oldest item. Slot positions are
/// `(head + i) % capacity`, so eviction never shifts stored items.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    head: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer holding at most `capacity` items (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    /// Maximum number of items
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no items are stored
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check if the next push evicts
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Append an item, returning the evicted oldest item if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        if !self.is_full() {
            self.slots.push(item);
            return None;
        }

        let evicted = std::mem::replace(&mut self.slots[self.head], item);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    /// Get an item by logical index (0 = oldest)
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.slots.len() {
            return None;
        }
        self.slots.get((self.head + index) % self.capacity)
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.slots.len()).filter_map(move |index| self.get(index))
    }

    /// Remove every item
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Build a new buffer with the same capacity holding the oldest `count` items
    pub fn truncated(&self, count: usize) -> Self {
        let mut ring = Self::with_capacity(self.capacity);
        for item in self.iter().take(count) {
            ring.push(item.clone());
        }
        ring
    }
}
