// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded recent-event buffers, one per scope.

use std::collections::VecDeque;

use dashmap::DashMap;
use tern_core::{InboundEvent, Scope};

/// Fixed-capacity FIFO of recent events. The oldest entry is evicted on overflow.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    entries: VecDeque<InboundEvent>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, event: InboundEvent) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    /// Shrink or grow the bound, evicting oldest entries if needed.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > capacity {
            self.entries.pop_front();
        }
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &InboundEvent> {
        self.entries.iter()
    }
}

/// All history buffers, keyed by scope.
#[derive(Debug, Default)]
pub struct HistoryStore {
    buffers: DashMap<Scope, HistoryBuffer>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` to the buffer for `scope`, creating it with `capacity` on first use.
    pub fn append(&self, scope: Scope, capacity: usize, event: InboundEvent) {
        if capacity == 0 {
            return;
        }
        let mut buffer = self
            .buffers
            .entry(scope)
            .or_insert_with(|| HistoryBuffer::new(capacity));
        if buffer.capacity() != capacity {
            buffer.resize(capacity);
        }
        buffer.push(event);
    }

    /// Copy of the buffered events for `scope`, oldest first.
    pub fn snapshot(&self, scope: Scope) -> Option<Vec<InboundEvent>> {
        self.buffers
            .get(&scope)
            .map(|b| b.iter().cloned().collect())
    }

    pub fn clear(&self, scope: Scope) {
        self.buffers.remove(&scope);
    }
}
