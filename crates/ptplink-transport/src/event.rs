use std::collections::VecDeque;

use ptplink_frame::Event;

/// FIFO of events picked up while the command path was busy.
///
/// Transports push onto it during opportunistic checks; the session pops
/// from it before polling the device again.
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.inner.push_back(event);
    }

    /// Oldest queued event.
    pub fn pop(&mut self) -> Option<Event> {
        self.inner.pop_front()
    }

    pub fn peek(&self) -> Option<&Event> {
        self.inner.front()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Remove and yield every queued event, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.inner.drain(..)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
