//! Bounded scrollback of colored console lines.

use std::collections::VecDeque;

use tinker_types::color::Color;

/// One line of console output.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleLine {
    pub text: String,
    pub color: Color,
}

/// Console output, newest line first.
///
/// Holds at most `capacity` lines; pushing beyond that evicts the oldest.
#[derive(Debug)]
pub struct ScrollBuffer {
    lines: VecDeque<ConsoleLine>,
    capacity: usize,
}

impl ScrollBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a line as the newest entry.
    pub fn push(&mut self, text: impl Into<String>, color: Color) {
        self.lines.push_front(ConsoleLine {
            text: text.into(),
            color,
        });
        self.lines.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Line `index`, counting from the newest.
    pub fn get(&self, index: usize) -> Option<&ConsoleLine> {
        self.lines.get(index)
    }

    /// Lines from newest to oldest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ConsoleLine> {
        self.lines.iter()
    }

    /// Up to `count` lines starting `offset` lines back from the newest,
    /// newest first.
    pub fn window(&self, offset: usize, count: usize) -> impl Iterator<Item = &ConsoleLine> {
        self.lines.iter().skip(offset).take(count)
    }
}
