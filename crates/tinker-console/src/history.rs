//! Submitted-line history.

use std::collections::VecDeque;

/// Previously submitted lines, newest first, without consecutive duplicates.
#[derive(Debug)]
pub struct HistoryList {
    entries: VecDeque<String>,
    capacity: usize,
}

impl HistoryList {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record a submitted line. Returns `false` if it repeats the newest
    /// entry and was not added.
    pub fn push(&mut self, line: &str) -> bool {
        if self.entries.front().is_some_and(|newest| newest == line) {
            return false;
        }
        self.entries.push_front(line.to_string());
        self.entries.truncate(self.capacity);
        true
    }

    /// Entry `index` back from the newest.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn repeated_line_recorded_once() {
        let mut h = HistoryList::new(10);
        assert!(h.push("help"));
        assert!(!h.push("help"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn non_consecutive_repeats_are_kept() {
        let mut h = HistoryList::new(10);
        h.push("a");
        h.push("b");
        h.push("a");
        assert_eq!(h.iter().collect::<Vec<_>>(), vec!["a", "b", "a"]);
        assert_eq!(h.get(1), Some("b"));
        assert_eq!(h.get(3), None);
    }

    #[test]
    fn bounded() {
        let mut h = HistoryList::new(2);
        for line in ["1", "2", "3"] {
            h.push(line);
        }
        assert_eq!(h.iter().collect::<Vec<_>>(), vec!["3", "2"]);
    }

    proptest! {
        #[test]
        fn no_identical_neighbours(lines in prop::collection::vec("[ab]{1,2}", 0..40)) {
            let mut h = HistoryList::new(100);
            for line in &lines {
                h.push(line);
            }
            let entries: Vec<&str> = h.iter().collect();
            prop_assert!(entries.windows(2).all(|w| w[0] != w[1]));
        }
    }
}
