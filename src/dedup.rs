//! Process-wide pin dedup index
//!
//! One `DedupIndex` is shared by every topic task through an `Arc`. The
//! check-and-insert in `accept` is a single `DashSet::insert`, so two topics
//! racing on the same pin id can never both win.

use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct DedupIndex {
    seen: DashSet<String>,
}

impl DedupIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `pin_id`; true only for the first caller.
    pub fn accept(&self, pin_id: &str) -> bool {
        self.seen.insert(pin_id.to_string())
    }

    #[must_use]
    pub fn contains(&self, pin_id: &str) -> bool {
        self.seen.contains(pin_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_accept_wins() {
        let index = DedupIndex::new();
        assert!(index.accept("123"));
        assert!(!index.accept("123"));
        assert!(index.contains("123"));
        assert!(!index.contains("456"));
        assert_eq!(index.len(), 1);
    }
}
