//! Bounded history of recent keypoint snapshots.
//!
//! Insertion order is temporal order.  Once the buffer is full the oldest
//! snapshot falls off the front.

use std::collections::VecDeque;

use crate::keypoint::KeypointSnapshot;

/// Number of snapshots kept for temporal analysis.
pub const HISTORY_CAPACITY: usize = 10;

/// FIFO buffer of the last [`HISTORY_CAPACITY`] snapshots, oldest first.
#[derive(Clone, Debug)]
pub struct KeypointHistory {
    frames:   VecDeque<KeypointSnapshot>,
    capacity: usize,
}

impl KeypointHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// A history holding at most `capacity` snapshots (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        KeypointHistory {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest when over capacity.
    pub fn push(&mut self, snapshot: KeypointSnapshot) {
        if self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(snapshot);
    }

    /// The most recent snapshot, if any.
    pub fn last(&self) -> Option<&KeypointSnapshot> {
        self.frames.back()
    }

    /// The last `k` snapshots, oldest first.  Fewer when the history is
    /// shorter than `k`.
    pub fn recent(&self, k: usize) -> Vec<&KeypointSnapshot> {
        let skip = self.frames.len().saturating_sub(k);
        self.frames.iter().skip(skip).collect()
    }

    /// All snapshots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &KeypointSnapshot> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize      { self.frames.len() }
    pub fn is_empty(&self) -> bool  { self.frames.is_empty() }
    pub fn capacity(&self) -> usize { self.capacity }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl Default for KeypointHistory {
    fn default() -> Self {
        Self::new()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::BodyPoint;
    use proptest::prelude::*;

    fn snap(i: i32) -> KeypointSnapshot {
        KeypointSnapshot::from_points([(BodyPoint::Nose, (i, i))])
    }

    #[test]
    fn empty_history_is_queryable() {
        let h = KeypointHistory::new();
        assert!(h.last().is_none());
        assert!(h.recent(4).is_empty());
        assert!(h.is_empty());
    }

    #[test]
    fn last_is_most_recent() {
        let mut h = KeypointHistory::new();
        h.push(snap(1));
        h.push(snap(2));
        assert_eq!(h.last(), Some(&snap(2)));
    }

    #[test]
    fn fifteen_pushes_keep_last_ten_in_order() {
        let mut h = KeypointHistory::new();
        for i in 0..15 { h.push(snap(i)); }
        assert_eq!(h.len(), 10);
        let recent = h.recent(10);
        let expected: Vec<KeypointSnapshot> = (5..15).map(snap).collect();
        assert_eq!(recent.into_iter().cloned().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn recent_shorter_than_requested() {
        let mut h = KeypointHistory::new();
        h.push(snap(1));
        h.push(snap(2));
        let r = h.recent(4);
        assert_eq!(r.len(), 2);
        assert_eq!(r[0], &snap(1));
        assert_eq!(r[1], &snap(2));
    }

    #[test]
    fn recent_zero_is_empty() {
        let mut h = KeypointHistory::new();
        h.push(snap(1));
        assert!(h.recent(0).is_empty());
    }

    #[test]
    fn clear_empties() {
        let mut h = KeypointHistory::new();
        h.push(snap(1));
        h.clear();
        assert!(h.is_empty());
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(pushes in 0usize..100) {
            let mut h = KeypointHistory::new();
            for i in 0..pushes {
                h.push(snap(i as i32));
                prop_assert!(h.len() <= HISTORY_CAPACITY);
            }
            prop_assert_eq!(h.len(), pushes.min(HISTORY_CAPACITY));
        }
    }
}
