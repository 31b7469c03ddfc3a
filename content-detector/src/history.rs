//! Bounded history of content snapshots.

use crate::types::ContentSnapshot;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

/// Default number of snapshots kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Compute SHA-256 hash of content
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl ContentSnapshot {
    /// Snapshot `content` as of `timestamp`
    pub fn capture(content: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            content: content.to_string(),
            timestamp,
            length: content.len(),
            content_hash: compute_hash(content),
        }
    }
}

/// FIFO ring of the most recent snapshots
///
/// Never holds more than `capacity` snapshots. Identical consecutive content
/// is recorded like anything else; callers that want to skip duplicates can
/// check `is_duplicate_of_latest` first.
#[derive(Debug, Clone)]
pub struct ContentHistory {
    snapshots: VecDeque<ContentSnapshot>,
    capacity: usize,
}

impl ContentHistory {
    /// Create a history holding at most `capacity` snapshots (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest past capacity
    pub fn record(&mut self, snapshot: ContentSnapshot) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
    }

    /// Snapshots from oldest to newest
    pub fn snapshots(&self) -> impl Iterator<Item = &ContentSnapshot> {
        self.snapshots.iter()
    }

    /// Owned copy of the snapshots, oldest first
    pub fn to_vec(&self) -> Vec<ContentSnapshot> {
        self.snapshots.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&ContentSnapshot> {
        self.snapshots.back()
    }

    /// Whether `content_hash` matches the newest snapshot
    pub fn is_duplicate_of_latest(&self, content_hash: &str) -> bool {
        self.latest()
            .map(|s| s.content_hash == content_hash)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

impl Default for ContentHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(content: &str) -> ContentSnapshot {
        ContentSnapshot::capture(content, Utc::now())
    }

    #[test]
    fn test_capture_fills_metadata() {
        let snap = snapshot("héllo");
        assert_eq!(snap.length, 6);
        assert_eq!(snap.content_hash, compute_hash("héllo"));
        assert_eq!(snap.content_hash.len(), 64);
    }

    #[test]
    fn test_hash_computation() {
        let hash1 = compute_hash("hello world");
        let hash2 = compute_hash("hello world");
        let hash3 = compute_hash("hello world!");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_record_under_capacity() {
        let mut history = ContentHistory::new(3);
        history.record(snapshot("a"));
        history.record(snapshot("b"));

        let contents: Vec<_> = history.snapshots().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b"]);
        assert_eq!(history.latest().unwrap().content, "b");
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let mut history = ContentHistory::default();
        for i in 0..15 {
            history.record(snapshot(&format!("v{}", i)));
        }

        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        let contents: Vec<_> = history.snapshots().map(|s| s.content.clone()).collect();
        let expected: Vec<_> = (5..15).map(|i| format!("v{}", i)).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_identical_content_still_recorded() {
        let mut history = ContentHistory::new(5);
        let first = snapshot("same");
        assert!(!history.is_duplicate_of_latest(&first.content_hash));

        history.record(first.clone());
        assert!(history.is_duplicate_of_latest(&first.content_hash));

        history.record(snapshot("same"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut history = ContentHistory::new(0);
        history.record(snapshot("x"));
        history.record(snapshot("y"));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.to_vec()[0].content, "y");
    }

    #[test]
    fn test_clear() {
        let mut history = ContentHistory::new(2);
        history.record(snapshot("x"));
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}
