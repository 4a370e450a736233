//! Bounded most-recent-first history of completed scans

use cscan_types::ScanResult;
use std::collections::VecDeque;

/// In-memory history of completed scan results.
///
/// Newest first. Pushing onto a full history evicts the oldest entry. Results
/// are not deduplicated, so scanning the same image twice keeps both.
#[derive(Debug, Clone)]
pub struct ScanHistory {
    entries: VecDeque<ScanResult>,
    capacity: usize,
}

impl ScanHistory {
    /// A capacity of 0 is raised to 1.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, result: ScanResult) {
        self.entries.push_front(result);
        self.entries.truncate(self.capacity);
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, where 0 is the most recent.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScanResult> {
        self.entries.get(index)
    }

    #[must_use]
    pub fn latest(&self) -> Option<&ScanResult> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanResult> + '_ {
        self.entries.iter()
    }
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::with_capacity(cscan_config::constants::DEFAULT_HISTORY_CAPACITY)
    }
}
