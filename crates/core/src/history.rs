//! Linear undo/redo history of full-state snapshots
//!
//! Each entry is a deep copy of the measurement list plus scale and unit.
//! Appending after an undo discards the redo branch; there is no tree.

use crate::measurement::Measurement;
use crate::scale::ScaleSetting;

/// A complete, self-consistent copy of committed state
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub measurements: Vec<Measurement>,
    pub scale: ScaleSetting,
}

impl HistorySnapshot {
    /// Capture a snapshot by value
    pub fn capture(measurements: &[Measurement], scale: ScaleSetting) -> Self {
        Self {
            measurements: measurements.to_vec(),
            scale,
        }
    }
}

/// Ordered snapshots plus a cursor
///
/// The cursor is `None` only after [`History::reset`] or before the first
/// entry; otherwise it always points inside `entries`.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistorySnapshot>,
    index: Option<usize>,
    max_entries: Option<usize>,
}

impl History {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history seeded with a baseline snapshot
    pub fn with_baseline(snapshot: HistorySnapshot) -> Self {
        let mut history = Self::new();
        history.push(snapshot);
        history
    }

    /// Cap the number of retained entries (oldest dropped first)
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries.filter(|&max| max > 0);
        self.trim();
        self
    }

    /// Truncate the redo branch and append a snapshot at the tail
    pub fn push(&mut self, snapshot: HistorySnapshot) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push(snapshot);
        self.index = Some(self.entries.len() - 1);
        self.trim();
    }

    /// Step back one entry, returning the snapshot to restore
    pub fn undo(&mut self) -> Option<&HistorySnapshot> {
        let index = self.index.filter(|&i| i > 0)? - 1;
        self.index = Some(index);
        self.entries.get(index)
    }

    /// Step forward one entry, returning the snapshot to restore
    pub fn redo(&mut self) -> Option<&HistorySnapshot> {
        let index = self.index.map_or(0, |i| i + 1);
        if index >= self.entries.len() {
            return None;
        }
        self.index = Some(index);
        self.entries.get(index)
    }

    /// Drop every entry
    pub fn reset(&mut self) {
        self.entries.clear();
        self.index = None;
    }

    /// Current cursor
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.map_or(0, |i| i + 1) < self.entries.len()
    }

    /// Snapshot under the cursor
    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.index.and_then(|i| self.entries.get(i))
    }

    fn trim(&mut self) {
        let Some(max) = self.max_entries else {
            return;
        };
        if self.entries.len() > max {
            let excess = self.entries.len() - max;
            self.entries.drain(..excess);
            self.index = self.index.map(|i| i.saturating_sub(excess));
        }
    }
}
