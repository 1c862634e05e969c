/// Bounded linear undo/redo log of document snapshots.
///
/// The log is an ordered list of snapshots with a cursor on the "current"
/// entry. Undo and redo only move the cursor; a commit truncates everything
/// after the cursor, appends, and evicts from the front when the log is full.
use std::collections::VecDeque;

use crate::config::HistoryConfig;
use crate::snapshot::Snapshot;

/// Manages undo/redo history for a single editing session.
///
/// Invariants: when the log is non-empty the cursor is in `0..len`, and
/// `len <= max_states`. An empty log has no cursor.
#[derive(Clone)]
pub struct HistoryManager {
    /// Snapshots, oldest first.
    entries: VecDeque<Snapshot>,
    /// Position of the current entry. `None` only while the log is empty.
    cursor: Option<usize>,
    config: HistoryConfig,
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("max_states", &self.config.max_states)
            .finish()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryManager {
    /// Creates an empty history.
    pub fn new(config: HistoryConfig) -> Self {
        let config = HistoryConfig::with_max_states(config.max_states);
        Self {
            entries: VecDeque::with_capacity(config.max_states.min(64)),
            cursor: None,
            config,
        }
    }

    /// Creates a history whose first entry is `initial` (the document as loaded).
    pub fn with_initial(config: HistoryConfig, initial: impl Into<Snapshot>) -> Self {
        let mut manager = Self::new(config);
        manager.commit(initial);
        manager
    }

    /// Records a new snapshot.
    ///
    /// Returns `false` without touching the log when `snapshot` equals the
    /// entry under the cursor. Otherwise drops the redo branch, appends the
    /// snapshot and moves the cursor onto it, evicting the oldest entry if
    /// the log would exceed `max_states`.
    pub fn commit(&mut self, snapshot: impl Into<Snapshot>) -> bool {
        let snapshot = snapshot.into();
        if self.current() == Some(&snapshot) {
            tracing::trace!("Skipping duplicate snapshot");
            return false;
        }

        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }
        self.entries.push_back(snapshot);

        // The cursor is at the end here, so dropping the front keeps it on
        // the entry that was just appended.
        while self.entries.len() > self.config.max_states {
            self.entries.pop_front();
            tracing::debug!(
                max_states = self.config.max_states,
                "Evicted oldest history snapshot"
            );
        }
        self.cursor = Some(self.entries.len() - 1);

        tracing::debug!(
            len = self.entries.len(),
            cursor = self.entries.len() - 1,
            "Committed snapshot"
        );
        true
    }

    /// Steps back one entry and returns the snapshot to restore.
    ///
    /// Returns `None` when already at the oldest entry or the log is empty.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let cursor = self.cursor.filter(|&c| c > 0)? - 1;
        self.cursor = Some(cursor);
        tracing::debug!(cursor, "Undo");
        self.entries.get(cursor).cloned()
    }

    /// Steps forward one entry and returns the snapshot to restore.
    ///
    /// Returns `None` when already at the newest entry or the log is empty.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let cursor = self.cursor.filter(|&c| c + 1 < self.entries.len())? + 1;
        self.cursor = Some(cursor);
        tracing::debug!(cursor, "Redo");
        self.entries.get(cursor).cloned()
    }

    /// Whether an older entry exists before the cursor.
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    /// Whether a newer entry exists after the cursor.
    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    /// The entry under the cursor.
    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Cursor position, `None` for an empty log.
    pub fn index(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of snapshots in the log.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the log, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    /// Configured capacity.
    pub fn max_states(&self) -> usize {
        self.config.max_states
    }

    /// Drops all history.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}
