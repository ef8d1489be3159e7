//! # Undo/Redo History
//!
//! Snapshot-based edit history for the section collection.
//!
//! ## Design
//!
//! - Every edit records a full, immutable copy of the collection
//! - `entries[cursor]` is always the current state
//! - Undo/redo only move the cursor; nothing is recomputed
//! - Recording after an undo discards the redoable future
//! - Each snapshot carries a revision number; the revision last written to
//!   storage is the saved baseline used for `has_unsaved_changes`
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new(sections);
//!
//! history.record(next_sections);
//! assert!(history.can_undo());
//!
//! let previous = history.undo().unwrap();
//! let restored = history.redo().unwrap();
//! ```

use crate::section::Section;
use std::ops::Deref;
use std::sync::Arc;

/// Immutable copy of the section collection at one edit step
#[derive(Debug, Clone)]
pub struct Snapshot {
    revision: u64,
    sections: Arc<[Section]>,
}

impl Snapshot {
    fn new(revision: u64, sections: Vec<Section>) -> Self {
        Self {
            revision,
            sections: sections.into(),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn to_vec(&self) -> Vec<Section> {
        self.sections.to_vec()
    }

    /// Same entry of the same history, not merely equal contents
    pub fn same_as(&self, other: &Snapshot) -> bool {
        self.revision == other.revision && Arc::ptr_eq(&self.sections, &other.sections)
    }
}

impl Deref for Snapshot {
    type Target = [Section];

    fn deref(&self) -> &[Section] {
        &self.sections
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.revision == other.revision && self.sections == other.sections
    }
}

/// Linear undo/redo log of snapshots
#[derive(Debug)]
pub struct History {
    /// Snapshots, oldest first
    entries: Vec<Snapshot>,

    /// Index of the current snapshot
    cursor: usize,

    /// Revision known to match durable storage
    saved_revision: Option<u64>,

    /// Next revision number to hand out
    next_revision: u64,

    /// Maximum number of snapshots kept (0 = unlimited)
    max_levels: usize,
}

impl History {
    /// Start a history whose only entry is `initial`, marked as saved
    pub fn new(initial: Vec<Section>) -> Self {
        Self::with_max_levels(initial, 0)
    }

    /// Start a history that keeps at most `max_levels` snapshots
    pub fn with_max_levels(initial: Vec<Section>, max_levels: usize) -> Self {
        Self {
            entries: vec![Snapshot::new(0, initial)],
            cursor: 0,
            saved_revision: Some(0),
            next_revision: 1,
            max_levels,
        }
    }

    /// Record a new current state, discarding anything redoable
    pub fn record(&mut self, sections: Vec<Section>) -> &Snapshot {
        let revision = self.take_revision();

        self.entries.truncate(self.cursor + 1);
        self.entries.push(Snapshot::new(revision, sections));

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.entries.len() > self.max_levels {
            let excess = self.entries.len() - self.max_levels;
            self.entries.drain(..excess);
        }

        self.cursor = self.entries.len() - 1;
        &self.entries[self.cursor]
    }

    /// Step back one snapshot
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Step forward one snapshot
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> &Snapshot {
        &self.entries[self.cursor]
    }

    /// Revision of the current snapshot
    pub fn revision(&self) -> u64 {
        self.current().revision
    }

    /// Mark `revision` as the state now held by durable storage
    pub fn mark_saved(&mut self, revision: u64) {
        self.saved_revision = Some(revision);
    }

    /// Mark `snapshot` as durable if it is still one of this history's
    /// entries; otherwise storage holds a state history no longer has.
    pub fn mark_saved_snapshot(&mut self, snapshot: &Snapshot) -> bool {
        let known = self.entries.iter().any(|entry| entry.same_as(snapshot));
        self.saved_revision = if known { Some(snapshot.revision) } else { None };
        known
    }

    /// Forget the saved baseline (storage no longer matches any snapshot)
    pub fn mark_unsaved(&mut self) {
        self.saved_revision = None;
    }

    pub fn saved_revision(&self) -> Option<u64> {
        self.saved_revision
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.saved_revision != Some(self.revision())
    }

    /// Number of undo steps available
    pub fn undo_levels(&self) -> usize {
        self.cursor
    }

    /// Number of redo steps available
    pub fn redo_levels(&self) -> usize {
        self.entries.len() - self.cursor - 1
    }

    /// Total snapshots held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take_revision(&mut self) -> u64 {
        let revision = self.next_revision;
        self.next_revision += 1;
        revision
    }
}
