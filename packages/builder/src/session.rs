//! # Builder Session
//!
//! Owns the editing state of one builder view: the section history, the
//! selection, and the rules for turning user actions into recorded edits.
//!
//! Every mutating method goes through [`BuilderSession::apply`]:
//!
//! 1. Fresh ids are generated up front so the mutation itself stays pure
//! 2. The mutation computes a new collection from the current snapshot
//! 3. On success the result is recorded as a new snapshot
//! 4. Stale ids and indices are dropped without recording anything
//!
//! Saving is split in two so the session never has to be borrowed across the
//! storage round trip: [`BuilderSession::prepare_save`] hands out the current
//! snapshot, and [`BuilderSession::complete_save`] marks it saved once the
//! gate reports success.

use crate::errors::BuilderError;
use crate::history::{History, Snapshot};
use crate::mutations::{LockPolicy, Mutation};
use crate::persistence::PersistenceGate;
use crate::section::{find_duplicate_id, position_of, renumber, Section, SectionId, SectionPatch};
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// Section key given to sections created with [`BuilderSession::add`]
pub const DEFAULT_SECTION_KEY: &str = "custom";

/// Title given to sections created with [`BuilderSession::add`]
pub const DEFAULT_SECTION_TITLE: &str = "New Section";

/// Source of ids for added and duplicated sections
pub trait IdGenerator: Send + Sync + Debug {
    fn next_id(&self) -> SectionId;
}

/// Random v4 UUIDs
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> SectionId {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `prefix-1`, `prefix-2`, ... (predictable ids for tests and fixtures)
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> SectionId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

/// Tunables for a builder session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderOptions {
    pub lock_policy: LockPolicy,

    /// Maximum snapshots kept in history (0 = unlimited)
    pub history_limit: usize,
}

/// Outcome of a mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// A new snapshot was recorded
    Recorded {
        revision: u64,
        /// Id of the section created by add/duplicate
        created: Option<SectionId>,
    },

    /// The call referenced a section or index that no longer exists
    Ignored,
}

impl Applied {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Applied::Recorded { .. })
    }

    pub fn created(&self) -> Option<&str> {
        match self {
            Applied::Recorded { created, .. } => created.as_deref(),
            Applied::Ignored => None,
        }
    }
}

/// Snapshot handed out for an in-flight save
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub snapshot: Snapshot,
}

/// Editing state for one builder view
#[derive(Debug)]
pub struct BuilderSession {
    history: History,
    selection: Selection,
    options: BuilderOptions,
    ids: Box<dyn IdGenerator>,
}

impl BuilderSession {
    /// Create a session over `sections`, as loaded from storage.
    ///
    /// Sections are sorted by display order and renumbered. If that changes
    /// any order value the initial state is not considered saved.
    pub fn new(sections: Vec<Section>, options: BuilderOptions) -> Result<Self, BuilderError> {
        let (sections, repaired) = normalize(sections)?;

        let mut history = History::with_max_levels(sections, options.history_limit);
        if repaired {
            tracing::warn!("Stored display order had gaps or duplicates; renumbered");
            history.mark_unsaved();
        }

        Ok(Self {
            history,
            selection: Selection::new(),
            options,
            ids: Box::new(UuidIds),
        })
    }

    /// Replace the id source
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Apply a mutation and record the result
    pub fn apply(&mut self, mutation: Mutation) -> Result<Applied, BuilderError> {
        let created = match &mutation {
            Mutation::Duplicate { new_id, .. } => Some(new_id.clone()),
            Mutation::Add { id, .. } => Some(id.clone()),
            _ => None,
        };

        match mutation.apply(self.history.current(), &self.options.lock_policy) {
            Ok(next) => {
                let revision = self.history.record(next).revision();
                self.selection.retain_existing(self.history.current());
                tracing::debug!(mutation = mutation.name(), revision, "Recorded edit");
                Ok(Applied::Recorded { revision, created })
            }
            Err(e) if e.is_stale_reference() => {
                tracing::debug!(mutation = mutation.name(), error = %e, "Ignoring stale edit");
                Ok(Applied::Ignored)
            }
            Err(e) => {
                tracing::info!(mutation = mutation.name(), error = %e, "Rejected edit");
                Err(e.into())
            }
        }
    }

    pub fn reorder(&mut self, source_index: usize, dest_index: usize) -> Result<Applied, BuilderError> {
        self.apply(Mutation::Reorder {
            source_index,
            dest_index,
        })
    }

    /// Reorder from a drag gesture that dropped `source_id` onto `dest_id`
    pub fn reorder_by_id(&mut self, source_id: &str, dest_id: &str) -> Result<Applied, BuilderError> {
        let sections = self.history.current();
        match (position_of(sections, source_id), position_of(sections, dest_id)) {
            (Some(source_index), Some(dest_index)) => self.reorder(source_index, dest_index),
            _ => {
                tracing::debug!(source_id, dest_id, "Ignoring drag between unknown sections");
                Ok(Applied::Ignored)
            }
        }
    }

    pub fn update_section(&mut self, id: &str, patch: SectionPatch) -> Result<Applied, BuilderError> {
        self.apply(Mutation::Update {
            id: id.to_string(),
            patch,
        })
    }

    pub fn toggle_visibility(&mut self, id: &str) -> Result<Applied, BuilderError> {
        self.apply(Mutation::ToggleVisibility { id: id.to_string() })
    }

    pub fn toggle_lock(&mut self, id: &str) -> Result<Applied, BuilderError> {
        self.apply(Mutation::ToggleLock { id: id.to_string() })
    }

    pub fn duplicate(&mut self, id: &str) -> Result<Applied, BuilderError> {
        let new_id = self.ids.next_id();
        self.apply(Mutation::Duplicate {
            id: id.to_string(),
            new_id,
        })
    }

    pub fn delete(&mut self, id: &str) -> Result<Applied, BuilderError> {
        self.apply(Mutation::Delete { id: id.to_string() })
    }

    /// Append a section with the default key, title and layout
    pub fn add(&mut self) -> Result<Applied, BuilderError> {
        self.add_section(DEFAULT_SECTION_KEY, DEFAULT_SECTION_TITLE)
    }

    pub fn add_section(
        &mut self,
        section_key: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Applied, BuilderError> {
        let id = self.ids.next_id();
        self.apply(Mutation::Add {
            id,
            section_key: section_key.into(),
            title: title.into(),
        })
    }

    /// Step back one edit; returns false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo().is_some();
        if undone {
            self.selection.retain_existing(self.history.current());
        }
        undone
    }

    /// Step forward one edit; returns false when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo().is_some();
        if redone {
            self.selection.retain_existing(self.history.current());
        }
        redone
    }

    pub fn select(&mut self, id: &str, multi_select: bool) {
        if position_of(self.history.current(), id).is_some() {
            self.selection.select(id, multi_select);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Snapshot to hand to the persistence gate
    pub fn prepare_save(&self) -> SaveTicket {
        SaveTicket {
            snapshot: self.history.current().clone(),
        }
    }

    /// Record that the ticket's snapshot is now durable.
    ///
    /// Edits made while the save was in flight stay unsaved.
    pub fn complete_save(&mut self, ticket: &SaveTicket) {
        if !self.history.mark_saved_snapshot(&ticket.snapshot) {
            tracing::warn!(
                revision = ticket.snapshot.revision(),
                "Saved snapshot is no longer in history"
            );
        }
        tracing::info!(
            revision = ticket.snapshot.revision(),
            unsaved = self.history.has_unsaved_changes(),
            "Save completed"
        );
    }

    /// Save the current state through `gate`.
    ///
    /// On failure history and sections are untouched and the session keeps
    /// reporting unsaved changes.
    pub async fn save(&mut self, gate: &PersistenceGate) -> Result<u64, BuilderError> {
        let ticket = self.prepare_save();
        let revision = gate.save(&ticket.snapshot).await?;
        self.complete_save(&ticket);
        Ok(revision)
    }

    pub fn sections(&self) -> &[Section] {
        self.history.current()
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.history.current()
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections().iter().find(|s| s.id == id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.has_unsaved_changes()
    }

    pub fn revision(&self) -> u64 {
        self.history.revision()
    }
}

/// Sort by display order and renumber; reports whether anything moved
fn normalize(mut sections: Vec<Section>) -> Result<(Vec<Section>, bool), BuilderError> {
    if let Some(id) = find_duplicate_id(&sections) {
        return Err(BuilderError::Inconsistent(format!("duplicate section id {}", id)));
    }

    sections.sort_by_key(|s| s.display_order);
    let before: Vec<u32> = sections.iter().map(|s| s.display_order).collect();
    renumber(&mut sections);
    let repaired = sections
        .iter()
        .zip(before)
        .any(|(s, order)| s.display_order != order);

    Ok((sections, repaired))
}

/// Builder state after the initial fetch
#[derive(Debug)]
pub enum BuilderView {
    Ready(BuilderSession),

    /// Loading failed; the view shows an error instead of an editor
    Unavailable { reason: String },
}

impl BuilderView {
    /// Fetch sections through `gate` and open a session over them
    pub async fn load(gate: &PersistenceGate, options: BuilderOptions) -> Self {
        let loaded = match gate.load().await {
            Ok(sections) => BuilderSession::new(sections, options),
            Err(e) => Err(e.into()),
        };

        match loaded {
            Ok(session) => BuilderView::Ready(session),
            Err(e) => {
                tracing::error!(error = %e, "Homepage builder failed to load");
                BuilderView::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn session(&self) -> Option<&BuilderSession> {
        match self {
            BuilderView::Ready(session) => Some(session),
            BuilderView::Unavailable { .. } => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut BuilderSession> {
        match self {
            BuilderView::Ready(session) => Some(session),
            BuilderView::Unavailable { .. } => None,
        }
    }
}
