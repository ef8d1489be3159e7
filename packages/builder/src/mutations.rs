//! # Section Mutations
//!
//! Semantic operations on the homepage section collection.
//!
//! ## Design Principles
//!
//! 1. **Pure**: `apply` maps (collection, parameters) to a new collection and
//!    never touches the input or any storage
//! 2. **Deterministic**: ids for new sections are chosen by the caller and
//!    carried inside the mutation, so replaying a mutation gives the same result
//! 3. **Dense ordering**: every result has display orders `0..N-1`
//!
//! ## Mutation Semantics
//!
//! ### Reorder
//! - Remove at `source_index`, reinsert at `dest_index`
//! - Locked sections move freely unless the lock policy guards reordering
//!
//! ### Duplicate
//! - Clone with a new id, inserted directly after the source
//! - Every field except id and display order is copied
//!
//! ### Delete
//! - Removes the section; later sections shift down by one

use crate::layout::LayoutError;
use crate::section::{position_of, renumber, Section, SectionId, SectionPatch};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic mutations on the section collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    /// Move the section at `source_index` to `dest_index`
    Reorder {
        source_index: usize,
        dest_index: usize,
    },

    /// Merge a partial update into a section
    Update {
        id: SectionId,
        patch: SectionPatch,
    },

    ToggleVisibility {
        id: SectionId,
    },

    ToggleLock {
        id: SectionId,
    },

    /// Clone a section under `new_id`, directly after the source
    Duplicate {
        id: SectionId,
        new_id: SectionId,
    },

    Delete {
        id: SectionId,
    },

    /// Append a section with the default layout
    Add {
        id: SectionId,
        section_key: String,
        title: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Section not found: {0}")]
    SectionNotFound(SectionId),

    #[error("Index {index} out of range for {len} sections")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Section is locked: {0}")]
    Locked(SectionId),

    #[error("Section id already exists: {0}")]
    DuplicateId(SectionId),

    #[error("Invalid layout: {0}")]
    InvalidLayout(#[from] LayoutError),
}

impl MutationError {
    /// Stale references are dropped silently rather than reported
    pub fn is_stale_reference(&self) -> bool {
        matches!(
            self,
            MutationError::SectionNotFound(_) | MutationError::IndexOutOfRange { .. }
        )
    }
}

/// Which operations a locked section refuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LockPolicy {
    pub guard_delete: bool,
    pub guard_duplicate: bool,
    pub guard_reorder: bool,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            guard_delete: true,
            guard_duplicate: true,
            guard_reorder: false,
        }
    }
}

impl Mutation {
    /// Compute the collection that results from applying this mutation
    pub fn apply(&self, sections: &[Section], policy: &LockPolicy) -> Result<Vec<Section>, MutationError> {
        self.validate(sections, policy)?;

        let mut next = sections.to_vec();

        match self {
            Mutation::Reorder { source_index, dest_index } => {
                let moved = next.remove(*source_index);
                next.insert(*dest_index, moved);
            }

            Mutation::Update { id, patch } => {
                let index = Self::find(&next, id)?;
                patch.merge_into(&mut next[index]);
            }

            Mutation::ToggleVisibility { id } => {
                let index = Self::find(&next, id)?;
                next[index].is_visible = !next[index].is_visible;
            }

            Mutation::ToggleLock { id } => {
                let index = Self::find(&next, id)?;
                next[index].is_locked = !next[index].is_locked;
            }

            Mutation::Duplicate { id, new_id } => {
                let index = Self::find(&next, id)?;
                let mut copy = next[index].clone();
                copy.id = new_id.clone();
                next.insert(index + 1, copy);
            }

            Mutation::Delete { id } => {
                let index = Self::find(&next, id)?;
                next.remove(index);
            }

            Mutation::Add { id, section_key, title } => {
                next.push(Section::new(id.clone(), section_key.clone(), title.clone()));
            }
        }

        renumber(&mut next);
        Ok(next)
    }

    /// Validate without applying
    pub fn validate(&self, sections: &[Section], policy: &LockPolicy) -> Result<(), MutationError> {
        match self {
            Mutation::Reorder { source_index, dest_index } => {
                let len = sections.len();
                for index in [*source_index, *dest_index] {
                    if index >= len {
                        return Err(MutationError::IndexOutOfRange { index, len });
                    }
                }

                let source = &sections[*source_index];
                if policy.guard_reorder && source.is_locked {
                    return Err(MutationError::Locked(source.id.clone()));
                }

                Ok(())
            }

            Mutation::Update { id, patch } => {
                let index = Self::find(sections, id)?;
                if let Some(layout) = &patch.layout {
                    layout.merged(&sections[index].layout).validate()?;
                }
                Ok(())
            }

            Mutation::ToggleVisibility { id } | Mutation::ToggleLock { id } => {
                Self::find(sections, id)?;
                Ok(())
            }

            Mutation::Duplicate { id, new_id } => {
                let index = Self::find(sections, id)?;
                if policy.guard_duplicate && sections[index].is_locked {
                    return Err(MutationError::Locked(id.clone()));
                }
                if position_of(sections, new_id).is_some() {
                    return Err(MutationError::DuplicateId(new_id.clone()));
                }
                Ok(())
            }

            Mutation::Delete { id } => {
                let index = Self::find(sections, id)?;
                if policy.guard_delete && sections[index].is_locked {
                    return Err(MutationError::Locked(id.clone()));
                }
                Ok(())
            }

            Mutation::Add { id, .. } => {
                if position_of(sections, id).is_some() {
                    return Err(MutationError::DuplicateId(id.clone()));
                }
                Ok(())
            }
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Reorder { .. } => "reorder",
            Mutation::Update { .. } => "update",
            Mutation::ToggleVisibility { .. } => "toggle_visibility",
            Mutation::ToggleLock { .. } => "toggle_lock",
            Mutation::Duplicate { .. } => "duplicate",
            Mutation::Delete { .. } => "delete",
            Mutation::Add { .. } => "add",
        }
    }

    fn find(sections: &[Section], id: &str) -> Result<usize, MutationError> {
        position_of(sections, id).ok_or_else(|| MutationError::SectionNotFound(id.to_string()))
    }
}
