//! Selected sections in the builder view.
//!
//! Selection is view state: it is never stored in a snapshot and undo/redo
//! does not restore it.

use crate::section::{Section, SectionId};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<SectionId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single select replaces the selection; multi select toggles `id`
    pub fn select(&mut self, id: impl Into<SectionId>, multi_select: bool) {
        let id = id.into();
        if multi_select {
            if !self.ids.remove(&id) {
                self.ids.insert(id);
            }
        } else {
            self.ids.clear();
            self.ids.insert(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer name a section
    pub fn retain_existing(&mut self, sections: &[Section]) {
        self.ids.retain(|id| sections.iter().any(|s| &s.id == id));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &SectionId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
