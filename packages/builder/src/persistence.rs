//! # Persistence Gate
//!
//! The explicit boundary between in-memory editing and durable storage.
//!
//! ## Guarantees
//!
//! - At most one save is in flight; a second request is rejected before it
//!   reaches the store
//! - Nothing is written unless the whole collection validates
//! - Sections removed in the builder are deleted from the store, not just
//!   left behind by the upsert
//! - The preview frame is told to reload only after a save succeeds
//!
//! The gate never touches history. Callers mark the saved revision on the
//! session once `save` returns `Ok`.

use crate::errors::{PersistError, StoreError};
use crate::history::Snapshot;
use crate::preview::PreviewSignal;
use crate::section::{find_duplicate_id, is_contiguous, Section, SectionId};
use crate::store::SectionStore;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Serializes saves of the section collection to a `SectionStore`
pub struct PersistenceGate {
    store: Arc<dyn SectionStore>,

    /// Set while a save is running
    saving: AtomicBool,

    /// Ids known to exist in the store
    durable_ids: Mutex<HashSet<SectionId>>,

    preview: PreviewSignal,
}

/// Clears the in-flight flag when a save finishes, however it finishes
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PersistenceGate {
    pub fn new(store: Arc<dyn SectionStore>, preview: PreviewSignal) -> Self {
        Self {
            store,
            saving: AtomicBool::new(false),
            durable_ids: Mutex::new(HashSet::new()),
            preview,
        }
    }

    pub fn preview(&self) -> &PreviewSignal {
        &self.preview
    }

    /// True while a save is running
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Fetch every stored section and remember which ids are durable
    pub async fn load(&self) -> Result<Vec<Section>, StoreError> {
        let sections = self.store.list_sections().await?;
        self.set_durable(sections.iter().map(|s| s.id.clone()).collect());
        tracing::info!(count = sections.len(), "Loaded homepage sections");
        Ok(sections)
    }

    /// Write `snapshot` to the store and return its revision
    pub async fn save(&self, snapshot: &Snapshot) -> Result<u64, PersistError> {
        let _in_flight = self.claim()?;

        validate_for_save(snapshot.sections())?;

        let current: HashSet<SectionId> = snapshot.iter().map(|s| s.id.clone()).collect();
        let removed: Vec<SectionId> = {
            let durable = self.durable_ids.lock().unwrap_or_else(PoisonError::into_inner);
            durable.difference(&current).cloned().collect()
        };

        tracing::info!(
            revision = snapshot.revision(),
            upserts = snapshot.len(),
            deletes = removed.len(),
            "Saving homepage sections"
        );

        if let Err(e) = self.store.upsert_sections(snapshot.sections()).await {
            tracing::error!(error = %e, revision = snapshot.revision(), "Section upsert failed");
            return Err(e.into());
        }

        // Upserted ids are durable even if the delete below fails
        self.extend_durable(current.iter().cloned());

        if !removed.is_empty() {
            if let Err(e) = self.store.delete_sections(&removed).await {
                tracing::error!(error = %e, revision = snapshot.revision(), "Section delete failed");
                return Err(e.into());
            }
        }

        self.set_durable(current);
        self.preview.saved(snapshot.revision());

        Ok(snapshot.revision())
    }

    fn claim(&self) -> Result<InFlight<'_>, PersistError> {
        match self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(InFlight(&self.saving)),
            Err(_) => {
                tracing::warn!("Save requested while another save is in flight");
                Err(PersistError::SaveInProgress)
            }
        }
    }

    fn set_durable(&self, ids: HashSet<SectionId>) {
        *self.durable_ids.lock().unwrap_or_else(PoisonError::into_inner) = ids;
    }

    fn extend_durable(&self, ids: impl Iterator<Item = SectionId>) {
        self.durable_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(ids);
    }
}

impl std::fmt::Debug for PersistenceGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGate")
            .field("saving", &self.is_saving())
            .finish_non_exhaustive()
    }
}

/// Check collection-level invariants and every layout
pub fn validate_for_save(sections: &[Section]) -> Result<(), PersistError> {
    if let Some(id) = find_duplicate_id(sections) {
        return Err(PersistError::Invalid(format!("duplicate section id {}", id)));
    }

    if !is_contiguous(sections) {
        return Err(PersistError::Invalid(
            "display order is not contiguous".to_string(),
        ));
    }

    for section in sections {
        section
            .layout
            .validate()
            .map_err(|e| PersistError::Invalid(format!("section {}: {}", section.id, e)))?;
    }

    Ok(())
}
