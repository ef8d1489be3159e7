//! # Section Stores
//!
//! Durable storage for homepage sections.
//!
//! The builder only needs three calls from a store: list everything in
//! display order, batch upsert by id, and delete by id. Two backends ship with
//! the crate:
//!
//! - **Memory**: for tests and previews, with failure injection
//! - **JSON file**: a single JSON array, rewritten atomically

use crate::errors::StoreError;
use crate::section::{Section, SectionId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// External storage for sections
#[async_trait]
pub trait SectionStore: Send + Sync {
    /// All sections, ordered by display order
    async fn list_sections(&self) -> Result<Vec<Section>, StoreError>;

    /// Insert or replace each section by id
    async fn upsert_sections(&self, sections: &[Section]) -> Result<(), StoreError>;

    /// Remove sections by id; unknown ids are ignored
    async fn delete_sections(&self, ids: &[SectionId]) -> Result<(), StoreError>;
}

fn sorted(mut sections: Vec<Section>) -> Vec<Section> {
    sections.sort_by_key(|s| s.display_order);
    sections
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemorySectionStore {
    sections: Mutex<HashMap<SectionId, Section>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    upsert_calls: AtomicUsize,
    latency: Option<Duration>,
}

impl MemorySectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sections(sections: Vec<Section>) -> Self {
        Self {
            sections: Mutex::new(sections.into_iter().map(|s| (s.id.clone(), s)).collect()),
            ..Self::default()
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent reads fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of upsert calls that reached the store
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<Section> {
        sorted(self.sections.lock().await.values().cloned().collect())
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SectionStore for MemorySectionStore {
    async fn list_sections(&self) -> Result<Vec<Section>, StoreError> {
        self.delay().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(self.snapshot().await)
    }

    async fn upsert_sections(&self, sections: &[Section]) -> Result<(), StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.check_writable()?;

        let mut stored = self.sections.lock().await;
        for section in sections {
            stored.insert(section.id.clone(), section.clone());
        }
        Ok(())
    }

    async fn delete_sections(&self, ids: &[SectionId]) -> Result<(), StoreError> {
        self.delay().await;
        self.check_writable()?;

        let mut stored = self.sections.lock().await;
        for id in ids {
            stored.remove(id);
        }
        Ok(())
    }
}

/// Sections kept as a JSON array on disk
#[derive(Debug)]
pub struct JsonFileSectionStore {
    path: PathBuf,

    /// Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonFileSectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<Section>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, sections: &[Section]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(sections)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SectionStore for JsonFileSectionStore {
    async fn list_sections(&self) -> Result<Vec<Section>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(sorted(self.read_all().await?))
    }

    async fn upsert_sections(&self, sections: &[Section]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut stored = self.read_all().await?;

        for section in sections {
            match stored.iter_mut().find(|s| s.id == section.id) {
                Some(existing) => *existing = section.clone(),
                None => stored.push(section.clone()),
            }
        }

        self.write_all(&sorted(stored)).await
    }

    async fn delete_sections(&self, ids: &[SectionId]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut stored = self.read_all().await?;
        let before = stored.len();
        stored.retain(|s| !ids.contains(&s.id));

        if stored.len() != before {
            self.write_all(&stored).await?;
        }
        Ok(())
    }
}
