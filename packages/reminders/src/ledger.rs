//! # Notified Ledger
//!
//! Durable record of reminders already delivered, keyed by appointment and
//! reminder kind. The scheduler consults it before every send so a restart
//! neither repeats nor loses reminders.

use crate::appointment::AppointmentId;
use crate::errors::ReminderError;
use crate::rule::ReminderKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    pub appointment_id: AppointmentId,
    pub kind: ReminderKind,
}

impl LedgerKey {
    pub fn new(appointment_id: impl Into<AppointmentId>, kind: ReminderKind) -> Self {
        Self {
            appointment_id: appointment_id.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(flatten)]
    pub key: LedgerKey,

    /// Start of the appointment, used for pruning
    pub appointment_start: DateTime<Utc>,

    pub notified_at: DateTime<Utc>,
}

#[async_trait]
pub trait NotifiedLedger: Send + Sync {
    async fn contains(&self, key: &LedgerKey) -> Result<bool, ReminderError>;

    async fn record(&self, entry: LedgerEntry) -> Result<(), ReminderError>;

    /// Drop entries for appointments that started before `cutoff`
    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, ReminderError>;
}

fn prune_entries(entries: &mut HashMap<LedgerKey, LedgerEntry>, cutoff: DateTime<Utc>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.appointment_start >= cutoff);
    before - entries.len()
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<HashMap<LedgerKey, LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl NotifiedLedger for MemoryLedger {
    async fn contains(&self, key: &LedgerKey) -> Result<bool, ReminderError> {
        Ok(self.entries.lock().await.contains_key(key))
    }

    async fn record(&self, entry: LedgerEntry) -> Result<(), ReminderError> {
        self.entries.lock().await.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, ReminderError> {
        Ok(prune_entries(&mut *self.entries.lock().await, cutoff))
    }
}

/// Ledger persisted as a JSON array, rewritten atomically on every change
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    entries: Mutex<HashMap<LedgerKey, LedgerEntry>>,
}

impl JsonFileLedger {
    /// Open the ledger at `path`, creating an empty one if it does not exist
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ReminderError> {
        let path = path.into();
        let entries: Vec<LedgerEntry> = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), entries = entries.len(), "Opened reminder ledger");

        Ok(Self {
            path,
            entries: Mutex::new(entries.into_iter().map(|e| (e.key.clone(), e)).collect()),
        })
    }

    async fn flush(&self, entries: &HashMap<LedgerKey, LedgerEntry>) -> Result<(), ReminderError> {
        let mut list: Vec<&LedgerEntry> = entries.values().collect();
        list.sort_by(|a, b| {
            (a.appointment_start, &a.key.appointment_id, a.key.kind)
                .cmp(&(b.appointment_start, &b.key.appointment_id, b.key.kind))
        });
        let json = serde_json::to_string_pretty(&list)?;

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
impl NotifiedLedger for JsonFileLedger {
    async fn contains(&self, key: &LedgerKey) -> Result<bool, ReminderError> {
        Ok(self.entries.lock().await.contains_key(key))
    }

    async fn record(&self, entry: LedgerEntry) -> Result<(), ReminderError> {
        let mut entries = self.entries.lock().await;
        let key = entry.key.clone();
        let previous = entries.insert(key.clone(), entry);

        if let Err(e) = self.flush(&entries).await {
            // Keep memory consistent with disk
            match previous {
                Some(previous) => entries.insert(key, previous),
                None => entries.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, ReminderError> {
        let mut entries = self.entries.lock().await;
        let pruned = prune_entries(&mut entries, cutoff);
        if pruned > 0 {
            self.flush(&entries).await?;
        }
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(id: &str, kind: ReminderKind, start: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            key: LedgerKey::new(id, kind),
            appointment_start: start,
            notified_at: start - Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_memory_ledger_keys_by_kind() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let ledger = MemoryLedger::new();
        ledger.record(entry("a-1", ReminderKind::DayBefore, start)).await.unwrap();

        assert!(ledger.contains(&LedgerKey::new("a-1", ReminderKind::DayBefore)).await.unwrap());
        assert!(!ledger.contains(&LedgerKey::new("a-1", ReminderKind::HourBefore)).await.unwrap());
    }

    #[tokio::test]
    async fn test_json_ledger_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

        let ledger = JsonFileLedger::open(&path).await.unwrap();
        ledger.record(entry("a-1", ReminderKind::HourBefore, start)).await.unwrap();
        drop(ledger);

        let reopened = JsonFileLedger::open(&path).await.unwrap();
        assert!(reopened
            .contains(&LedgerKey::new("a-1", ReminderKind::HourBefore))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_prune_drops_old_appointments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

        let ledger = JsonFileLedger::open(&path).await.unwrap();
        ledger.record(entry("old", ReminderKind::DayBefore, start - Duration::days(10))).await.unwrap();
        ledger.record(entry("new", ReminderKind::DayBefore, start)).await.unwrap();

        let pruned = ledger.prune(start - Duration::days(7)).await.unwrap();
        assert_eq!(pruned, 1);

        let reopened = JsonFileLedger::open(&path).await.unwrap();
        assert!(!reopened.contains(&LedgerKey::new("old", ReminderKind::DayBefore)).await.unwrap());
        assert!(reopened.contains(&LedgerKey::new("new", ReminderKind::DayBefore)).await.unwrap());
    }

    #[test]
    fn test_entry_format_is_flat() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let json = serde_json::to_value(entry("a-1", ReminderKind::DayBefore, start)).unwrap();

        assert_eq!(json["appointment_id"], "a-1");
        assert_eq!(json["kind"], "day_before");
    }
}
