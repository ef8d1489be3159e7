//! Appointments as the reminder scheduler sees them, and where they come from.

use crate::errors::ReminderError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

pub type AppointmentId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Still going to happen
    pub fn is_active(self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: String,

    /// Human readable label, e.g. the doctor or test name
    pub title: String,

    pub starts_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

/// Read access to booked appointments
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    /// Appointments starting in `[from, until]`
    async fn upcoming(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, ReminderError>;
}

fn in_window(appointments: impl IntoIterator<Item = Appointment>, from: DateTime<Utc>, until: DateTime<Utc>) -> Vec<Appointment> {
    appointments
        .into_iter()
        .filter(|a| a.starts_at >= from && a.starts_at <= until)
        .collect()
}

#[derive(Debug, Default)]
pub struct MemoryAppointmentSource {
    appointments: Mutex<Vec<Appointment>>,
}

impl MemoryAppointmentSource {
    pub fn new(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: Mutex::new(appointments),
        }
    }

    pub async fn push(&self, appointment: Appointment) {
        self.appointments.lock().await.push(appointment);
    }

    pub async fn set_status(&self, id: &str, status: AppointmentStatus) {
        for appointment in self.appointments.lock().await.iter_mut() {
            if appointment.id == id {
                appointment.status = status;
            }
        }
    }
}

#[async_trait]
impl AppointmentSource for MemoryAppointmentSource {
    async fn upcoming(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, ReminderError> {
        let appointments = self.appointments.lock().await.clone();
        Ok(in_window(appointments, from, until))
    }
}

/// Appointments exported to a JSON array file, re-read on every query
#[derive(Debug, Clone)]
pub struct JsonFileAppointmentSource {
    path: PathBuf,
}

impl JsonFileAppointmentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AppointmentSource for JsonFileAppointmentSource {
    async fn upcoming(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, ReminderError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let appointments: Vec<Appointment> = serde_json::from_str(&content)?;
        Ok(in_window(appointments, from, until))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn appointment(id: &str, starts_at: DateTime<Utc>) -> Appointment {
        Appointment {
            id: id.to_string(),
            patient_id: "p-1".to_string(),
            title: "Blood test".to_string(),
            starts_at,
            status: AppointmentStatus::Scheduled,
        }
    }

    #[test]
    fn test_active_statuses() {
        assert!(AppointmentStatus::Scheduled.is_active());
        assert!(AppointmentStatus::Confirmed.is_active());
        assert!(!AppointmentStatus::Cancelled.is_active());
        assert!(!AppointmentStatus::Completed.is_active());
    }

    #[tokio::test]
    async fn test_memory_source_filters_window() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let source = MemoryAppointmentSource::new(vec![
            appointment("past", now - Duration::hours(1)),
            appointment("soon", now + Duration::hours(2)),
            appointment("later", now + Duration::days(3)),
        ]);

        let found = source.upcoming(now, now + Duration::days(1)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "soon");
    }

    #[tokio::test]
    async fn test_json_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.json");
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();

        let json = serde_json::to_string(&vec![appointment("a-1", now + Duration::minutes(30))]).unwrap();
        std::fs::write(&path, json).unwrap();

        let source = JsonFileAppointmentSource::new(&path);
        let found = source.upcoming(now, now + Duration::hours(1)).await.unwrap();
        assert_eq!(found[0].id, "a-1");

        let missing = JsonFileAppointmentSource::new(dir.path().join("none.json"));
        assert!(missing.upcoming(now, now + Duration::hours(1)).await.unwrap().is_empty());
    }
}
