//! Delivery of reminders.
//!
//! Push delivery lives outside this crate; anything that can take a
//! [`Reminder`] implements [`Notifier`].

use crate::errors::ReminderError;
use crate::rule::Reminder;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, reminder: &Reminder) -> Result<(), ReminderError>;
}

/// Writes each reminder as a structured log line
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, reminder: &Reminder) -> Result<(), ReminderError> {
        tracing::info!(
            appointment_id = %reminder.appointment.id,
            patient_id = %reminder.appointment.patient_id,
            kind = reminder.kind.as_str(),
            message = %reminder.message(Utc::now()),
            "Appointment reminder"
        );
        Ok(())
    }
}

/// Keeps delivered reminders in memory; can be told to fail
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Reminder>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<Reminder> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, reminder: &Reminder) -> Result<(), ReminderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ReminderError::Notify("delivery disabled".to_string()));
        }
        self.sent.lock().await.push(reminder.clone());
        Ok(())
    }
}
