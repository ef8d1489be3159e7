//! Error types for the reminder scheduler

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Appointment source error: {0}")]
    Source(String),

    #[error("Notification failed: {0}")]
    Notify(String),
}
