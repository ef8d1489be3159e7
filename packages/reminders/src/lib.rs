//! # Homepage Reminders
//!
//! Appointment reminders for the marketplace.
//!
//! Reminders are sent by a scheduled task rather than an ad-hoc timer, and
//! every delivery is written to a durable ledger keyed by appointment and
//! reminder kind, so restarting the process never re-sends or skips one.
//!
//! ```rust,ignore
//! let context = ReminderContext::new(appointments, Arc::new(LogNotifier), ledger);
//! let scheduler = ReminderScheduler::new(context, SchedulerConfig::default());
//! scheduler.run(shutdown_rx).await;
//! ```

mod appointment;
mod errors;
mod ledger;
mod notifier;
mod rule;
mod scheduler;

pub use appointment::{
    Appointment, AppointmentId, AppointmentSource, AppointmentStatus, JsonFileAppointmentSource,
    MemoryAppointmentSource,
};
pub use errors::ReminderError;
pub use ledger::{JsonFileLedger, LedgerEntry, LedgerKey, MemoryLedger, NotifiedLedger};
pub use notifier::{LogNotifier, Notifier, RecordingNotifier};
pub use rule::{Reminder, ReminderKind, ReminderRule};
pub use scheduler::{ReminderContext, ReminderScheduler, SchedulerConfig, TickReport};
