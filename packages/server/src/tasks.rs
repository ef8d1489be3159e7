//! Background tasks started alongside the HTTP server

use crate::config::Config;
use anyhow::Context;
use homepage_reminders::{
    JsonFileAppointmentSource, JsonFileLedger, LogNotifier, ReminderContext, ReminderScheduler,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Running reminder scheduler and the switch that stops it
pub struct ReminderTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ReminderTask {
    /// Signal the scheduler and wait for its loop to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Reminder task ended abnormally");
        }
    }
}

/// Open the reminder ledger and spawn the scheduler loop
pub async fn start_reminders(config: &Config, config_path: &Path) -> anyhow::Result<ReminderTask> {
    let reminders = &config.reminders;
    let appointments_path = config.resolve(config_path, &reminders.appointments_path);
    let ledger_path = config.resolve(config_path, &reminders.ledger_path);

    let ledger = JsonFileLedger::open(&ledger_path)
        .await
        .with_context(|| format!("Failed to open reminder ledger {}", ledger_path.display()))?;

    let context = ReminderContext::new(
        Arc::new(JsonFileAppointmentSource::new(&appointments_path)),
        Arc::new(LogNotifier),
        Arc::new(ledger),
    );
    let scheduler = ReminderScheduler::new(context, reminders.scheduler.clone());

    tracing::info!(
        appointments = %appointments_path.display(),
        ledger = %ledger_path.display(),
        "Starting reminder scheduler"
    );

    let (shutdown, rx) = watch::channel(false);
    let handle = tokio::spawn(async move { scheduler.run(rx).await });

    Ok(ReminderTask { shutdown, handle })
}
