//! # Reminder Scheduler
//!
//! Periodically looks for appointments that are close enough to remind about
//! and hands each reminder to the notifier exactly once.
//!
//! ## Tick
//!
//! 1. Fetch active appointments starting within the longest rule lead
//! 2. For each one pick the tightest rule whose window contains `now`
//!    (an appointment an hour away gets the hour reminder, not the day one)
//! 3. Skip it if the ledger already has `(appointment, kind)`
//! 4. Notify, then record in the ledger; a failed send is retried next tick
//! 5. Prune ledger entries for appointments older than the retention period

use crate::appointment::AppointmentSource;
use crate::errors::ReminderError;
use crate::ledger::{LedgerEntry, LedgerKey, NotifiedLedger};
use crate::notifier::Notifier;
use crate::rule::{Reminder, ReminderRule};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Everything the scheduler talks to, created once at startup
#[derive(Clone)]
pub struct ReminderContext {
    pub appointments: Arc<dyn AppointmentSource>,
    pub notifier: Arc<dyn Notifier>,
    pub ledger: Arc<dyn NotifiedLedger>,
}

impl ReminderContext {
    pub fn new(
        appointments: Arc<dyn AppointmentSource>,
        notifier: Arc<dyn Notifier>,
        ledger: Arc<dyn NotifiedLedger>,
    ) -> Self {
        Self {
            appointments,
            notifier,
            ledger,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    pub poll_interval_secs: u64,
    pub retention_days: u32,
    pub rules: Vec<ReminderRule>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            retention_days: 7,
            rules: ReminderRule::defaults(),
        }
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }

    fn max_lead(&self) -> Duration {
        self.rules
            .iter()
            .map(ReminderRule::lead)
            .max()
            .unwrap_or_else(Duration::zero)
    }
}

/// Counts from one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub sent: usize,
    pub failed: usize,
    pub already_sent: usize,
    pub pruned: usize,
}

pub struct ReminderScheduler {
    context: ReminderContext,
    config: SchedulerConfig,
}

impl ReminderScheduler {
    pub fn new(context: ReminderContext, config: SchedulerConfig) -> Self {
        Self { context, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run one pass at time `now`
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, ReminderError> {
        let mut report = TickReport::default();

        let appointments = self
            .context
            .appointments
            .upcoming(now, now + self.config.max_lead())
            .await?;

        for appointment in appointments.into_iter().filter(|a| a.status.is_active()) {
            let Some(rule) = self
                .config
                .rules
                .iter()
                .filter(|rule| rule.is_due(appointment.starts_at, now))
                .min_by_key(|rule| rule.lead_minutes)
            else {
                continue;
            };

            let key = LedgerKey::new(appointment.id.clone(), rule.kind);
            match self.context.ledger.contains(&key).await {
                Ok(true) => {
                    report.already_sent += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        appointment_id = %appointment.id,
                        kind = rule.kind.as_str(),
                        error = %e,
                        "Reminder ledger lookup failed; will retry"
                    );
                    report.failed += 1;
                    continue;
                }
            }

            let reminder = Reminder {
                appointment,
                kind: rule.kind,
            };

            match self.context.notifier.notify(&reminder).await {
                Ok(()) => {
                    let entry = LedgerEntry {
                        key,
                        appointment_start: reminder.appointment.starts_at,
                        notified_at: now,
                    };
                    match self.context.ledger.record(entry).await {
                        Ok(()) => report.sent += 1,
                        Err(e) => {
                            // Delivered but not durable: the next tick may send it again
                            tracing::error!(
                                appointment_id = %reminder.appointment.id,
                                kind = reminder.kind.as_str(),
                                error = %e,
                                "Reminder sent but ledger write failed"
                            );
                            report.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        appointment_id = %reminder.appointment.id,
                        kind = reminder.kind.as_str(),
                        error = %e,
                        "Reminder delivery failed; will retry"
                    );
                    report.failed += 1;
                }
            }
        }

        match self.context.ledger.prune(now - self.config.retention()).await {
            Ok(pruned) => report.pruned = pruned,
            Err(e) => tracing::warn!(error = %e, "Reminder ledger prune failed"),
        }

        if report.sent > 0 || report.failed > 0 {
            tracing::info!(
                sent = report.sent,
                failed = report.failed,
                already_sent = report.already_sent,
                pruned = report.pruned,
                "Reminder tick"
            );
        }

        Ok(report)
    }

    /// Tick on the configured interval until `shutdown` becomes true
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.poll_interval().as_secs(),
            rules = self.config.rules.len(),
            "Reminder scheduler started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        tracing::error!(error = %e, "Reminder tick failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Reminder scheduler stopped");
    }
}
