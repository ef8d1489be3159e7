//! Reminder kinds and the lead times that trigger them.

use crate::appointment::Appointment;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DayBefore,
    HourBefore,
}

impl ReminderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderKind::DayBefore => "day_before",
            ReminderKind::HourBefore => "hour_before",
        }
    }
}

/// Send a `kind` reminder once the appointment is `lead_minutes` away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRule {
    pub kind: ReminderKind,
    pub lead_minutes: u32,
}

impl ReminderRule {
    pub fn new(kind: ReminderKind, lead_minutes: u32) -> Self {
        Self { kind, lead_minutes }
    }

    pub fn lead(&self) -> Duration {
        Duration::minutes(i64::from(self.lead_minutes))
    }

    /// `now` falls in `[starts_at - lead, starts_at)`
    pub fn is_due(&self, starts_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now >= starts_at - self.lead() && now < starts_at
    }

    pub fn defaults() -> Vec<ReminderRule> {
        vec![
            ReminderRule::new(ReminderKind::DayBefore, 24 * 60),
            ReminderRule::new(ReminderKind::HourBefore, 60),
        ]
    }
}

/// A reminder ready to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub appointment: Appointment,
    pub kind: ReminderKind,
}

impl Reminder {
    pub fn message(&self, now: DateTime<Utc>) -> String {
        let minutes = (self.appointment.starts_at - now).num_minutes().max(0);
        let when = if minutes >= 120 {
            format!("in {} hours", minutes / 60)
        } else {
            format!("in {} minutes", minutes)
        };
        format!("Reminder: {} starts {}", self.appointment.title, when)
    }
}
