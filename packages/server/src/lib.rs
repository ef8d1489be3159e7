//! # Homepage Server
//!
//! HTTP front end for the homepage builder plus the appointment reminder
//! task.
//!
//! The builder UI talks to the JSON routes in [`routes`]; the live preview
//! frame listens on `GET /api/preview/events` and reloads whenever a save
//! lands in storage.

pub mod config;
pub mod routes;
pub mod state;
pub mod tasks;

pub use config::{Config, RemindersConfig, DEFAULT_CONFIG_NAME};
pub use routes::router;
pub use state::AppState;
pub use tasks::{start_reminders, ReminderTask};
