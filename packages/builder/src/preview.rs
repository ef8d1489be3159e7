//! # Live Preview Signal
//!
//! The preview frame renders the public site from durable storage, so it only
//! needs to hear about two things: a save that succeeded, and an explicit
//! reload request. In-memory edits and undo/redo never reach it.

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadReason {
    /// Initial value before anything happened
    Startup,
    Saved,
    Forced,
}

/// Notification that the preview frame should reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreviewEvent {
    /// Bumps on every event
    pub sequence: u64,

    /// Builder revision that storage now holds, if known
    pub revision: Option<u64>,

    pub reason: ReloadReason,
}

/// Broadcasts reload requests to every preview subscriber
#[derive(Debug, Clone)]
pub struct PreviewSignal {
    sender: watch::Sender<PreviewEvent>,
}

impl PreviewSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(PreviewEvent {
            sequence: 0,
            revision: None,
            reason: ReloadReason::Startup,
        });
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewEvent> {
        self.sender.subscribe()
    }

    pub fn latest(&self) -> PreviewEvent {
        *self.sender.borrow()
    }

    /// Storage now holds `revision`
    pub fn saved(&self, revision: u64) {
        self.publish(Some(revision), ReloadReason::Saved);
    }

    /// Reload without any new durable state
    pub fn force_reload(&self) {
        let revision = self.latest().revision;
        self.publish(revision, ReloadReason::Forced);
    }

    fn publish(&self, revision: Option<u64>, reason: ReloadReason) {
        self.sender.send_modify(|event| {
            event.sequence += 1;
            event.revision = revision;
            event.reason = reason;
        });
        tracing::debug!(?reason, ?revision, "Preview reload signalled");
    }
}

impl Default for PreviewSignal {
    fn default() -> Self {
        Self::new()
    }
}
