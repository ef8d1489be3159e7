//! Shared state behind the HTTP handlers

use homepage_builder::{BuilderOptions, BuilderView, PersistenceGate, SectionStore};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One builder view per server process.
///
/// Handlers hold `view` only for synchronous work; the storage await in a
/// save happens with the lock released.
#[derive(Clone)]
pub struct AppState {
    pub view: Arc<Mutex<BuilderView>>,
    pub gate: Arc<PersistenceGate>,
    pub options: BuilderOptions,
}

impl AppState {
    pub fn new(view: BuilderView, gate: Arc<PersistenceGate>, options: BuilderOptions) -> Self {
        Self {
            view: Arc::new(Mutex::new(view)),
            gate,
            options,
        }
    }

    /// Build the gate over `store` and perform the initial load
    pub async fn load(store: Arc<dyn SectionStore>, options: BuilderOptions) -> Self {
        let gate = Arc::new(PersistenceGate::new(store, Default::default()));
        let view = BuilderView::load(&gate, options.clone()).await;
        Self::new(view, gate, options)
    }

    /// Replace the view with a fresh load from storage
    pub async fn reload(&self) {
        let view = BuilderView::load(&self.gate, self.options.clone()).await;
        *self.view.lock().await = view;
    }
}
