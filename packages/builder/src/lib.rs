//! # Homepage Builder
//!
//! Editing engine for the marketplace homepage layout.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ toolbar / section cards / drag gestures     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ session: mutations + history + selection    │
//! │  - Pure mutations over the section list     │
//! │  - Snapshot undo/redo                       │
//! │  - Selection (not undoable)                 │
//! └─────────────────────────────────────────────┘
//!                     ↓ save
//! ┌─────────────────────────────────────────────┐
//! │ persistence gate → section store            │
//! │  - One save in flight                       │
//! │  - Preview reload after success             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are immutable**: every edit produces a new one
//! 2. **Display order is dense**: always `0..N-1` after an edit
//! 3. **Storage is explicit**: nothing is written until `save`
//! 4. **Preview follows storage**: never the undo buffer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use homepage_builder::{BuilderOptions, BuilderView, PersistenceGate, PreviewSignal};
//!
//! let gate = PersistenceGate::new(store, PreviewSignal::new());
//! let BuilderView::Ready(mut session) = BuilderView::load(&gate, BuilderOptions::default()).await else {
//!     return;
//! };
//!
//! session.reorder(0, 2)?;
//! session.undo();
//! session.save(&gate).await?;
//! ```

mod errors;
mod history;
mod layout;
mod mutations;
mod persistence;
mod preview;
mod section;
mod selection;
mod session;
mod store;

pub use errors::{BuilderError, PersistError, StoreError};
pub use history::{History, Snapshot};
pub use layout::{
    AspectRatio, CardSize, Columns, ColumnsPatch, ImagePatch, ImageSettings, LayoutError, LayoutPatch,
    LayoutVersion, Palette, PalettePatch, SectionLayout, Spacing, SpacingPatch, MAX_COLUMNS,
    MAX_IMAGE_HEIGHT, MAX_SPACING,
};
pub use mutations::{LockPolicy, Mutation, MutationError};
pub use persistence::{validate_for_save, PersistenceGate};
pub use preview::{PreviewEvent, PreviewSignal, ReloadReason};
pub use section::{is_contiguous, Section, SectionId, SectionPatch};
pub use selection::Selection;
pub use session::{
    Applied, BuilderOptions, BuilderSession, BuilderView, IdGenerator, SaveTicket, SequentialIds, UuidIds,
    DEFAULT_SECTION_KEY, DEFAULT_SECTION_TITLE,
};
pub use store::{JsonFileSectionStore, MemorySectionStore, SectionStore};
