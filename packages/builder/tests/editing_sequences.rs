//! End-to-end editing scenarios
//!
//! This tests:
//! - Reorder/delete/add sequences against expected orderings
//! - Load → edit → save round trips through both stores
//! - Save failure, retry and concurrent save rejection
//! - Preview reloads only after durable writes

use homepage_builder::{
    Applied, BuilderError, BuilderOptions, BuilderSession, BuilderView, JsonFileSectionStore,
    MemorySectionStore, PersistError, PersistenceGate, PreviewSignal, ReloadReason, Section,
    SectionStore, SequentialIds,
};
use std::sync::Arc;
use std::time::Duration;

fn abc() -> Vec<Section> {
    ["A", "B", "C"]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut s = Section::new(*name, "custom", *name);
            s.display_order = i as u32;
            s
        })
        .collect()
}

fn order(session: &BuilderSession) -> Vec<(String, u32)> {
    session
        .sections()
        .iter()
        .map(|s| (s.id.clone(), s.display_order))
        .collect()
}

fn expected(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
    pairs.iter().map(|(id, o)| (id.to_string(), *o)).collect()
}

async fn ready(gate: &PersistenceGate) -> BuilderSession {
    match BuilderView::load(gate, BuilderOptions::default()).await {
        BuilderView::Ready(session) => session.with_id_generator(SequentialIds::new("new")),
        BuilderView::Unavailable { reason } => panic!("builder unavailable: {}", reason),
    }
}

#[test]
fn test_reorder_then_undo() {
    let mut session = BuilderSession::new(abc(), BuilderOptions::default()).unwrap();

    session.reorder(0, 2).unwrap();
    assert_eq!(order(&session), expected(&[("B", 0), ("C", 1), ("A", 2)]));

    assert!(session.undo());
    assert_eq!(order(&session), expected(&[("A", 0), ("B", 1), ("C", 2)]));
}

#[test]
fn test_add_on_empty_collection() {
    let mut session = BuilderSession::new(vec![], BuilderOptions::default())
        .unwrap()
        .with_id_generator(SequentialIds::new("new"));

    session.add().unwrap();
    assert_eq!(session.sections().len(), 1);
    assert_eq!(session.sections()[0].display_order, 0);

    session.add().unwrap();
    assert_eq!(session.sections()[1].display_order, 1);
}

#[test]
fn test_delete_compacts_following_orders() {
    let mut session = BuilderSession::new(abc(), BuilderOptions::default()).unwrap();

    session.delete("B").unwrap();
    assert_eq!(order(&session), expected(&[("A", 0), ("C", 1)]));
}

#[test]
fn test_update_missing_section_is_silent() {
    let mut session = BuilderSession::new(abc(), BuilderOptions::default()).unwrap();
    let before = session.sections().to_vec();

    let applied = session
        .update_section("gone", homepage_builder::SectionPatch::title("x"))
        .unwrap();

    assert_eq!(applied, Applied::Ignored);
    assert_eq!(session.sections(), before.as_slice());
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_mixed_sequence_with_branching_redo() {
    let mut session = BuilderSession::new(abc(), BuilderOptions::default())
        .unwrap()
        .with_id_generator(SequentialIds::new("new"));

    session.duplicate("A").unwrap();
    session.toggle_visibility("C").unwrap();
    session.reorder(3, 0).unwrap();
    assert_eq!(
        order(&session),
        expected(&[("C", 0), ("A", 1), ("new-1", 2), ("B", 3)])
    );
    assert!(!session.sections()[0].is_visible);

    session.undo();
    session.undo();
    assert_eq!(session.history().redo_levels(), 2);

    session.delete("B").unwrap();
    assert!(!session.can_redo());
    assert_eq!(order(&session), expected(&[("A", 0), ("new-1", 1), ("C", 2)]));
    assert!(session.sections()[2].is_visible);
}

#[tokio::test]
async fn test_load_edit_save_round_trip() {
    let store = Arc::new(MemorySectionStore::with_sections(abc()));
    let gate = PersistenceGate::new(store.clone(), PreviewSignal::new());
    let mut session = ready(&gate).await;

    session.delete("B").unwrap();
    session.add_section("featured_labs", "Featured Labs").unwrap();
    assert!(session.has_unsaved_changes());

    let revision = session.save(&gate).await.unwrap();
    assert_eq!(revision, session.revision());
    assert!(!session.has_unsaved_changes());

    let stored: Vec<_> = store
        .snapshot()
        .await
        .into_iter()
        .map(|s| (s.id, s.display_order))
        .collect();
    assert_eq!(stored, expected(&[("A", 0), ("C", 1), ("new-1", 2)]));

    let preview = gate.preview().latest();
    assert_eq!(preview.reason, ReloadReason::Saved);
    assert_eq!(preview.revision, Some(revision));
}

#[tokio::test]
async fn test_failed_save_keeps_edits_and_allows_retry() {
    let store = Arc::new(MemorySectionStore::with_sections(abc()));
    let gate = PersistenceGate::new(store.clone(), PreviewSignal::new());
    let mut session = ready(&gate).await;

    session.reorder(0, 2).unwrap();
    store.set_fail_writes(true);

    let result = session.save(&gate).await;
    assert!(matches!(
        result,
        Err(BuilderError::Persist(PersistError::Store(_)))
    ));
    assert!(session.has_unsaved_changes());
    assert!(session.can_undo());
    assert_eq!(session.sections()[0].id, "B");
    assert_eq!(gate.preview().latest().sequence, 0);

    store.set_fail_writes(false);
    session.save(&gate).await.unwrap();
    assert!(!session.has_unsaved_changes());
    assert_eq!(store.snapshot().await[0].id, "B");
}

#[tokio::test]
async fn test_second_save_while_pending_is_rejected() {
    let store = Arc::new(
        MemorySectionStore::with_sections(abc()).with_latency(Duration::from_millis(50)),
    );
    let gate = PersistenceGate::new(store.clone(), PreviewSignal::new());
    let mut session = ready(&gate).await;
    session.toggle_visibility("A").unwrap();

    let first = session.prepare_save();
    let second = session.prepare_save();

    let (a, b) = tokio::join!(gate.save(&first.snapshot), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(gate.is_saving());
        gate.save(&second.snapshot).await
    });

    assert!(a.is_ok());
    assert!(matches!(b, Err(PersistError::SaveInProgress)));
    assert_eq!(store.upsert_calls(), 1);

    session.complete_save(&first);
    assert!(!session.has_unsaved_changes());
}

#[tokio::test]
async fn test_undo_back_to_saved_state_is_clean() {
    let store = Arc::new(MemorySectionStore::with_sections(abc()));
    let gate = PersistenceGate::new(store, PreviewSignal::new());
    let mut session = ready(&gate).await;

    session.toggle_lock("A").unwrap();
    session.save(&gate).await.unwrap();
    session.toggle_visibility("B").unwrap();
    assert!(session.has_unsaved_changes());

    session.undo();
    assert!(!session.has_unsaved_changes());

    // Undoing past the save is a change relative to storage
    session.undo();
    assert!(session.has_unsaved_changes());
}

#[tokio::test]
async fn test_load_failure_gives_unavailable_view() {
    let store = Arc::new(MemorySectionStore::with_sections(abc()));
    store.set_fail_reads(true);
    let gate = PersistenceGate::new(store, PreviewSignal::new());

    let view = BuilderView::load(&gate, BuilderOptions::default()).await;
    match view {
        BuilderView::Unavailable { reason } => assert!(reason.contains("reads disabled")),
        BuilderView::Ready(_) => panic!("expected load failure"),
    }
}

#[tokio::test]
async fn test_json_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sections.json");

    let seed = JsonFileSectionStore::new(&path);
    seed.upsert_sections(&abc()).await.unwrap();

    let gate = PersistenceGate::new(Arc::new(JsonFileSectionStore::new(&path)), PreviewSignal::new());
    let mut session = ready(&gate).await;
    session.delete("A").unwrap();
    session.duplicate("C").unwrap();
    session.save(&gate).await.unwrap();

    // A fresh session sees exactly what was saved
    let reopened = ready(&gate).await;
    assert_eq!(
        order(&reopened),
        expected(&[("B", 0), ("C", 1), ("new-1", 2)])
    );
    assert!(!reopened.has_unsaved_changes());
}
