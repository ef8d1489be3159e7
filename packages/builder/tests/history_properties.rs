//! Property tests for edit sequences
//!
//! This tests:
//! - Undo of every recorded edit returns to the starting collection
//! - Undo/redo are inverse operations
//! - Redo is unavailable after a new edit
//! - Display order stays dense after every edit

use homepage_builder::{
    is_contiguous, Applied, BuilderOptions, BuilderSession, Section, SectionPatch, SequentialIds,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Reorder(usize, usize),
    Update(usize, String),
    ToggleVisibility(usize),
    ToggleLock(usize),
    Duplicate(usize),
    Delete(usize),
    Add,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..8, 0usize..8).prop_map(|(a, b)| Op::Reorder(a, b)),
        (0usize..8, "[a-z]{1,8}").prop_map(|(i, t)| Op::Update(i, t)),
        (0usize..8).prop_map(Op::ToggleVisibility),
        (0usize..8).prop_map(Op::ToggleLock),
        (0usize..8).prop_map(Op::Duplicate),
        (0usize..8).prop_map(Op::Delete),
        Just(Op::Add),
    ]
}

fn starting_session(count: usize) -> BuilderSession {
    let sections = (0..count)
        .map(|i| {
            let mut s = Section::new(format!("s{}", i), "custom", format!("Section {}", i));
            s.display_order = i as u32;
            s
        })
        .collect();

    BuilderSession::new(sections, BuilderOptions::default())
        .unwrap()
        .with_id_generator(SequentialIds::new("gen"))
}

/// Id of the section at `index` (wrapping), or a stale id for an empty list
fn id_at(session: &BuilderSession, index: usize) -> String {
    let sections = session.sections();
    if sections.is_empty() {
        "missing".to_string()
    } else {
        sections[index % sections.len()].id.clone()
    }
}

/// Apply `op`, returning true when it recorded a snapshot
fn run(session: &mut BuilderSession, op: &Op) -> bool {
    let result = match op {
        Op::Reorder(a, b) => session.reorder(*a, *b),
        Op::Update(i, title) => {
            let id = id_at(session, *i);
            session.update_section(&id, SectionPatch::title(title.clone()))
        }
        Op::ToggleVisibility(i) => {
            let id = id_at(session, *i);
            session.toggle_visibility(&id)
        }
        Op::ToggleLock(i) => {
            let id = id_at(session, *i);
            session.toggle_lock(&id)
        }
        Op::Duplicate(i) => {
            let id = id_at(session, *i);
            session.duplicate(&id)
        }
        Op::Delete(i) => {
            let id = id_at(session, *i);
            session.delete(&id)
        }
        Op::Add => session.add(),
    };

    matches!(result, Ok(Applied::Recorded { .. }))
}

proptest! {
    #[test]
    fn test_undo_all_restores_start(count in 0usize..6, ops in prop::collection::vec(op(), 1..25)) {
        let mut session = starting_session(count);
        let start = session.sections().to_vec();

        let mut recorded = 0;
        for op in &ops {
            if run(&mut session, op) {
                recorded += 1;
            }
            prop_assert!(is_contiguous(session.sections()));
        }

        for _ in 0..recorded {
            prop_assert!(session.undo());
        }

        prop_assert_eq!(session.sections(), start.as_slice());
        prop_assert!(!session.can_undo());
        prop_assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_undo_redo_are_inverse(
        count in 1usize..6,
        ops in prop::collection::vec(op(), 1..20),
        k_seed in 0usize..100,
    ) {
        let mut session = starting_session(count);
        let recorded = ops.iter().filter(|op| run(&mut session, op)).count();
        let end = session.sections().to_vec();

        let k = if recorded == 0 { 0 } else { k_seed % (recorded + 1) };
        for _ in 0..k {
            prop_assert!(session.undo());
        }
        for _ in 0..k {
            prop_assert!(session.redo());
        }

        prop_assert_eq!(session.sections(), end.as_slice());
        prop_assert!(!session.can_redo());
    }

    #[test]
    fn test_record_after_undo_clears_redo(count in 1usize..6, ops in prop::collection::vec(op(), 1..15)) {
        let mut session = starting_session(count);
        for op in &ops {
            run(&mut session, op);
        }

        if session.undo() {
            prop_assert!(session.can_redo());
            // Add never references an existing section, so it always records
            prop_assert!(run(&mut session, &Op::Add));
            prop_assert!(!session.can_redo());
        }
    }

    #[test]
    fn test_duplicate_copies_every_field(count in 1usize..6, index in 0usize..8, hide in any::<bool>()) {
        let mut session = starting_session(count);
        let id = id_at(&session, index);
        if hide {
            session.toggle_visibility(&id).unwrap();
        }

        let applied = session.duplicate(&id).unwrap();
        let new_id = applied.created().unwrap().to_string();
        prop_assert_ne!(&new_id, &id);

        let source = session.section(&id).unwrap().clone();
        let copy = session.section(&new_id).unwrap().clone();
        prop_assert_eq!(copy.display_order, source.display_order + 1);

        let mut normalized = copy;
        normalized.id = source.id.clone();
        normalized.display_order = source.display_order;
        prop_assert_eq!(normalized, source);
        prop_assert!(is_contiguous(session.sections()));
    }
}
