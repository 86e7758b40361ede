//! Property-based invariant tests for the mutation engine.
//!
//! 1. No block ever has more than one incoming connection
//! 2. The root survives, keeps its category and never gains a parent
//! 3. Every connection references blocks of its own tree
//! 4. Trees stay acyclic
//! 5. Positions stay finite and within range
//! 6. Undoing every applied mutation restores the starting project
//! 7. Serialize/deserialize preserves blocks and topology
//! 8. Positions survive JSON text bit for bit

use std::collections::BTreeSet;

use proptest::prelude::*;
use treeforge_core::serializer::{
    deserialize_tree, project_from_json, serialize_project, serialize_tree, to_json,
};
use treeforge_core::{BlockUpdate, Position, ProjectStore, Tree, POSITION_LIMIT};

const TEMPLATES: [&str; 5] = ["sequence", "selector", "inverter", "wait", "condition"];

// ── Strategies ──────────────────────────────────────────────────────────

/// Block references are indices into the current block list (root first).
#[derive(Debug, Clone)]
enum Op {
    Create(usize, f64, f64),
    Connect(usize, usize),
    DeleteBlock(usize),
    DeleteConnection(usize),
    Move(usize, f64, f64),
    Undo,
    Redo,
}

fn coord() -> impl Strategy<Value = f64> {
    prop_oneof![
        -20_000.0f64..20_000.0,
        Just(f64::NAN),
        Just(f64::INFINITY),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..TEMPLATES.len(), coord(), coord()).prop_map(|(t, x, y)| Op::Create(t, x, y)),
        4 => (0usize..16, 0usize..16).prop_map(|(s, t)| Op::Connect(s, t)),
        1 => (0usize..16).prop_map(Op::DeleteBlock),
        1 => (0usize..16).prop_map(Op::DeleteConnection),
        1 => (0usize..16, coord(), coord()).prop_map(|(b, x, y)| Op::Move(b, x, y)),
        1 => Just(Op::Undo),
        1 => Just(Op::Redo),
    ]
}

fn block_ids(tree: &Tree) -> Vec<String> {
    let root = tree.root_id.clone().unwrap_or_default();
    let mut ids = vec![root.clone()];
    ids.extend(tree.blocks.keys().filter(|k| **k != root).cloned());
    ids
}

fn pick(ids: &[String], i: usize) -> String {
    ids[i % ids.len()].clone()
}

fn tree<'a>(store: &'a ProjectStore, tree_id: &str) -> &'a Tree {
    store.project().unwrap().tree(tree_id).unwrap()
}

/// Apply `op`; returns true when it changed the undo stack by one push.
fn apply(store: &mut ProjectStore, tree_id: &str, op: &Op) -> bool {
    let ids = block_ids(tree(store, tree_id));
    match op {
        Op::Create(t, x, y) => store
            .create_block(tree_id, TEMPLATES[*t], Position::new(*x, *y))
            .is_ok(),
        Op::Connect(s, t) => store
            .create_connection(tree_id, &pick(&ids, *s), &pick(&ids, *t))
            .is_ok(),
        Op::DeleteBlock(b) => store.delete_block(tree_id, &pick(&ids, *b)).is_ok(),
        Op::DeleteConnection(c) => {
            let connections = &tree(store, tree_id).connections;
            if connections.is_empty() {
                return false;
            }
            let id = connections[c % connections.len()].id.clone();
            store.delete_connection(tree_id, &id).is_ok()
        }
        Op::Move(b, x, y) => store
            .update_block(
                tree_id,
                &pick(&ids, *b),
                BlockUpdate::position(Position::new(*x, *y)),
            )
            .is_ok(),
        Op::Undo => {
            store.undo();
            false
        }
        Op::Redo => {
            store.redo();
            false
        }
    }
}

fn setup() -> (ProjectStore, String) {
    let mut store = ProjectStore::new();
    store.create_project("prop", None);
    let tree_id = store.selected_tree().unwrap().id.clone();
    (store, tree_id)
}

fn assert_invariants(tree: &Tree) {
    let root = tree.root_id.as_deref().expect("root id");
    let root_block = tree.blocks.get(root).expect("root block present");
    assert_eq!(root_block.category, treeforge_core::NodeCategory::Root);
    assert_eq!(tree.incoming_count(root), 0);

    for id in tree.blocks.keys() {
        assert!(tree.incoming_count(id) <= 1, "block {id} has several parents");
    }
    for c in &tree.connections {
        assert!(tree.blocks.contains_key(&c.source));
        assert!(tree.blocks.contains_key(&c.target));
    }
    for id in tree.blocks.keys() {
        let mut seen = BTreeSet::new();
        let mut current = Some(id.as_str());
        while let Some(block) = current {
            assert!(seen.insert(block), "cycle through {block}");
            current = tree.parent_of(block);
        }
    }
    for block in tree.blocks.values() {
        assert!(block.position.x.is_finite() && block.position.y.is_finite());
        assert!(block.position.x.abs() <= POSITION_LIMIT);
        assert!(block.position.y.abs() <= POSITION_LIMIT);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Structural invariants hold after every operation
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn invariants_hold_for_any_sequence(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let (mut store, tree_id) = setup();
        for op in &ops {
            apply(&mut store, &tree_id, op);
            assert_invariants(tree(&store, &tree_id));
        }
    }

    #[test]
    fn second_parent_is_always_refused(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let (mut store, tree_id) = setup();
        for op in &ops {
            apply(&mut store, &tree_id, op);
        }
        let t = tree(&store, &tree_id).clone();
        for c in &t.connections {
            for other in t.blocks.keys() {
                prop_assert!(store.create_connection(&tree_id, other, &c.target).is_err());
            }
        }
        prop_assert_eq!(tree(&store, &tree_id), &t);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// History and serialization
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn undo_all_restores_start(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let (mut store, tree_id) = setup();
        let start = store.project().unwrap().clone();
        // Undo/redo would make the count of applied mutations ambiguous.
        let ops: Vec<Op> = ops
            .into_iter()
            .filter(|op| !matches!(op, Op::Undo | Op::Redo))
            .collect();
        let applied = ops.iter().filter(|op| apply(&mut store, &tree_id, op)).count();

        prop_assert_eq!(store.history().undo_depth(), applied);
        for _ in 0..applied {
            prop_assert!(store.undo());
        }
        prop_assert!(!store.undo());
        prop_assert_eq!(store.project().unwrap(), &start);
    }

    #[test]
    fn undo_redo_pair_leaves_project_unchanged(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let (mut store, tree_id) = setup();
        for op in &ops {
            apply(&mut store, &tree_id, op);
        }
        let current = store.project().unwrap().clone();
        if store.undo() {
            prop_assert!(store.redo());
        }
        prop_assert_eq!(store.project().unwrap(), &current);
    }

    #[test]
    fn roundtrip_preserves_topology(ops in prop::collection::vec(op_strategy(), 1..50)) {
        let (mut store, tree_id) = setup();
        for op in &ops {
            apply(&mut store, &tree_id, op);
        }
        let original = tree(&store, &tree_id);
        let restored = deserialize_tree(&serialize_tree(original)).unwrap();

        let edges = |t: &Tree| -> BTreeSet<(String, String)> {
            t.connections.iter().map(|c| (c.source.clone(), c.target.clone())).collect()
        };
        prop_assert_eq!(&restored.blocks, &original.blocks);
        prop_assert_eq!(edges(&restored), edges(original));
        for id in original.blocks.keys() {
            let a: Vec<&str> = original.children_of(id).collect();
            let b: Vec<&str> = restored.children_of(id).collect();
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn json_text_keeps_positions_exact(
        coords in prop::collection::vec(
            (-POSITION_LIMIT..POSITION_LIMIT, -POSITION_LIMIT..POSITION_LIMIT),
            1..20,
        ),
        pretty in any::<bool>(),
    ) {
        let (mut store, tree_id) = setup();
        for (x, y) in &coords {
            store.create_block(&tree_id, "wait", Position::new(*x, *y)).unwrap();
        }
        let project = store.project().unwrap();
        let text = to_json(&serialize_project(project), pretty).unwrap();
        let restored = project_from_json(&text).unwrap();

        let original = tree(&store, &tree_id);
        let reloaded = restored.tree(&tree_id).unwrap();
        for (id, block) in &original.blocks {
            let back = reloaded.blocks[id].position;
            prop_assert_eq!(back.x.to_bits(), block.position.x.to_bits());
            prop_assert_eq!(back.y.to_bits(), block.position.y.to_bits());
        }
    }
}
