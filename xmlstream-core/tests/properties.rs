//! Property-based tests for the schema tree
//!
//! Random sequences of structural edits are applied to a schema and to a
//! plain `Vec` model side by side. Whatever the sequence, the sibling list
//! must read back in model order both ways, and the head's tail slot must
//! always name the true last child.

use proptest::prelude::*;
use xmlstream_core::{Name, NodeId, NodeOptions, Schema};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Append,
    Prepend,
    /// Reference picked by index into the current children, `None` for no
    /// reference.
    InsertBefore(Option<usize>),
    InsertAfter(Option<usize>),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Append),
        Just(Op::Prepend),
        proptest::option::of(any::<usize>()).prop_map(Op::InsertBefore),
        proptest::option::of(any::<usize>()).prop_map(Op::InsertAfter),
    ]
}

/// Apply `ops` to a fresh parent, returning the schema, the parent and the
/// expected child order.
fn build(ops: &[Op]) -> (Schema, NodeId, Vec<NodeId>) {
    let mut schema = Schema::new();
    let parent = schema.element(Name::local("parent"), NodeOptions::new());
    let mut model: Vec<NodeId> = Vec::new();

    for (i, op) in ops.iter().enumerate() {
        let child = schema.element(Name::local(i.to_string()), NodeOptions::new());
        let pick = |n: Option<usize>, model: &[NodeId]| match n {
            Some(n) if !model.is_empty() => Some(n % model.len()),
            _ => None,
        };
        match *op {
            Op::Append => {
                schema.append(parent, child);
                model.push(child);
            }
            Op::Prepend => {
                schema.prepend(parent, child);
                model.insert(0, child);
            }
            Op::InsertBefore(n) => match pick(n, &model) {
                Some(at) => {
                    schema.insert_before(parent, Some(model[at]), child);
                    model.insert(at, child);
                }
                None => {
                    schema.insert_before(parent, None, child);
                    model.insert(0, child);
                }
            },
            Op::InsertAfter(n) => match pick(n, &model) {
                Some(at) => {
                    schema.insert_after(parent, Some(model[at]), child);
                    model.insert(at + 1, child);
                }
                None => {
                    schema.insert_after(parent, None, child);
                    model.push(child);
                }
            },
        }
    }
    (schema, parent, model)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// Forward traversal matches the model.
    #[test]
    fn forward_order_matches_model(ops in prop::collection::vec(op(), 0..64)) {
        let (schema, parent, model) = build(&ops);
        let got: Vec<NodeId> = schema.children(parent).collect();
        prop_assert_eq!(got, model);
    }

    /// Reverse traversal is the exact reverse of forward traversal.
    #[test]
    fn reverse_is_reversed_forward(ops in prop::collection::vec(op(), 0..64)) {
        let (schema, parent, _) = build(&ops);
        let mut forward: Vec<NodeId> = schema.children(parent).collect();
        forward.reverse();
        let mut reverse = Vec::new();
        let res: Result<(), ()> = schema.iter_reverse(parent, |id, _| {
            reverse.push(id);
            Ok(())
        });
        prop_assert!(res.is_ok());
        prop_assert_eq!(reverse, forward);
    }

    /// The head's tail slot names the last child, whose next link is empty.
    #[test]
    fn tail_slot_names_last_child(ops in prop::collection::vec(op(), 0..64)) {
        let (schema, parent, model) = build(&ops);
        match model.last() {
            Some(&tail) => {
                let head = schema[parent].first_child().unwrap();
                prop_assert_eq!(schema[head].prev_sibling(), tail);
                prop_assert_eq!(schema.last_child(parent), Some(tail));
                prop_assert_eq!(schema[tail].next_sibling(), None);
            }
            None => prop_assert_eq!(schema[parent].first_child(), None),
        }
    }

    /// Every non-head child's predecessor slot is its true predecessor, and
    /// every child points back at the parent.
    #[test]
    fn prev_links_are_true_predecessors(ops in prop::collection::vec(op(), 1..64)) {
        let (schema, parent, model) = build(&ops);
        for pair in model.windows(2) {
            prop_assert_eq!(schema[pair[1]].prev_sibling(), pair[0]);
            prop_assert_eq!(schema[pair[0]].next_sibling(), Some(pair[1]));
        }
        for &child in &model {
            prop_assert_eq!(schema[child].parent(), Some(parent));
        }
    }

    /// Appending only preserves call order; prepending only reverses it.
    #[test]
    fn append_and_prepend_orders(n in 0usize..32) {
        let (schema, parent, appended) = build(&vec![Op::Append; n]);
        prop_assert_eq!(schema.children(parent).collect::<Vec<_>>(), appended);

        let (schema, parent, _) = build(&vec![Op::Prepend; n]);
        let names: Vec<usize> = schema
            .children(parent)
            .map(|id| schema[id].name().local.parse().unwrap())
            .collect();
        let expected: Vec<usize> = (0..n).rev().collect();
        prop_assert_eq!(names, expected);
    }
}

#[test]
fn documented_insert_sequence() {
    // InsertAfter(nil, A), InsertBefore(nil, B), InsertBefore(A, C), InsertAfter(B, D)
    let (schema, parent, _) = build(&[
        Op::InsertAfter(None),
        Op::InsertBefore(None),
        Op::InsertBefore(Some(1)),
        Op::InsertAfter(Some(0)),
    ]);
    let names: Vec<String> = schema
        .children(parent)
        .map(|id| schema[id].name().local.to_string())
        .collect();
    // A=0, B=1, C=2, D=3
    assert_eq!(names, ["1", "3", "2", "0"]);
}
