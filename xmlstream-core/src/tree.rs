//! Schema tree storage and structure.
//!
//! The tree uses an index-based arena so parent and sibling links are plain
//! [`NodeId`]s, with no reference cycles. Children of a node form a
//! singly-headed, doubly-linked sibling list:
//!
//! ```text
//! parent.first_child ──▶ head ──next──▶ b ──next──▶ tail ──next──▶ None
//!                         ▲ │prev        │prev        │prev
//!                         │ ╰──────────────────────────────▶ tail
//!                         ╰────────────╯            ╰──▶ b
//! ```
//!
//! The head's `prev_sibling` slot holds the tail, which gives O(1) access to
//! the last child without a separate field on the parent. Every other
//! child's `prev_sibling` is its true predecessor, and the tail's
//! `next_sibling` is `None`. Insertion and removal of the circular link are
//! both O(1), as is every traversal step.
//!
//! Structural edits assume the inserted child is fresh: attaching a node
//! that is already part of a sibling list leaves the links inconsistent.
//! The arena keeps that memory-safe but does not detect it.

use std::ops::{Index, IndexMut};

use log::trace;

use crate::name::Name;
use crate::node::{Node, NodeId, NodeKind, NodeValue};

/// A schema: the node arena and its root.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<Node>,
    root: NodeId,
}

// ============================================================================
// Arena
// ============================================================================

impl Schema {
    /// An arena holding only a root node.
    pub(crate) fn bare() -> Self {
        let root = NodeId::new(0);
        Schema {
            nodes: vec![Node::new(root, NodeKind::Root, Name::default(), NodeValue::None)],
            root,
        }
    }

    /// Allocate an unattached node.
    pub(crate) fn alloc(&mut self, kind: NodeKind, name: Name, value: NodeValue) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(id, kind, name, value));
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

impl Index<NodeId> for Schema {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.node(id)
    }
}

impl IndexMut<NodeId> for Schema {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        self.node_mut(id)
    }
}

// ============================================================================
// Structural edits
// ============================================================================

impl Schema {
    /// Insert `child` as the last child of `parent`. Returns `child`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        trace!("append {:?} to {:?}", child, parent);
        self[child].parent = Some(parent);
        self[child].next_sibling = None;
        match self[parent].first_child {
            Some(head) => {
                let tail = self[head].prev_sibling;
                self[tail].next_sibling = Some(child);
                self[child].prev_sibling = tail;
                self[head].prev_sibling = child;
            }
            None => {
                self[parent].first_child = Some(child);
                self[child].prev_sibling = child;
            }
        }
        child
    }

    /// Insert `child` as the first child of `parent`. Returns `child`.
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        trace!("prepend {:?} to {:?}", child, parent);
        self[child].parent = Some(parent);
        let head = self[parent].first_child;
        match head {
            Some(head) => {
                self[child].prev_sibling = self[head].prev_sibling;
                self[head].prev_sibling = child;
            }
            None => self[child].prev_sibling = child,
        }
        self[child].next_sibling = head;
        self[parent].first_child = Some(child);
        child
    }

    /// Insert `child` immediately before `reference`, a child of `parent`.
    /// With no reference this is [`Schema::prepend`].
    pub fn insert_before(&mut self, parent: NodeId, reference: Option<NodeId>, child: NodeId) -> NodeId {
        let Some(before) = reference else {
            return self.prepend(parent, child);
        };
        debug_assert_eq!(self[before].parent, Some(parent), "reference is not a child of parent");
        trace!("insert {:?} before {:?}", child, before);

        self[child].parent = Some(parent);
        let prev = self[before].prev_sibling;
        if self[prev].next_sibling.is_some() {
            self[prev].next_sibling = Some(child);
        } else {
            // `before` is the head; its prev slot (the tail) carries over to child
            self[parent].first_child = Some(child);
        }
        self[child].prev_sibling = prev;
        self[child].next_sibling = Some(before);
        self[before].prev_sibling = child;
        child
    }

    /// Insert `child` immediately after `reference`, a child of `parent`.
    /// With no reference this is [`Schema::append`].
    pub fn insert_after(&mut self, parent: NodeId, reference: Option<NodeId>, child: NodeId) -> NodeId {
        let Some(after) = reference else {
            return self.append(parent, child);
        };
        debug_assert_eq!(self[after].parent, Some(parent), "reference is not a child of parent");
        trace!("insert {:?} after {:?}", child, after);

        self[child].parent = Some(parent);
        let next = self[after].next_sibling;
        match next {
            Some(next) => self[next].prev_sibling = child,
            None => {
                // `after` is the tail
                if let Some(head) = self[parent].first_child {
                    self[head].prev_sibling = child;
                }
            }
        }
        self[child].next_sibling = next;
        self[child].prev_sibling = after;
        self[after].next_sibling = Some(child);
        child
    }
}

// ============================================================================
// Traversal
// ============================================================================

impl Schema {
    /// Children of `parent` in document order.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        Children { schema: self, next: self[parent].first_child }
    }

    /// Children of `parent` from last to first.
    pub fn children_rev(&self, parent: NodeId) -> ChildrenRev<'_> {
        ChildrenRev { schema: self, next: self.last_child(parent) }
    }

    /// The last child of `parent`, read from the head's tail slot.
    pub fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        self[parent].first_child.map(|head| self[head].prev_sibling)
    }

    /// Visit the children of `parent` head to tail, stopping at the first
    /// error, which is returned as is.
    pub fn iter<E, F>(&self, parent: NodeId, mut f: F) -> Result<(), E>
    where
        F: FnMut(NodeId, &Node) -> Result<(), E>,
    {
        for id in self.children(parent) {
            f(id, &self[id])?;
        }
        Ok(())
    }

    /// Visit the children of `parent` tail to head, stopping at the first
    /// error, which is returned as is.
    pub fn iter_reverse<E, F>(&self, parent: NodeId, mut f: F) -> Result<(), E>
    where
        F: FnMut(NodeId, &Node) -> Result<(), E>,
    {
        for id in self.children_rev(parent) {
            f(id, &self[id])?;
        }
        Ok(())
    }

    /// The nearest ancestor that is either the root or a named element.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let mut it = self[node].parent;
        while let Some(id) = it {
            let n = &self[id];
            match n.kind() {
                NodeKind::Root => return Some(id),
                NodeKind::Element if !n.name().local.is_empty() => return Some(id),
                _ => it = n.parent,
            }
        }
        None
    }
}

/// Forward iterator over a node's children.
#[derive(Debug, Clone)]
pub struct Children<'s> {
    schema: &'s Schema,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.schema[id].next_sibling;
        Some(id)
    }
}

/// Reverse iterator over a node's children.
///
/// Follows `prev_sibling` from the tail. The walk ends after the head,
/// which is the only child whose predecessor slot names a node with no
/// next sibling (the tail).
#[derive(Debug, Clone)]
pub struct ChildrenRev<'s> {
    schema: &'s Schema,
    next: Option<NodeId>,
}

impl Iterator for ChildrenRev<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        let prev = self.schema[id].prev_sibling;
        self.next = self.schema[prev].next_sibling.map(|_| prev);
        Some(id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NodeOptions;

    fn elem(schema: &mut Schema, local: &'static str) -> NodeId {
        schema.element(Name::local(local), NodeOptions::new())
    }

    fn names(schema: &Schema, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
        ids.map(|id| schema[id].name().local.to_string()).collect()
    }

    /// Checks the tail slot and the tail's empty next link.
    fn assert_tail_invariant(schema: &Schema, parent: NodeId) {
        let all: Vec<_> = schema.children(parent).collect();
        match all.last() {
            Some(&tail) => {
                assert_eq!(schema.last_child(parent), Some(tail));
                assert_eq!(schema[tail].next_sibling(), None);
            }
            None => assert_eq!(schema[parent].first_child(), None),
        }
    }

    #[test]
    fn test_append() {
        let mut schema = Schema::bare();
        let parent = elem(&mut schema, "parent");
        let mut want = Vec::new();
        for local in ["child1", "child2", "child3"] {
            let child = elem(&mut schema, local);
            want.push(schema.append(parent, child));
        }
        assert_eq!(schema.children(parent).collect::<Vec<_>>(), want);
        for &child in &want {
            assert_eq!(schema[child].parent(), Some(parent));
        }
        assert_tail_invariant(&schema, parent);
    }

    #[test]
    fn test_sole_child_keeps_self_loop() {
        let mut schema = Schema::bare();
        let parent = elem(&mut schema, "parent");
        let child = elem(&mut schema, "child");
        schema.append(parent, child);
        assert_eq!(schema[child].prev_sibling(), child);
        assert_eq!(schema[child].next_sibling(), None);
    }

    #[test]
    fn test_prepend() {
        let mut schema = Schema::bare();
        let parent = elem(&mut schema, "parent");
        for local in ["1", "2", "3"] {
            let child = elem(&mut schema, local);
            schema.prepend(parent, child);
        }
        assert_eq!(names(&schema, schema.children(parent)), ["3", "2", "1"]);
        assert_tail_invariant(&schema, parent);
    }

    #[test]
    fn test_append_prepend_mix() {
        let mut schema = Schema::bare();
        let parent = elem(&mut schema, "");
        let (e1, e2, e3) = (elem(&mut schema, "1"), elem(&mut schema, "2"), elem(&mut schema, "3"));
        schema.append(parent, e1);
        schema.prepend(parent, e2);
        schema.append(parent, e3);
        assert_eq!(names(&schema, schema.children(parent)), ["2", "1", "3"]);
        assert_eq!(names(&schema, schema.children_rev(parent)), ["3", "1", "2"]);
        assert_tail_invariant(&schema, parent);
    }

    #[test]
    fn test_insert_after_and_before() {
        let mut schema = Schema::bare();
        let parent = elem(&mut schema, "");
        let a = elem(&mut schema, "A");
        let b = elem(&mut schema, "B");
        let c = elem(&mut schema, "C");
        let d = elem(&mut schema, "D");
        schema.insert_after(parent, None, a);
        schema.insert_before(parent, None, b);
        schema.insert_before(parent, Some(a), c);
        schema.insert_after(parent, Some(b), d);
        assert_eq!(names(&schema, schema.children(parent)), ["B", "D", "C", "A"]);
        assert_eq!(names(&schema, schema.children_rev(parent)), ["A", "C", "D", "B"]);
        assert_tail_invariant(&schema, parent);
    }

    #[test]
    fn test_insert_after_chain() {
        let mut schema = Schema::bare();
        let parent = elem(&mut schema, "");
        let e1 = elem(&mut schema, "1");
        let e1 = schema.insert_after(parent, None, e1);
        let e2 = elem(&mut schema, "2");
        let e2 = schema.insert_after(parent, Some(e1), e2);
        let e3 = elem(&mut schema, "3");
        schema.insert_after(parent, Some(e2), e3);
        assert_eq!(names(&schema, schema.children(parent)), ["1", "2", "3"]);
        assert_eq!(schema.last_child(parent), Some(e3));
    }

    #[test]
    fn test_insert_before_head() {
        let mut schema = Schema::bare();
        let parent = elem(&mut schema, "");
        let (e1, e2, e3) = (elem(&mut schema, "1"), elem(&mut schema, "2"), elem(&mut schema, "3"));
        schema.append(parent, e2);
        schema.append(parent, e3);
        schema.insert_before(parent, Some(e2), e1);
        assert_eq!(schema[parent].first_child(), Some(e1));
        assert_eq!(schema[e1].prev_sibling(), e3);
        assert_eq!(names(&schema, schema.children_rev(parent)), ["3", "2", "1"]);
    }

    #[test]
    fn test_iter_empty() {
        let mut schema = Schema::bare();
        let parent = elem(&mut schema, "empty");
        let mut called = 0;
        let res: Result<(), ()> = schema.iter(parent, |_, _| {
            called += 1;
            Ok(())
        });
        assert!(res.is_ok());
        assert!(schema.iter_reverse(parent, |_, _| Err(())).is_ok());
        assert_eq!(called, 0);
    }

    #[test]
    fn test_iter_short_circuit() {
        let mut schema = Schema::bare();
        let parent = elem(&mut schema, "");
        for local in ["1", "2", "3"] {
            let child = elem(&mut schema, local);
            schema.append(parent, child);
        }
        let mut seen = Vec::new();
        let res = schema.iter(parent, |_, node| {
            seen.push(node.name().local.to_string());
            if node.name().local == "2" {
                Err("stop")
            } else {
                Ok(())
            }
        });
        assert_eq!(res, Err("stop"));
        assert_eq!(seen, ["1", "2"]);

        seen.clear();
        let res = schema.iter_reverse(parent, |_, node| {
            seen.push(node.name().local.to_string());
            if node.name().local == "2" {
                Err("stop")
            } else {
                Ok(())
            }
        });
        assert_eq!(res, Err("stop"));
        assert_eq!(seen, ["3", "2"]);
    }

    #[test]
    fn test_iter_does_not_recurse() {
        let mut schema = Schema::bare();
        let parent = elem(&mut schema, "parent");
        let child = elem(&mut schema, "child");
        let grandchild = elem(&mut schema, "grandchild");
        schema.append(parent, child);
        schema.append(child, grandchild);
        assert_eq!(names(&schema, schema.children(parent)), ["child"]);
    }

    #[test]
    fn test_parent_element() {
        let mut schema = Schema::bare();
        let root = schema.root();
        let named = elem(&mut schema, "named");
        let anon = elem(&mut schema, "");
        let text = schema.text(NodeOptions::new());
        schema.append(root, named);
        schema.append(named, anon);
        schema.append(anon, text);
        assert_eq!(schema.parent_element(text), Some(named));
        assert_eq!(schema.parent_element(named), Some(root));
        assert_eq!(schema.parent_element(root), None);
    }
}
