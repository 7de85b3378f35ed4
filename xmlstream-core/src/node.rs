//! Schema nodes.
//!
//! Every entry of a schema tree is a [`Node`]: element, text and
//! processing-instruction matchers, the root, and callbacks. Callbacks are
//! ordinary child nodes whose name is one of the reserved names in
//! [`crate::name`].

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::machine::{StateFn, StateMachine};
use crate::name::Name;
use crate::occurs::Occurrence;
use crate::token::{ProcInst, StartElement, Token};

/// Index into the schema's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Panics once the arena holds more than `u32::MAX` nodes.
    pub(crate) fn new(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(index) => NodeId(index),
            Err(_) => panic!("schema arena overflow at {} nodes", index),
        }
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of a schema node. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Element,
    Text,
    ProcInst,
    Callback,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Root => "root",
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::ProcInst => "processing-instruction",
            NodeKind::Callback => "callback",
        })
    }
}

/// Callback invoked with the observed token and the node it is attached
/// under. The token is borrowed; clone it to keep it.
pub type TokenCallback = Arc<dyn Fn(&Context, &mut Node, &Token) + Send + Sync>;

/// Callback conforming to the transition signature, used to replace the
/// active parsing routine.
pub type HandoffFn =
    Arc<dyn for<'a> Fn(&Context, &mut StateMachine<'a>) -> Option<StateFn<'a>> + Send + Sync>;

/// The function carried by a callback node.
#[derive(Clone)]
pub enum Callback {
    Token(TokenCallback),
    Handoff(HandoffFn),
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Token(_) => f.write_str("Callback::Token(..)"),
            Callback::Handoff(_) => f.write_str("Callback::Handoff(..)"),
        }
    }
}

/// Kind-dependent node payload.
#[derive(Debug, Clone, Default)]
pub enum NodeValue {
    #[default]
    None,
    /// Target of a processing-instruction matcher.
    ProcInst(ProcInst),
    Callback(Callback),
}

/// Run-time counters. Only re-construction resets them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStatus {
    /// Number of times this node has been observed.
    pub occurs: u32,
    /// The most recent start tag observed for this node.
    pub last_start: Option<StartElement>,
}

/// A node of a schema tree.
///
/// The structural links are maintained by [`crate::Schema`]. The head of a
/// sibling list stores the tail in its `prev_sibling` slot; an unattached
/// node's `prev_sibling` names itself.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    name: Name,
    value: NodeValue,
    occurrence: Option<Occurrence>,
    pub status: NodeStatus,

    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) prev_sibling: NodeId,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, name: Name, value: NodeValue) -> Self {
        let occurrence = match kind {
            NodeKind::Root => None,
            NodeKind::Element => Some(Occurrence::exactly_one()),
            NodeKind::Text | NodeKind::ProcInst | NodeKind::Callback => Some(Occurrence::optional()),
        };
        Node {
            kind,
            name,
            value,
            occurrence,
            status: NodeStatus::default(),
            parent: None,
            first_child: None,
            next_sibling: None,
            prev_sibling: id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// `None` only for the root.
    pub fn occurrence(&self) -> Option<&Occurrence> {
        self.occurrence.as_ref()
    }

    pub(crate) fn occurrence_mut(&mut self) -> Option<&mut Occurrence> {
        self.occurrence.as_mut()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    /// Raw predecessor slot. For the head of a sibling list this is the
    /// tail, for an unattached node it is the node itself.
    pub fn prev_sibling(&self) -> NodeId {
        self.prev_sibling
    }

    /// Target of a processing-instruction node.
    pub fn target(&self) -> Option<&str> {
        match &self.value {
            NodeValue::ProcInst(pi) => Some(&pi.target),
            _ => None,
        }
    }

    pub fn callback(&self) -> Option<&Callback> {
        match &self.value {
            NodeValue::Callback(cb) => Some(cb),
            _ => None,
        }
    }

    #[inline]
    pub fn is_callback(&self) -> bool {
        self.kind == NodeKind::Callback
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }
}
