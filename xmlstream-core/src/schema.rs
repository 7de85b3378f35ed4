//! Schema construction: node constructors, options, occurrence tracking and
//! callback dispatch.
//!
//! # Example
//!
//! ```
//! use xmlstream_core::{MaxOccurs, Name, NodeOptions, Schema};
//!
//! let mut schema = Schema::new();
//! let root = schema.root();
//! let item = schema.element(
//!     Name::local("item"),
//!     NodeOptions::new().min_occurs(0).max_occurs(MaxOccurs::Unbounded),
//! );
//! schema.append(root, item);
//! let on_end = schema.end_element_event(
//!     |_ctx, node, _token| println!("</{}> seen {} times", node.name(), node.status.occurs),
//!     NodeOptions::new(),
//! );
//! schema.append(item, on_end);
//! assert_eq!(schema.children(item).count(), 2);
//! ```

use std::sync::Arc;

use log::{debug, trace};

use crate::context::Context;
use crate::machine::{StateFn, StateMachine};
use crate::name::{Name, CB_END_ELEMENT, CB_HANDOFF, CB_OCCURS, CB_START_ELEMENT, CB_TEXT, CB_TOKENIZE};
use crate::node::{Callback, Node, NodeId, NodeKind, NodeValue, TokenCallback};
use crate::occurs::MaxOccurs;
use crate::token::{ProcInst, Token};
use crate::tree::Schema;

/// Options applied to a node at construction.
///
/// Each setter overrides any earlier value for the same field. Setting
/// either occurrence bound also installs the hidden occurrence-tracking
/// callback under the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeOptions {
    min_occurs: Option<u32>,
    max_occurs: Option<MaxOccurs>,
    parent: Option<NodeId>,
}

impl NodeOptions {
    pub fn new() -> Self {
        NodeOptions::default()
    }

    /// Minimum number of times the node must appear. 0 makes it optional.
    pub fn min_occurs(mut self, n: u32) -> Self {
        self.min_occurs = Some(n);
        self
    }

    /// Maximum number of times the node may appear.
    pub fn max_occurs(mut self, max: impl Into<MaxOccurs>) -> Self {
        self.max_occurs = Some(max.into());
        self
    }

    /// Set the parent link at construction time without attaching the node.
    /// Any later structural edit overwrites it.
    pub fn parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// The events callback nodes can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackEvent {
    /// Any token read, before kind-specific callbacks.
    Tokenize,
    /// The node was matched by a start tag. Fires the occurrence tracker
    /// as well as user start-element callbacks.
    StartElement,
    /// The node's end tag was seen.
    EndElement,
    /// The text node was matched by character data.
    Text,
}

impl CallbackEvent {
    /// Whether a callback node named `name` fires for this event.
    pub fn matches(self, name: &Name) -> bool {
        match self {
            CallbackEvent::Tokenize => *name == CB_TOKENIZE,
            CallbackEvent::StartElement => *name == CB_OCCURS || *name == CB_START_ELEMENT,
            CallbackEvent::EndElement => *name == CB_END_ELEMENT,
            CallbackEvent::Text => *name == CB_TEXT,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl Schema {
    /// A new schema: a root whose sole child is an optional `xml`
    /// processing-instruction node standing in for the XML declaration.
    ///
    /// The root takes no options. It has no occurrence bounds and no parent.
    pub fn new() -> Self {
        let mut schema = Schema::bare();
        let root = schema.root();
        let decl = schema.proc_inst("xml", NodeOptions::new().min_occurs(0).max_occurs(1));
        schema.append(root, decl);
        schema
    }

    /// Element matcher. Defaults to exactly one occurrence.
    pub fn element(&mut self, name: Name, options: NodeOptions) -> NodeId {
        let id = self.alloc(NodeKind::Element, name, NodeValue::None);
        self.apply(id, options)
    }

    /// Text (character data) matcher.
    pub fn text(&mut self, options: NodeOptions) -> NodeId {
        let id = self.alloc(NodeKind::Text, Name::default(), NodeValue::None);
        self.apply(id, options)
    }

    /// Processing-instruction matcher for `target`.
    pub fn proc_inst(&mut self, target: impl Into<String>, options: NodeOptions) -> NodeId {
        let value = NodeValue::ProcInst(ProcInst { target: target.into(), inst: String::new() });
        let id = self.alloc(NodeKind::ProcInst, Name::default(), value);
        self.apply(id, options)
    }

    /// Callback node with an arbitrary name.
    pub fn callback<F>(&mut self, name: Name, f: F, options: NodeOptions) -> NodeId
    where
        F: Fn(&Context, &mut Node, &Token) + Send + Sync + 'static,
    {
        let cb: TokenCallback = Arc::new(f);
        let id = self.alloc(NodeKind::Callback, name, NodeValue::Callback(Callback::Token(cb)));
        self.apply(id, options)
    }

    /// Callback fired for every token, before any node-specific callback.
    pub fn token_event<F>(&mut self, f: F, options: NodeOptions) -> NodeId
    where
        F: Fn(&Context, &mut Node, &Token) + Send + Sync + 'static,
    {
        self.callback(CB_TOKENIZE, f, options)
    }

    /// Callback fired when its parent is matched by a start tag.
    pub fn start_element_event<F>(&mut self, f: F, options: NodeOptions) -> NodeId
    where
        F: Fn(&Context, &mut Node, &Token) + Send + Sync + 'static,
    {
        self.callback(CB_START_ELEMENT, f, options)
    }

    /// Callback fired when its parent's end tag is seen.
    pub fn end_element_event<F>(&mut self, f: F, options: NodeOptions) -> NodeId
    where
        F: Fn(&Context, &mut Node, &Token) + Send + Sync + 'static,
    {
        self.callback(CB_END_ELEMENT, f, options)
    }

    /// Callback fired when its parent text node is tokenized.
    pub fn text_event<F>(&mut self, f: F, options: NodeOptions) -> NodeId
    where
        F: Fn(&Context, &mut Node, &Token) + Send + Sync + 'static,
    {
        self.callback(CB_TEXT, f, options)
    }

    /// Handoff callback: a transition the driving machine can switch to
    /// when the callback is found under the current node, before the next
    /// token is read. See [`Schema::handoff`].
    pub fn handoff_event<F>(&mut self, f: F, options: NodeOptions) -> NodeId
    where
        F: for<'a> Fn(&Context, &mut StateMachine<'a>) -> Option<StateFn<'a>> + Send + Sync + 'static,
    {
        let value = NodeValue::Callback(Callback::Handoff(Arc::new(f)));
        let id = self.alloc(NodeKind::Callback, CB_HANDOFF, value);
        self.apply(id, options)
    }

    fn apply(&mut self, id: NodeId, options: NodeOptions) -> NodeId {
        if let Some(min) = options.min_occurs {
            self.set_min_occurs(id, min);
        }
        if let Some(max) = options.max_occurs {
            self.set_max_occurs(id, max);
        }
        if let Some(parent) = options.parent {
            self[id].parent = Some(parent);
        }
        id
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::new()
    }
}

// ============================================================================
// Occurrence tracking
// ============================================================================

impl Schema {
    /// Set the minimum occurrence bound of `node` and make sure it has an
    /// occurrence-tracking callback. The root has no bounds and is left
    /// unchanged.
    pub fn set_min_occurs(&mut self, node: NodeId, min: u32) {
        let Some(occurrence) = self[node].occurrence_mut() else {
            return;
        };
        occurrence.min = min;
        self.ensure_occurs_tracker(node);
    }

    /// Set the maximum occurrence bound of `node` and make sure it has an
    /// occurrence-tracking callback. The root has no bounds and is left
    /// unchanged.
    pub fn set_max_occurs(&mut self, node: NodeId, max: impl Into<MaxOccurs>) {
        let Some(occurrence) = self[node].occurrence_mut() else {
            return;
        };
        occurrence.max = max.into();
        self.ensure_occurs_tracker(node);
    }

    /// The first callback child of `parent` named `name`.
    pub fn find_callback(&self, parent: NodeId, name: &Name) -> Option<NodeId> {
        self.children(parent).find(|&id| {
            let child = &self[id];
            child.is_callback() && child.name() == name
        })
    }

    fn ensure_occurs_tracker(&mut self, node: NodeId) {
        if self.find_callback(node, &CB_OCCURS).is_some() {
            return;
        }
        let cb: TokenCallback = Arc::new(track_occurrence);
        let tracker = self.alloc(NodeKind::Callback, CB_OCCURS, NodeValue::Callback(Callback::Token(cb)));
        self.append(node, tracker);
        debug!("installed occurrence tracker {:?} under {:?}", tracker, node);
    }
}

/// Count a start tag against the node and keep a copy of it; the token
/// itself belongs to the source.
fn track_occurrence(_ctx: &Context, node: &mut Node, token: &Token) {
    if let Token::Start(start) = token {
        node.status.occurs = node.status.occurs.saturating_add(1);
        node.status.last_start = Some(start.clone());
    }
}

// ============================================================================
// Dispatch
// ============================================================================

impl Schema {
    /// Invoke every token callback under `node` registered for `event`, in
    /// child order, passing `node` itself to each. Returns how many fired.
    ///
    /// The set of callbacks is fixed before the first one runs.
    pub fn dispatch(&mut self, ctx: &Context, node: NodeId, event: CallbackEvent, token: &Token) -> usize {
        let callbacks: Vec<TokenCallback> = self
            .children(node)
            .filter_map(|id| {
                let child = &self[id];
                if !child.is_callback() || !event.matches(child.name()) {
                    return None;
                }
                match child.callback() {
                    Some(Callback::Token(f)) => Some(Arc::clone(f)),
                    _ => None,
                }
            })
            .collect();

        let target = &mut self[node];
        for f in &callbacks {
            trace!("dispatch {:?} on {:?}", event, node);
            f(ctx, &mut *target, token);
        }
        callbacks.len()
    }

    /// A transition wrapping the first handoff callback under `node`.
    pub fn handoff<'a>(&self, node: NodeId) -> Option<StateFn<'a>> {
        let f = self.children(node).find_map(|id| {
            let child = &self[id];
            if !child.is_callback() || child.name() != &CB_HANDOFF {
                return None;
            }
            match child.callback() {
                Some(Callback::Handoff(f)) => Some(Arc::clone(f)),
                _ => None,
            }
        })?;
        debug!("handoff from {:?}", node);
        Some(StateFn::new(move |ctx, sm| f(ctx, sm)))
    }
}
