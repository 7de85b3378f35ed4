//! xmlstream Core
//!
//! Schema trees and a small state machine runtime for consuming streams of
//! XML tokens. A schema describes the expected shape of a document as a tree
//! of element, text and processing-instruction nodes, with callbacks attached
//! as reserved-name child nodes. Token consumption is driven by a chain of
//! transition functions.
//!
//! # Architecture
//!
//! - **name.rs** - Namespaced names and the reserved callback names
//! - **token.rs** - Owned token model and the `TokenSource` contract
//! - **tokenizer.rs** - quick-xml backed `TokenSource` (feature `quick-xml`)
//! - **occurs.rs** - Occurrence policy (min/max repeat counts)
//! - **node.rs** - Node record, node kinds, callbacks
//! - **tree.rs** - Arena and intrusive sibling-list operations
//! - **schema.rs** - Node constructors, options, occurrence tracking, dispatch
//! - **context.rs** - Cancellation and deadline context passed to transitions
//! - **machine.rs** - State machine runtime

pub mod context;
pub mod error;
pub mod machine;
pub mod name;
pub mod node;
pub mod occurs;
pub mod schema;
pub mod token;
#[cfg(feature = "quick-xml")]
pub mod tokenizer;
pub mod tree;

pub use context::{CancelHandle, Context};
pub use error::{Error, Result};
pub use machine::{bail_with_error, check_context, ignore_eof, StateFn, StateMachine};
pub use name::Name;
pub use node::{Callback, HandoffFn, Node, NodeId, NodeKind, NodeStatus, NodeValue, TokenCallback};
pub use occurs::{MaxOccurs, Occurrence};
pub use schema::{CallbackEvent, NodeOptions};
pub use token::{Attr, CharData, EndElement, ProcInst, StartElement, Token, TokenSource};
#[cfg(feature = "quick-xml")]
pub use tokenizer::{TokenizerConfig, XmlTokenizer};
pub use tree::{Children, ChildrenRev, Schema};
