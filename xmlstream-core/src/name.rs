//! Namespaced names.
//!
//! A [`Name`] is a namespace URI plus a local name, the same pair an XML
//! namespace-aware tokenizer reports for elements and attributes. Callback
//! nodes are identified by a small set of reserved names in the
//! [`XMLNS`] namespace, which no user schema element can collide with.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use phf::phf_set;

use crate::error::Error;

/// The XML namespace of this package. Scopes all reserved callback names.
pub const XMLNS: &str = "https://github.com/andaru/xmlstream";

/// Callback fired for every token read, before any kind-specific callback.
pub const CB_TOKENIZE: Name = Name::reserved("callback-tokenize");
/// Callback fired when the parent node is matched by a start tag.
pub const CB_START_ELEMENT: Name = Name::reserved("callback-start-element");
/// Callback fired when the parent element's end tag is seen.
pub const CB_END_ELEMENT: Name = Name::reserved("callback-end-element");
/// Callback fired when the parent text node is tokenized.
pub const CB_TEXT: Name = Name::reserved("callback-text");
/// Callback carrying a transition function to hand the machine off to.
pub const CB_HANDOFF: Name = Name::reserved("callback-handoff");
/// Hidden occurrence-tracking callback installed by the occurs options.
pub(crate) const CB_OCCURS: Name = Name::reserved("callback-start-element-occurs");

static RESERVED: phf::Set<&'static str> = phf_set! {
    "callback-tokenize",
    "callback-start-element",
    "callback-end-element",
    "callback-text",
    "callback-handoff",
    "callback-start-element-occurs",
};

/// A namespace URI and local name.
///
/// Displays in Clark notation: `{space}local`, or just `local` when the
/// namespace is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Name {
    pub space: Cow<'static, str>,
    pub local: Cow<'static, str>,
}

impl Name {
    pub fn new(space: impl Into<Cow<'static, str>>, local: impl Into<Cow<'static, str>>) -> Self {
        Name { space: space.into(), local: local.into() }
    }

    /// A name with no namespace.
    pub fn local(local: impl Into<Cow<'static, str>>) -> Self {
        Name { space: Cow::Borrowed(""), local: local.into() }
    }

    const fn reserved(local: &'static str) -> Self {
        Name { space: Cow::Borrowed(XMLNS), local: Cow::Borrowed(local) }
    }

    /// True when both namespace and local name are empty.
    pub fn is_empty(&self) -> bool {
        self.space.is_empty() && self.local.is_empty()
    }

    /// True for the reserved callback identities.
    pub fn is_reserved(&self) -> bool {
        self.space == XMLNS && RESERVED.contains(&*self.local)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.space.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.space, self.local)
        }
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(rest) = s.strip_prefix('{') else {
            return Ok(Name::local(s.to_owned()));
        };
        match memchr::memchr(b'}', rest.as_bytes()) {
            Some(end) => Ok(Name::new(rest[..end].to_owned(), rest[end + 1..].to_owned())),
            None => Err(Error::InvalidName(s.to_owned())),
        }
    }
}
