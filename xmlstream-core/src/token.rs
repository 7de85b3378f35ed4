//! Tokens - the input consumed by schema callbacks and transitions.
//!
//! Token values are owned, but callbacks only ever see them by reference:
//! a source is free to reuse whatever it handed out once the callback
//! returns, so anything kept past that point must be cloned.

use crate::error::Result;
use crate::name::Name;

/// An attribute on a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: Name,
    pub value: String,
}

/// Start tag: `<name attr="value">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    pub name: Name,
    /// Attributes in document order.
    pub attrs: Vec<Attr>,
}

/// End tag: `</name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement {
    pub name: Name,
}

/// Character data, with entities resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharData(pub String);

/// Processing instruction: `<?target inst?>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcInst {
    pub target: String,
    pub inst: String,
}

/// A single token from a token source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Start(StartElement),
    End(EndElement),
    CharData(CharData),
    ProcInst(ProcInst),
}

impl Token {
    /// Start tag with no attributes.
    pub fn start(name: Name) -> Self {
        Token::Start(StartElement { name, attrs: Vec::new() })
    }

    pub fn end(name: Name) -> Self {
        Token::End(EndElement { name })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Token::CharData(CharData(text.into()))
    }

    /// The element name for start and end tags.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Token::Start(start) => Some(&start.name),
            Token::End(end) => Some(&end.name),
            Token::CharData(_) | Token::ProcInst(_) => None,
        }
    }

    pub fn as_start(&self) -> Option<&StartElement> {
        match self {
            Token::Start(start) => Some(start),
            _ => None,
        }
    }

    #[inline]
    pub fn is_start(&self) -> bool {
        matches!(self, Token::Start(_))
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        matches!(self, Token::End(_))
    }
}

/// A stream of tokens, delivered one at a time on demand.
///
/// Returns `Err(Error::Eof)` once the input is exhausted. Any other error is
/// a failure of the source itself.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Token>;
}

impl<T: TokenSource + ?Sized> TokenSource for &mut T {
    fn next_token(&mut self) -> Result<Token> {
        (**self).next_token()
    }
}

/// Replays a fixed sequence of tokens, then reports end of input.
impl TokenSource for std::vec::IntoIter<Token> {
    fn next_token(&mut self) -> Result<Token> {
        self.next().ok_or(crate::error::Error::Eof)
    }
}
