//! [`TokenSource`] over quick-xml's namespace-aware reader.
//!
//! Element and attribute names are resolved to their namespace URI.
//! Empty elements (`<a/>`) are reported as a start tag followed by an end
//! tag, CDATA sections as character data, and the XML declaration as a
//! processing instruction with target `xml`. Comments and DOCTYPE
//! declarations are skipped, as are `xmlns` attributes.

use log::trace;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::{Error, Result};
use crate::name::Name;
use crate::token::{Attr, CharData, EndElement, ProcInst, StartElement, Token, TokenSource};

/// Tokenizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Trim whitespace around character data, dropping whitespace-only
    /// text entirely.
    pub trim_text: bool,
    /// Reject end tags that do not match the open start tag.
    pub check_end_names: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig { trim_text: false, check_end_names: true }
    }
}

/// Streams tokens out of an XML document held in memory.
pub struct XmlTokenizer<'i> {
    reader: NsReader<&'i [u8]>,
}

impl<'i> XmlTokenizer<'i> {
    pub fn new(input: &'i str) -> Self {
        Self::with_config(input, TokenizerConfig::default())
    }

    pub fn with_config(input: &'i str, config: TokenizerConfig) -> Self {
        let mut reader = NsReader::from_str(input);
        let cfg = reader.config_mut();
        cfg.trim_text(config.trim_text);
        cfg.check_end_names = config.check_end_names;
        cfg.expand_empty_elements = true;
        XmlTokenizer { reader }
    }

    fn syntax_error(&self, message: impl Into<String>) -> Error {
        Error::Syntax { position: self.reader.buffer_position() as u64, message: message.into() }
    }

    fn unknown_prefix(&self, prefix: String) -> Error {
        self.syntax_error(format!("unknown namespace prefix {:?}", prefix))
    }

    fn start_element(&self, space: String, start: &BytesStart<'_>) -> Result<StartElement> {
        let local = std::str::from_utf8(start.local_name().as_ref())?.to_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.syntax_error(e.to_string()))?;
            let key = attr.key;
            if key.as_ref() == b"xmlns" || key.prefix().is_some_and(|p| p.as_ref() == b"xmlns") {
                continue;
            }
            let (resolve, attr_local) = self.reader.resolve_attribute(key);
            let attr_space = namespace_uri(resolve).map_err(|prefix| self.unknown_prefix(prefix))?;
            let attr_local = std::str::from_utf8(attr_local.as_ref())?.to_owned();
            let value = attr.unescape_value().map_err(|e| self.syntax_error(e.to_string()))?;
            attrs.push(Attr { name: Name::new(attr_space, attr_local), value: value.into_owned() });
        }
        Ok(StartElement { name: Name::new(space, local), attrs })
    }

    fn declaration(&self, decl: &BytesDecl<'_>) -> Result<ProcInst> {
        let version = decl.version().map_err(|e| self.syntax_error(e.to_string()))?;
        let mut inst = format!("version=\"{}\"", std::str::from_utf8(&version)?);
        if let Some(encoding) = decl.encoding() {
            let encoding = encoding.map_err(|e| self.syntax_error(e.to_string()))?;
            inst.push_str(&format!(" encoding=\"{}\"", std::str::from_utf8(&encoding)?));
        }
        if let Some(standalone) = decl.standalone() {
            let standalone = standalone.map_err(|e| self.syntax_error(e.to_string()))?;
            inst.push_str(&format!(" standalone=\"{}\"", std::str::from_utf8(&standalone)?));
        }
        Ok(ProcInst { target: "xml".to_owned(), inst })
    }
}

impl TokenSource for XmlTokenizer<'_> {
    fn next_token(&mut self) -> Result<Token> {
        loop {
            let read = self.reader.read_resolved_event().map_err(|e| e.to_string());
            let (resolve, event) = match read {
                Ok(read) => read,
                Err(message) => return Err(self.syntax_error(message)),
            };
            let space = match namespace_uri(resolve) {
                Ok(space) => space,
                Err(prefix) => return Err(self.unknown_prefix(prefix)),
            };
            let token = match event {
                Event::Start(start) | Event::Empty(start) => Token::Start(self.start_element(space, &start)?),
                Event::End(end) => {
                    let local = std::str::from_utf8(end.local_name().as_ref())?.to_owned();
                    Token::End(EndElement { name: Name::new(space, local) })
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| self.syntax_error(e.to_string()))?;
                    Token::CharData(CharData(text.into_owned()))
                }
                Event::CData(cdata) => Token::CharData(CharData(std::str::from_utf8(&cdata)?.to_owned())),
                Event::PI(pi) => Token::ProcInst(ProcInst {
                    target: std::str::from_utf8(pi.target())?.to_owned(),
                    inst: std::str::from_utf8(pi.content())?.trim_start().to_owned(),
                }),
                Event::Decl(decl) => Token::ProcInst(self.declaration(&decl)?),
                Event::Comment(_) | Event::DocType(_) => continue,
                Event::Eof => return Err(Error::Eof),
            };
            trace!("token: {:?}", token);
            return Ok(token);
        }
    }
}

/// The namespace URI of a resolved name, or the unknown prefix.
fn namespace_uri(resolve: ResolveResult<'_>) -> std::result::Result<String, String> {
    match resolve {
        ResolveResult::Bound(ns) => Ok(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => Ok(String::new()),
        ResolveResult::Unknown(prefix) => Err(String::from_utf8_lossy(&prefix).into_owned()),
    }
}
