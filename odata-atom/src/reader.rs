//! A forward-only cursor of namespace-qualified XML events over quick-xml.
//!
//! The recursive parsers in this crate share one cursor: an inner parse
//! (an inline feed inside a link, say) fully consumes its own sub-document
//! before control returns to its caller. Self-closing elements are
//! normalized into a start/end pair so `<m:inline/>` and `<m:inline>
//! </m:inline>` take the same path.

use core::fmt;
use std::io::Cursor;

use quick_xml::NsReader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::Event;
use quick_xml::name::{LocalName, ResolveResult};

use crate::escaping::{escape_attr, escape_text};

/// XML reading error.
#[derive(Debug, Clone)]
pub enum XmlError {
    /// Error from quick-xml.
    Parse(String),
    /// Unexpected end of input.
    UnexpectedEof,
    /// A closing tag did not match the element being read.
    UnbalancedTags,
    /// Invalid UTF-8.
    InvalidUtf8(core::str::Utf8Error),
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlError::Parse(msg) => write!(f, "XML parse error: {}", msg),
            XmlError::UnexpectedEof => write!(f, "Unexpected end of XML"),
            XmlError::UnbalancedTags => write!(f, "Unbalanced XML tags"),
            XmlError::InvalidUtf8(e) => write!(f, "Invalid UTF-8 in XML: {}", e),
        }
    }
}

impl std::error::Error for XmlError {}

/// A qualified XML name with optional namespace URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    /// The namespace URI, or `None` for "no namespace".
    pub namespace: Option<String>,
    /// The local name (without prefix).
    pub local: String,
}

impl QName {
    /// Check against an expected namespace and local name.
    pub fn matches(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// An element start: qualified name plus namespace-resolved attributes.
#[derive(Debug, Clone)]
pub struct StartEl {
    /// The element name.
    pub name: QName,
    /// Attributes in document order, xmlns declarations excluded.
    pub attrs: Vec<(QName, String)>,
}

impl StartEl {
    /// An unprefixed (no-namespace) attribute value.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name.namespace.is_none() && name.local == local)
            .map(|(_, value)| value.as_str())
    }

    /// A namespace-qualified attribute value.
    pub fn attr_in(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name.matches(namespace, local))
            .map(|(_, value)| value.as_str())
    }

    /// Whether this element has the given qualified name.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.matches(namespace, local)
    }
}

/// A cursor event.
#[derive(Debug, Clone)]
pub enum XmlEvent {
    /// Element start.
    Start(StartEl),
    /// Element end.
    End(QName),
    /// Character data.
    Text(String),
}

/// The forward-only event cursor.
pub struct XmlEvents<'de> {
    reader: NsReader<Cursor<&'de [u8]>>,
    buf: Vec<u8>,
    /// Synthesized end for a self-closing element.
    pending_end: Option<QName>,
    /// Element nesting depth of the cursor position. Whitespace outside the
    /// root element is dropped; text inside elements is delivered untrimmed
    /// so entity references keep their surrounding spaces.
    depth: usize,
}

impl<'de> XmlEvents<'de> {
    /// Create a cursor over a document.
    pub fn new(input: &'de str) -> Self {
        let reader = NsReader::from_reader(Cursor::new(input.as_bytes()));
        Self {
            reader,
            buf: Vec::new(),
            pending_end: None,
            depth: 0,
        }
    }

    /// The next event, or `None` at end of document.
    pub fn next(&mut self) -> Result<Option<XmlEvent>, XmlError> {
        if let Some(name) = self.pending_end.take() {
            self.depth -= 1;
            return Ok(Some(XmlEvent::End(name)));
        }

        loop {
            self.buf.clear();
            let (resolve, event) = self
                .reader
                .read_resolved_event_into(&mut self.buf)
                .map_err(|e| XmlError::Parse(e.to_string()))?;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let name = qname(resolve, e.local_name())?;

                    let mut attrs = Vec::new();
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| XmlError::Parse(e.to_string()))?;

                        // Skip xmlns declarations (xmlns and xmlns:*)
                        let key = attr.key;
                        if key.as_ref() == b"xmlns" {
                            continue;
                        }
                        if let Some(prefix) = key.prefix()
                            && prefix.as_ref() == b"xmlns"
                        {
                            continue;
                        }

                        let (attr_resolve, _) = self.reader.resolver().resolve_attribute(key);
                        let attr_name = qname(attr_resolve, key.local_name())?;
                        let value = attr
                            .unescape_value()
                            .map_err(|e| XmlError::Parse(e.to_string()))?
                            .into_owned();
                        attrs.push((attr_name, value));
                    }

                    if is_empty {
                        self.pending_end = Some(name.clone());
                    }
                    self.depth += 1;
                    return Ok(Some(XmlEvent::Start(StartEl { name, attrs })));
                }
                Event::End(ref e) => {
                    let name = qname(resolve, e.local_name())?;
                    self.depth = self.depth.saturating_sub(1);
                    return Ok(Some(XmlEvent::End(name)));
                }
                Event::Text(e) => {
                    let text = e.decode().map_err(|e| XmlError::Parse(e.to_string()))?;
                    if self.depth == 0 && text.trim().is_empty() {
                        continue;
                    }
                    if !text.is_empty() {
                        return Ok(Some(XmlEvent::Text(text.into_owned())));
                    }
                }
                Event::CData(e) => {
                    let text =
                        core::str::from_utf8(e.as_ref()).map_err(XmlError::InvalidUtf8)?;
                    if !text.is_empty() {
                        return Ok(Some(XmlEvent::Text(text.to_string())));
                    }
                }
                Event::GeneralRef(e) => {
                    let raw = e.decode().map_err(|e| XmlError::Parse(e.to_string()))?;
                    return Ok(Some(XmlEvent::Text(resolve_entity(&raw)?)));
                }
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => return Ok(None),
            }
        }
    }

    /// The concatenated character data of the element just opened by
    /// `start`, consuming through its closing tag, with surrounding
    /// whitespace trimmed. Nested markup, if any, is consumed and dropped.
    pub fn element_text(&mut self, start: &StartEl) -> Result<String, XmlError> {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.next()?.ok_or(XmlError::UnexpectedEof)? {
                XmlEvent::Start(_) => depth += 1,
                XmlEvent::End(name) => {
                    if depth == 0 {
                        if name != start.name {
                            return Err(XmlError::UnbalancedTags);
                        }
                        return Ok(text.trim().to_string());
                    }
                    depth -= 1;
                }
                XmlEvent::Text(t) => {
                    if depth == 0 {
                        text.push_str(&t);
                    }
                }
            }
        }
    }

    /// The inner markup of the element just opened by `start`, re-rendered
    /// as text, consuming through its closing tag. Namespace prefixes are
    /// not preserved; element and attribute local names are.
    pub fn inner_xml(&mut self, start: &StartEl) -> Result<String, XmlError> {
        let mut out = String::new();
        let mut depth = 0usize;
        loop {
            match self.next()?.ok_or(XmlError::UnexpectedEof)? {
                XmlEvent::Start(child) => {
                    depth += 1;
                    out.push('<');
                    out.push_str(&child.name.local);
                    for (name, value) in &child.attrs {
                        out.push(' ');
                        out.push_str(&name.local);
                        out.push_str("=\"");
                        out.push_str(&escape_attr(value));
                        out.push('"');
                    }
                    out.push('>');
                }
                XmlEvent::End(name) => {
                    if depth == 0 {
                        if name != start.name {
                            return Err(XmlError::UnbalancedTags);
                        }
                        return Ok(out);
                    }
                    depth -= 1;
                    out.push_str("</");
                    out.push_str(&name.local);
                    out.push('>');
                }
                XmlEvent::Text(t) => {
                    out.push_str(&escape_text(&t));
                }
            }
        }
    }

    /// Consume through the closing tag of the element just opened by
    /// `start`, dropping everything inside.
    pub fn skip_element(&mut self, start: &StartEl) -> Result<(), XmlError> {
        let mut depth = 0usize;
        loop {
            match self.next()?.ok_or(XmlError::UnexpectedEof)? {
                XmlEvent::Start(_) => depth += 1,
                XmlEvent::End(name) => {
                    if depth == 0 {
                        if name != start.name {
                            return Err(XmlError::UnbalancedTags);
                        }
                        return Ok(());
                    }
                    depth -= 1;
                }
                XmlEvent::Text(_) => {}
            }
        }
    }
}

fn qname(resolve: ResolveResult<'_>, local: LocalName<'_>) -> Result<QName, XmlError> {
    let namespace = resolve_namespace(resolve)?;
    let local = core::str::from_utf8(local.as_ref())
        .map_err(XmlError::InvalidUtf8)?
        .to_string();
    Ok(QName { namespace, local })
}

/// Resolve a namespace from quick-xml's ResolveResult.
fn resolve_namespace(resolve: ResolveResult<'_>) -> Result<Option<String>, XmlError> {
    match resolve {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(_) => Ok(None),
    }
}

/// Resolve a general entity reference.
fn resolve_entity(raw: &str) -> Result<String, XmlError> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.into());
    }

    if let Some(rest) = raw.strip_prefix('#') {
        let code = if let Some(hex) = rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            u32::from_str_radix(hex, 16)
                .map_err(|_| XmlError::Parse(format!("Invalid hex entity: #{}", rest)))?
        } else {
            rest.parse::<u32>()
                .map_err(|_| XmlError::Parse(format!("Invalid decimal entity: #{}", rest)))?
        };

        let ch = char::from_u32(code)
            .ok_or_else(|| XmlError::Parse(format!("Invalid Unicode: {}", code)))?;
        return Ok(ch.to_string());
    }

    Ok(format!("&{};", raw))
}
