//! XML document loading.
//!
//! Parses a Tableau XML artifact (.twb workbook or .tfl prep flow) into an
//! owned element tree the extractors can walk explicitly. Tableau metadata
//! lives entirely in attributes, so text nodes are not retained.
//!
//! Loading is all-or-nothing: a malformed document never yields a partial
//! tree. Missing optional substructure is the extractors' concern, not ours.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Document load failure. The only hard errors in the pipeline — everything
/// downstream degrades to empty collections instead of failing.
#[derive(Debug)]
pub enum DocumentError {
    NotFound(PathBuf),
    Malformed(String),
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::NotFound(path) => write!(f, "file not found: {}", path.display()),
            DocumentError::Malformed(e) => write!(f, "invalid XML: {}", e),
        }
    }
}

impl std::error::Error for DocumentError {}

/// A single XML element: tag, attributes, and child elements in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    /// Attribute value by name, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value as an owned string, empty when absent.
    pub fn attr_string(&self, name: &str) -> String {
        self.attr(name).unwrap_or_default().to_string()
    }

    /// All descendant elements in document (preorder) traversal, excluding self.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    /// All descendants with the given tag, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|e| e.tag == tag)
            .collect()
    }

    /// First descendant with the given tag, if any.
    pub fn find_first(&self, tag: &str) -> Option<&Element> {
        self.descendants().into_iter().find(|e| e.tag == tag)
    }
}

/// A loaded XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// Loads and parses the file at `path`.
    pub fn from_path(path: &Path) -> Result<Document, DocumentError> {
        let xml = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocumentError::NotFound(path.to_path_buf())
            } else {
                DocumentError::Malformed(e.to_string())
            }
        })?;
        Document::parse(&xml)
    }

    /// Parses a document from an XML string.
    pub fn parse(xml: &str) -> Result<Document, DocumentError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => stack.push(element_from(&e)?),
                Ok(Event::Empty(e)) => {
                    let el = element_from(&e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(el),
                        None if root.is_none() => root = Some(el),
                        None => {
                            return Err(DocumentError::Malformed(
                                "multiple root elements".to_string(),
                            ))
                        }
                    }
                }
                Ok(Event::End(_)) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| DocumentError::Malformed("unbalanced end tag".to_string()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(el),
                        None if root.is_none() => root = Some(el),
                        None => {
                            return Err(DocumentError::Malformed(
                                "multiple root elements".to_string(),
                            ))
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(DocumentError::Malformed(e.to_string())),
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(DocumentError::Malformed("unclosed element".to_string()));
        }
        match root {
            Some(root) => Ok(Document { root }),
            None => Err(DocumentError::Malformed("no root element".to_string())),
        }
    }
}

fn element_from(e: &BytesStart<'_>) -> Result<Element, DocumentError> {
    let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| DocumentError::Malformed(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| DocumentError::Malformed(e.to_string()))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        tag,
        attrs,
        children: Vec::new(),
    })
}
