//! Namespace-aware document wrapper around an [`Element`] tree.
//!
//! The IDE's project files all use a default `xmlns` declaration on the
//! root element and no prefixes. The loader captures that declaration into
//! the document, the tree itself carries only local names, and the
//! serializer reapplies the namespace verbatim. Nothing here is
//! process-global: two documents with different namespaces can be written
//! back to back (or concurrently) without interfering.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::error::{Error, Result};
use crate::xml::Element;

/// An XML project file: filesystem location, default namespace, and the
/// in-memory element tree.
///
/// The namespace is constant for the lifetime of a loaded document.
/// Mutations happen in place on [`root`](Self::root); nothing is flushed
/// until [`write`](Self::write) is called.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    namespace: String,
    /// Root element of the tree.
    pub root: Element,
}

impl Document {
    /// Load a document from disk. Fails with [`Error::NotFound`] if the
    /// path does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Document> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let (namespace, root) = parse(&content, &path)?;
        Ok(Document {
            path,
            namespace,
            root,
        })
    }

    /// Create a document from a caller-supplied tree. Not written to disk
    /// until [`write`](Self::write) is called.
    pub fn new(path: impl Into<PathBuf>, namespace: impl Into<String>, root: Element) -> Document {
        Document {
            path: path.into(),
            namespace: namespace.into(),
            root,
        }
    }

    /// Filesystem location of this document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing this document.
    pub fn dir_path(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// The default namespace captured at load time, `""` if unnamespaced.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// First element reached by descending the given unqualified tag
    /// names from the root, searching all branches in document order.
    pub fn find(&self, segments: &[&str]) -> Option<&Element> {
        self.find_all(segments).into_iter().next()
    }

    /// All elements reached by the given path, in document order.
    pub fn find_all(&self, segments: &[&str]) -> Vec<&Element> {
        let mut current = vec![&self.root];
        for segment in segments {
            let mut next = Vec::new();
            for elem in current {
                next.extend(elem.children_named(segment));
            }
            current = next;
        }
        current
    }

    /// Mutable lookup descending the first matching child per segment.
    pub fn find_mut(&mut self, segments: &[&str]) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for segment in segments {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Serialize with an XML declaration and two-space recursive
    /// indentation. Non-whitespace text content is preserved inline;
    /// indentation whitespace is regenerated.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        write_element(&mut out, &self.root, Some(&self.namespace), 0);
        out
    }

    /// Write the document back to its path.
    pub fn write(&self) -> Result<()> {
        fs::write(&self.path, self.to_xml()).map_err(|e| Error::io(&self.path, e))
    }
}

fn parse(content: &str, path: &Path) -> Result<(String, Element)> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut namespace = String::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(|e| Error::xml(path, e))? {
            Event::Start(start) => {
                let elem = element_from_start(&start, stack.is_empty(), &mut namespace, path)?;
                stack.push(elem);
            }
            Event::Empty(start) => {
                let elem = element_from_start(&start, stack.is_empty(), &mut namespace, path)?;
                close_element(elem, &mut stack, &mut root);
            }
            Event::End(_) => {
                let elem = stack
                    .pop()
                    .ok_or_else(|| Error::structure(path, "unbalanced closing tag"))?;
                close_element(elem, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| Error::xml(path, e))?;
                if text.trim().is_empty() {
                    continue;
                }
                if let Some(parent) = stack.last_mut() {
                    match &mut parent.text {
                        Some(existing) => existing.push_str(&text),
                        None => parent.text = Some(text.into_owned()),
                    }
                }
            }
            Event::Eof => break,
            // Declarations, processing instructions (the IDE's version PI),
            // comments and doctypes are not part of the object model.
            _ => {}
        }
    }

    match root {
        Some(root) => Ok((namespace, root)),
        None => Err(Error::structure(path, "no root element")),
    }
}

fn element_from_start(
    start: &BytesStart<'_>,
    is_root: bool,
    namespace: &mut String,
    path: &Path,
) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut elem = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::xml(path, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::xml(path, e))?
            .into_owned();

        if is_root && key == "xmlns" {
            *namespace = value;
        } else {
            elem.attributes.push((key, value));
        }
    }

    Ok(elem)
}

fn close_element(elem: Element, stack: &mut Vec<Element>, root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.push(elem),
        None => *root = Some(elem),
    }
}

fn write_element(out: &mut String, elem: &Element, namespace: Option<&str>, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
    out.push('<');
    out.push_str(&elem.name);

    if let Some(ns) = namespace {
        if !ns.is_empty() {
            out.push_str(" xmlns=\"");
            out.push_str(&escape(ns));
            out.push('"');
        }
    }

    for (key, value) in &elem.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }

    let text = elem.text.as_deref().map(str::trim).filter(|t| !t.is_empty());
    if elem.children.is_empty() {
        match text {
            None => out.push_str(" />\n"),
            Some(text) => {
                out.push('>');
                out.push_str(&escape(text));
                out.push_str("</");
                out.push_str(&elem.name);
                out.push_str(">\n");
            }
        }
    } else {
        out.push('>');
        if let Some(text) = text {
            out.push_str(&escape(text));
        }
        out.push('\n');
        for child in &elem.children {
            write_element(out, child, None, level + 1);
        }
        for _ in 0..level {
            out.push_str("  ");
        }
        out.push_str("</");
        out.push_str(&elem.name);
        out.push_str(">\n");
    }
}
