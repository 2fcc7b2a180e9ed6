//! A small owned XML tree, read and written with quick-xml.
//!
//! Project files are rewritten structurally (elements added, removed and
//! re-ordered), which a streaming reader cannot do on its own. Whitespace-only
//! text is dropped on read and layout is regenerated on write.

use std::borrow::Cow;

use quick_xml::escape::partial_escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{format_err, ProjectError};

/// Indentation used for generated project files.
pub const INDENT_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written in the file.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder: set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Builder: append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn is(&self, local_name: &str) -> bool {
        self.local_name() == local_name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn remove_attribute(&mut self, key: &str) {
        self.attributes.retain(|(k, _)| k != key);
    }

    /// Concatenated text and CDATA content of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn insert(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, Node::Element(child));
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Direct child elements with the given local name.
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.is(local_name))
    }

    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(local_name))
    }

    /// Index in `children` of the first child element with the given local name.
    pub fn position_of(&self, local_name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.is(local_name)))
    }

    /// All descendant elements with the given local name, in document order.
    pub fn descendants(&self, local_name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_descendants(self, local_name, &mut found);
        found
    }

    /// Run `f` on every descendant element with the given local name.
    pub fn for_each_descendant_mut<F>(&mut self, local_name: &str, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        for child in self.elements_mut() {
            if child.is(local_name) {
                f(child);
            }
            child.for_each_descendant_mut(local_name, f);
        }
    }

    /// Remove every descendant element (at any depth) for which `remove`
    /// returns `true`.
    pub fn remove_descendants<F>(&mut self, remove: &mut F)
    where
        F: FnMut(&Element) -> bool,
    {
        self.children.retain(|n| match n {
            Node::Element(e) => !remove(e),
            _ => true,
        });
        for child in self.elements_mut() {
            child.remove_descendants(remove);
        }
    }

    /// Remove direct child elements with the given local name.
    pub fn remove_children(&mut self, local_name: &str) {
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if e.is(local_name)));
    }

    /// Deep copy with namespace prefixes and `xmlns` declarations removed.
    pub fn without_namespace(&self) -> Element {
        Element {
            name: self.local_name().to_owned(),
            attributes: self
                .attributes
                .iter()
                .filter(|(k, _)| k != "xmlns" && !k.starts_with("xmlns:"))
                .cloned()
                .collect(),
            children: self
                .children
                .iter()
                .map(|n| match n {
                    Node::Element(e) => Node::Element(e.without_namespace()),
                    other => other.clone(),
                })
                .collect(),
        }
    }
}

fn collect_descendants<'a>(element: &'a Element, local_name: &str, found: &mut Vec<&'a Element>) {
    for child in element.elements() {
        if child.is(local_name) {
            found.push(child);
        }
        collect_descendants(child, local_name, found);
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn parse(text: &str) -> Result<Self, ProjectError> {
        let mut reader = Reader::from_str(text);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event().map_err(format_err)? {
                Event::Start(e) => stack.push(element_from_start(&e)?),
                Event::Empty(e) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| format_err("unexpected closing tag"))?;
                    drop_layout_whitespace(&mut element);
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = t.unescape().map_err(format_err)?;
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Event::CData(c) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::CData(String::from_utf8_lossy(&c).into_owned()));
                    }
                }
                Event::Comment(c) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::Comment(String::from_utf8_lossy(&c).into_owned()));
                    }
                }
                Event::Eof => break,
                // Declaration, processing instructions and DOCTYPE are not
                // kept; `to_xml_string` writes its own declaration.
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(format_err(format!("unclosed element <{}>", open.name)));
        }
        root.map(Document::new)
            .ok_or_else(|| format_err("document has no root element"))
    }

    /// Serialize with [`INDENT_WIDTH`]-space indentation and `\n` line
    /// endings, optionally preceded by an XML declaration.
    pub fn to_xml_string(&self, with_declaration: bool) -> Result<String, ProjectError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);
        if with_declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
                .map_err(format_err)?;
        }
        write_element(&mut writer, &self.root)?;
        let mut text = String::from_utf8(writer.into_inner()).map_err(format_err)?;
        text.push('\n');
        Ok(text)
    }
}

/// Whitespace-only text next to child elements or comments is indentation;
/// text-only content is kept exactly as read.
fn drop_layout_whitespace(element: &mut Element) {
    let text_only = element
        .children
        .iter()
        .all(|n| matches!(n, Node::Text(_)));
    if !text_only {
        element
            .children
            .retain(|n| !matches!(n, Node::Text(t) if t.trim().is_empty()));
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, ProjectError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(format_err)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(format_err)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ProjectError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(format_err("document has more than one root element")),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), ProjectError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        let escaped = escape_attribute(value);
        start.push_attribute(Attribute::from((key.as_bytes(), escaped.as_bytes())));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(format_err);
    }

    writer.write_event(Event::Start(start)).map_err(format_err)?;
    let text_only = element.children.iter().all(|n| matches!(n, Node::Text(_)));
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) if !text_only && t.trim().is_empty() => {}
            Node::Text(t) => writer
                .write_event(Event::Text(BytesText::from_escaped(partial_escape(t.as_str()))))
                .map_err(format_err)?,
            Node::CData(c) => writer
                .write_event(Event::CData(BytesCData::new(c.as_str())))
                .map_err(format_err)?,
            Node::Comment(c) => writer
                .write_event(Event::Comment(BytesText::from_escaped(c.as_str())))
                .map_err(format_err)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(format_err)
}

/// Attribute values keep `'` readable (MSBuild conditions are full of them).
fn escape_attribute(value: &str) -> String {
    let escaped: Cow<'_, str> = partial_escape(value);
    escaped.replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
