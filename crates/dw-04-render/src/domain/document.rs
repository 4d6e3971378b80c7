//! # Document Model
//!
//! A small element tree standing in for the page DOM. Markup fragments
//! produced by templates are parsed into it when appended, so the refresh
//! routines can find `.timestamp`, `.avatar`, `.nickname` and `A` elements
//! inside rendered messages.
//!
//! Only well-formed markup is accepted: every element is closed, except
//! void elements (`img`, `br`, `input`, ...). Text and attribute values are
//! kept verbatim.

use std::fmt::{self, Write as _};

use super::errors::RenderError;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// A node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element.
    Element(Element),
    /// Raw text between tags.
    Text(String),
}

/// An element with attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element. Tag names are lower-cased.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attribute`].
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder form of [`Element::set_text`].
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    /// Builder: append a child element.
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Tag name, lower case.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove an attribute. Returns its old value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attributes
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.attributes.remove(pos).1)
    }

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// True if `class` lists `name`.
    pub fn has_class(&self, name: &str) -> bool {
        self.attribute("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == name))
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(text.to_string())];
    }

    /// Child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Markup of the children.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            // Writing to a String cannot fail.
            let _ = write!(out, "{child}");
        }
        out
    }

    /// Parse `html` and append the resulting nodes.
    pub fn append_html(&mut self, html: &str) -> Result<(), RenderError> {
        let nodes = parse_fragment(html)?;
        self.children.extend(nodes);
        Ok(())
    }

    fn visit_mut<F: FnMut(&mut Element)>(&mut self, f: &mut F) {
        f(&mut *self);
        for child in &mut self.children {
            if let Node::Element(e) = child {
                e.visit_mut(f);
            }
        }
    }

    fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| match child {
            Node::Element(e) => e.find_mut(pred),
            Node::Text(_) => None,
        })
    }

    fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            Node::Element(e) => e.find(pred),
            Node::Text(_) => None,
        })
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(t) => f.write_str(t),
            Node::Element(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            write!(f, " {name}=\"{value}\"")?;
        }
        f.write_str(">")?;
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return Ok(());
        }
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.tag)
    }
}

/// The page document: a `body` element and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    body: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document.
    pub fn new() -> Self {
        Self {
            body: Element::new("body"),
        }
    }

    /// Parse a document body from markup.
    pub fn parse(html: &str) -> Result<Self, RenderError> {
        let mut doc = Self::new();
        doc.body.append_html(html)?;
        Ok(doc)
    }

    /// The body element.
    pub fn body(&self) -> &Element {
        &self.body
    }

    /// Mutable body element.
    pub fn body_mut(&mut self) -> &mut Element {
        &mut self.body
    }

    /// First element with `id`.
    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        self.body.find(&|e: &Element| e.id() == Some(id))
    }

    /// First element with `id`, mutably.
    pub fn element_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.body.find_mut(&|e: &Element| e.id() == Some(id))
    }

    /// Call `f` on every element carrying class `name`, in document order.
    pub fn for_each_by_class<F: FnMut(&mut Element)>(&mut self, name: &str, mut f: F) {
        self.body.visit_mut(&mut |e| {
            if e.has_class(name) {
                f(e);
            }
        });
    }

    /// Call `f` on every element with tag `tag`, in document order.
    pub fn for_each_by_tag<F: FnMut(&mut Element)>(&mut self, tag: &str, mut f: F) {
        let tag = tag.to_ascii_lowercase();
        self.body.visit_mut(&mut |e| {
            if e.tag == tag {
                f(e);
            }
        });
    }

    /// Markup of the body's children.
    pub fn to_html(&self) -> String {
        self.body.inner_html()
    }
}

// =============================================================================
// Fragment parser
// =============================================================================

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

/// Parse a markup fragment into nodes.
pub fn parse_fragment(html: &str) -> Result<Vec<Node>, RenderError> {
    let mut parser = Parser { src: html, pos: 0 };
    let nodes = parser.nodes(None)?;
    Ok(nodes)
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, what: &str) -> RenderError {
        RenderError::Markup(format!("{what} at byte {}", self.pos))
    }

    fn nodes(&mut self, closing: Option<&str>) -> Result<Vec<Node>, RenderError> {
        let mut nodes = Vec::new();
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return match closing {
                    Some(tag) => Err(self.error(&format!("unclosed <{tag}>"))),
                    None => Ok(nodes),
                };
            }
            if let Some(after) = rest.strip_prefix("</") {
                let end = after.find('>').ok_or_else(|| self.error("unterminated end tag"))?;
                let tag = after[..end].trim().to_ascii_lowercase();
                return match closing {
                    Some(open) if open == tag => {
                        self.pos += 2 + end + 1;
                        Ok(nodes)
                    }
                    _ => Err(self.error(&format!("unexpected </{tag}>"))),
                };
            }
            if rest.starts_with("<!--") {
                let end = rest.find("-->").ok_or_else(|| self.error("unterminated comment"))?;
                self.pos += end + 3;
                continue;
            }
            if rest.starts_with('<') {
                nodes.push(Node::Element(self.element()?));
                continue;
            }
            let end = rest.find('<').unwrap_or(rest.len());
            nodes.push(Node::Text(rest[..end].to_string()));
            self.pos += end;
        }
    }

    fn element(&mut self) -> Result<Element, RenderError> {
        self.pos += 1;
        let rest = self.rest();
        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .ok_or_else(|| self.error("unterminated start tag"))?;
        if name_len == 0 {
            return Err(self.error("empty tag name"));
        }
        let mut element = Element::new(&rest[..name_len]);
        self.pos += name_len;

        let self_closing = self.attributes(&mut element)?;
        if self_closing || VOID_ELEMENTS.contains(&element.tag.as_str()) {
            return Ok(element);
        }
        let tag = element.tag.clone();
        element.children = self.nodes(Some(&tag))?;
        Ok(element)
    }

    /// Parse attributes up to `>`. Returns true for `/>`.
    fn attributes(&mut self, element: &mut Element) -> Result<bool, RenderError> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(true);
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok(false);
            }
            if rest.is_empty() {
                return Err(self.error("unterminated start tag"));
            }

            let name_len = rest
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .unwrap_or(rest.len());
            if name_len == 0 {
                return Err(self.error("bad attribute"));
            }
            let name = rest[..name_len].to_string();
            self.pos += name_len;
            self.skip_whitespace();

            if !self.rest().starts_with('=') {
                element.attributes.push((name, String::new()));
                continue;
            }
            self.pos += 1;
            self.skip_whitespace();
            let value = self.attribute_value()?;
            element.attributes.push((name, value));
        }
    }

    fn attribute_value(&mut self) -> Result<String, RenderError> {
        let rest = self.rest();
        let quote = rest.chars().next().ok_or_else(|| self.error("missing value"))?;
        if quote == '"' || quote == '\'' {
            let body = &rest[1..];
            let end = body
                .find(quote)
                .ok_or_else(|| self.error("unterminated attribute value"))?;
            self.pos += 1 + end + 1;
            return Ok(body[..end].to_string());
        }
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>')
            .unwrap_or(rest.len());
        self.pos += end;
        Ok(rest[..end].to_string())
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }
}
