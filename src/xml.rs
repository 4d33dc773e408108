//! Owned XML tree used on both device surfaces
//!
//! Response bodies and notification frames are parsed with `roxmltree` and
//! copied into an owned [`XmlElement`] so they can outlive the input buffer,
//! be cached, and be handed to listeners on another task. Request bodies are
//! built with the same type and rendered with [`XmlElement::to_xml_string`].

use crate::error::{Result, SoundTouchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An XML element with its attributes, text and child elements
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlElement>,
}

/// Construct a value from an XML tree
pub trait FromXml: Sized {
    fn from_xml(element: &XmlElement) -> Result<Self>;
}

/// Emit a value as an XML tree for use as a request body
pub trait ToXml {
    fn to_xml(&self) -> XmlElement;
}

/// Anything that can be sent as a request body
///
/// Types implementing [`ToXml`] are rendered from their tree; plain strings are
/// sent as already-serialized text.
pub trait RequestBody {
    fn to_body(&self) -> String;
}

impl<T: ToXml> RequestBody for T {
    fn to_body(&self) -> String {
        self.to_xml().to_xml_string()
    }
}

impl RequestBody for str {
    fn to_body(&self) -> String {
        self.to_owned()
    }
}

impl RequestBody for String {
    fn to_body(&self) -> String {
        self.clone()
    }
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)?;
        Ok(Self::from_node(doc.root_element()))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let children: Vec<XmlElement> = node
            .children()
            .filter(|n| n.is_element())
            .map(Self::from_node)
            .collect();

        // whitespace between child elements is formatting, not content
        let text = node
            .text()
            .filter(|t| children.is_empty() || !t.trim().is_empty())
            .map(str::to_owned);

        Self {
            name: node.tag_name().name().to_owned(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_owned(), a.value().to_owned()))
                .collect(),
            text,
            children,
        }
    }

    // ========== Builders ==========

    pub fn with_attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Adds the attribute only when a value is present
    pub fn with_opt_attr<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with_attr(name, v),
            None => self,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Appends `<name>text</name>`
    pub fn with_text_child(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_child(XmlElement::new(name).with_text(text))
    }

    /// Appends `<name>text</name>` only when a value is present
    pub fn with_opt_text_child(self, name: impl Into<String>, text: Option<&str>) -> Self {
        match text {
            Some(t) => self.with_text_child(name, t),
            None => self,
        }
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    // ========== Accessors ==========

    /// Tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parses an attribute, falling back to `default` when absent or malformed
    pub fn attr_or<T: FromStr>(&self, name: &str, default: T) -> T {
        self.attr(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// True when the attribute is present and equals `true`
    pub fn attr_bool(&self, name: &str) -> bool {
        self.attr(name).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// First direct child with the given tag
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given tag
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Descendant addressed by a `/`-separated path of tag names
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        path.split('/')
            .filter(|p| !p.is_empty() && *p != ".")
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Text of the descendant at `path`
    pub fn find_text(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(|e| e.text())
    }

    /// Owned text of the descendant at `path`
    pub fn find_string(&self, path: &str) -> Option<String> {
        self.find_text(path).map(str::to_owned)
    }

    /// Parses the text of the descendant at `path`, falling back to `default`
    pub fn find_or<T: FromStr>(&self, path: &str, default: T) -> T {
        self.find_text(path)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// True when the descendant at `path` exists and its text is `true`.
    ///
    /// An element that is present but empty (`<skipEnabled/>`) also counts as
    /// true, which is how the device flags capabilities on now-playing status.
    pub fn find_flag(&self, path: &str) -> bool {
        match self.find(path) {
            Some(e) => e
                .text()
                .map_or(true, |t| t.trim().is_empty() || t.trim().eq_ignore_ascii_case("true")),
            None => false,
        }
    }

    /// Like [`find_flag`](Self::find_flag) but an empty element counts as false
    pub fn find_bool(&self, path: &str) -> bool {
        self.find_text(path)
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("true"))
    }

    /// Errors with `InvalidResponse` unless the tag matches
    pub fn expect_name(&self, name: &str) -> Result<()> {
        if self.name == name {
            Ok(())
        } else {
            Err(SoundTouchError::InvalidResponse(format!(
                "expected <{}> element, got <{}>",
                name, self.name
            )))
        }
    }

    // ========== Rendering ==========

    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attributes {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            escape_into(v, out, true);
            out.push('"');
        }
        if self.text.is_none() && self.children.is_empty() {
            out.push_str(" />");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            escape_into(text, out, false);
        }
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

impl FromStr for XmlElement {
    type Err = SoundTouchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn escape_into(value: &str, out: &mut String, attribute: bool) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if attribute => out.push_str("&#10;"),
            _ => out.push(c),
        }
    }
}
