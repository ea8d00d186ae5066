//! Target rich-text tree and its XML serialization.
use std::fmt::{self, Write};

use crate::types::{escape_attribute_into, escape_text_into};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkupTag {
    Section,
    Paragraph,
    Span,
    Run,
    Hyperlink,
    List,
    ListItem,
    Table,
    TableColumn,
    TableRowGroup,
    TableRow,
    TableCell,
    LineBreak,
    /// Caller-chosen document root such as `FlowDocument`.
    Document(String),
}

impl MarkupTag {
    pub fn as_str(&self) -> &str {
        match self {
            MarkupTag::Section => "Section",
            MarkupTag::Paragraph => "Paragraph",
            MarkupTag::Span => "Span",
            MarkupTag::Run => "Run",
            MarkupTag::Hyperlink => "Hyperlink",
            MarkupTag::List => "List",
            MarkupTag::ListItem => "ListItem",
            MarkupTag::Table => "Table",
            MarkupTag::TableColumn => "TableColumn",
            MarkupTag::TableRowGroup => "TableRowGroup",
            MarkupTag::TableRow => "TableRow",
            MarkupTag::TableCell => "TableCell",
            MarkupTag::LineBreak => "LineBreak",
            MarkupTag::Document(name) => name,
        }
    }

    /// Root tag for a caller-supplied name; the well-known names map to
    /// their own variants.
    pub fn from_root_name(name: &str) -> Self {
        match name {
            "Section" => MarkupTag::Section,
            "Span" => MarkupTag::Span,
            other => MarkupTag::Document(other.to_string()),
        }
    }
}

impl fmt::Display for MarkupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkupContent {
    Element(MarkupNode),
    Text(String),
}

#[derive(Clone, Debug)]
pub struct MarkupNode {
    pub tag: MarkupTag,
    /// Source order; setting an existing name replaces its value in place.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupContent>,
    /// Set on the node that was the inline parent of a fragment marker.
    pub(crate) fragment_mark: Option<u32>,
}

impl PartialEq for MarkupNode {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.attributes == other.attributes
            && self.children == other.children
    }
}

impl Eq for MarkupNode {}

impl MarkupNode {
    pub fn new(tag: MarkupTag) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            children: Vec::new(),
            fragment_mark: None,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn push_element(&mut self, node: MarkupNode) {
        self.children.push(MarkupContent::Element(node));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(MarkupContent::Text(text.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn has_element_children(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, MarkupContent::Element(_)))
    }

    pub fn elements(&self) -> impl Iterator<Item = &MarkupNode> {
        self.children.iter().filter_map(|child| match child {
            MarkupContent::Element(node) => Some(node),
            MarkupContent::Text(_) => None,
        })
    }

    pub fn text_value(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                MarkupContent::Element(node) => out.push_str(&node.text_value()),
                MarkupContent::Text(text) => out.push_str(text),
            }
        }
        out
    }

    /// Depth-first search for the node carrying `mark`, detaching it from
    /// its parent.
    pub(crate) fn take_marked(&mut self, mark: u32) -> Option<MarkupNode> {
        if self.fragment_mark == Some(mark) {
            return Some(std::mem::replace(self, MarkupNode::new(MarkupTag::Span)));
        }
        for child in &mut self.children {
            if let MarkupContent::Element(node) = child
                && let Some(found) = node.take_marked(mark)
            {
                return Some(found);
            }
        }
        None
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        let tag = self.tag.as_str();
        out.push('<');
        out.push_str(tag);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}=\"");
            escape_attribute_into(value, out);
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str(" />");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                MarkupContent::Element(node) => node.write_xml(out),
                MarkupContent::Text(text) => escape_text_into(text, out),
            }
        }
        let _ = write!(out, "</{tag}>");
    }
}
