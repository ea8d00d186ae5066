use std::fmt::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    OpeningTagStart,
    ClosingTagStart,
    TagEnd,
    EmptyTagEnd,
    EqualSign,
    Name,
    Atom,
    Text,
    Comment,
    EndOfStream,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Attribute list in source order. Names are lower-case and unique; the
/// first occurrence of a name wins.
pub type Attributes = Vec<(String, String)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element {
        name: String,
        attributes: Attributes,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl Node {
    pub fn element(name: impl Into<String>, attributes: Attributes, children: Vec<Node>) -> Self {
        Node::Element {
            name: name.into(),
            attributes,
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    /// Lower-case tag name for elements, `None` for text and comments.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element_named(&self, target: &str) -> bool {
        self.name().is_some_and(|name| name.eq_ignore_ascii_case(target))
    }

    pub fn attribute(&self, attribute: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => get_attribute(attributes, attribute),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes. Comments do not count.
    pub fn text_value(&self) -> String {
        fn walk(node: &Node, out: &mut String) {
            match node {
                Node::Element { children, .. } => {
                    for child in children {
                        walk(child, out);
                    }
                }
                Node::Text { text } => out.push_str(text),
                Node::Comment { .. } => {}
            }
        }

        let mut out = String::new();
        walk(self, &mut out);
        out
    }

    /// Compact XML form of this subtree; its length is what pagination
    /// batches are measured in.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        write_xml(self, &mut out);
        out
    }
}

pub fn get_attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn write_xml(node: &Node, out: &mut String) {
    match node {
        Node::Element {
            name,
            attributes,
            children,
        } => {
            out.push('<');
            out.push_str(name);
            for (k, v) in attributes {
                let _ = write!(out, " {k}=\"");
                escape_attribute_into(v, out);
                out.push('"');
            }
            if children.is_empty() {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in children {
                write_xml(child, out);
            }
            let _ = write!(out, "</{name}>");
        }
        Node::Text { text } => escape_text_into(text, out),
        Node::Comment { text } => {
            let _ = write!(out, "<!--{text}-->");
        }
    }
}

pub(crate) fn escape_text_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

pub(crate) fn escape_attribute_into(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
