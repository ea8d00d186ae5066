use std::fmt::Write;
use std::ops::{Deref, DerefMut};

use crate::markup::{MarkupContent, MarkupNode};
use crate::types::Node;

const STEP: &str = "  ";
const PREVIEW_LEN: usize = 40;

/// Indented line collector with a node budget.
struct Outline {
    lines: Vec<String>,
    indent: String,
    budget: usize,
}

/// Restores the outline's indent when the nested scope ends.
struct Nested<'a> {
    outline: &'a mut Outline,
}

impl Deref for Nested<'_> {
    type Target = Outline;

    fn deref(&self) -> &Outline {
        &*self.outline
    }
}

impl DerefMut for Nested<'_> {
    fn deref_mut(&mut self) -> &mut Outline {
        &mut *self.outline
    }
}

impl Drop for Nested<'_> {
    fn drop(&mut self) {
        let depth = self.outline.indent.len().saturating_sub(STEP.len());
        self.outline.indent.truncate(depth);
    }
}

impl Outline {
    fn new(budget: usize) -> Self {
        Self {
            lines: Vec::new(),
            indent: String::new(),
            budget,
        }
    }

    /// Takes one node from the budget; `false` once it is exhausted.
    fn take(&mut self) -> bool {
        if self.budget == 0 {
            return false;
        }
        self.budget -= 1;
        true
    }

    fn nested(&mut self) -> Nested<'_> {
        self.indent.push_str(STEP);
        Nested { outline: self }
    }

    fn emit(&mut self, body: impl FnOnce(&mut String)) {
        let mut line = self.indent.clone();
        body(&mut line);
        self.lines.push(line);
    }

    fn open_tag<'a>(&mut self, name: &str, attributes: impl Iterator<Item = (&'a String, &'a String)>) {
        self.emit(|line| {
            let _ = write!(line, "<{name}");
            for (key, value) in attributes {
                let _ = write!(line, " {key}=\"{value}\"");
            }
            line.push('>');
        });
    }

    fn text(&mut self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        self.emit(|line| {
            line.push('"');
            preview_into(line, trimmed);
            line.push('"');
        });
    }
}

fn preview_into(line: &mut String, text: &str) {
    line.extend(
        text.chars()
            .take(PREVIEW_LEN)
            .map(|ch| if ch == '\n' { ' ' } else { ch }),
    );
    if text.chars().nth(PREVIEW_LEN).is_some() {
        line.push('…');
    }
}

/// One line per node of the parsed tree, at most `cap` nodes.
pub fn outline_from_dom(root: &Node, cap: usize) -> Vec<String> {
    fn visit(outline: &mut Outline, node: &Node) {
        if !outline.take() {
            return;
        }
        match node {
            Node::Element {
                name,
                attributes,
                children,
            } => {
                outline.open_tag(name, attributes.iter().map(|(k, v)| (k, v)));
                let mut scope = outline.nested();
                for child in children {
                    visit(&mut scope, child);
                }
            }
            Node::Text { text } => outline.text(text),
            Node::Comment { text } => outline.emit(|line| {
                line.push_str("<!-- ");
                preview_into(line, text);
                line.push_str(" -->");
            }),
        }
    }

    let mut outline = Outline::new(cap);
    visit(&mut outline, root);
    outline.lines
}

/// One line per node of the converted tree, at most `cap` nodes.
pub fn outline_from_markup(root: &MarkupNode, cap: usize) -> Vec<String> {
    fn visit(outline: &mut Outline, node: &MarkupNode) {
        if !outline.take() {
            return;
        }
        outline.open_tag(node.tag.as_str(), node.attributes.iter().map(|(k, v)| (k, v)));
        let mut scope = outline.nested();
        for child in &node.children {
            match child {
                MarkupContent::Element(element) => visit(&mut scope, element),
                MarkupContent::Text(text) => {
                    if scope.take() {
                        scope.text(text);
                    }
                }
            }
        }
    }

    let mut outline = Outline::new(cap);
    visit(&mut outline, root);
    outline.lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::parser::parse_html;
    use crate::transform::convert_html_to_tree;

    #[test]
    fn dom_outline_indents_children() {
        let root = parse_html("<div class=a>hi<!--StartFragment--><b>x</b></div>").expect("parse");
        assert_eq!(
            outline_from_dom(&root, 100),
            vec![
                "<html>",
                "  <div class=\"a\">",
                "    \"hi\"",
                "    <!-- StartFragment -->",
                "    <b>",
                "      \"x\"",
            ]
        );
    }

    #[test]
    fn markup_outline_respects_cap() {
        let config = ConverterConfig::default().with_namespace(None);
        let tree = convert_html_to_tree("<p>one</p><p>two</p>", &config).expect("conversion");
        let lines = outline_from_markup(&tree, 3);
        assert_eq!(
            lines,
            vec![
                "<FlowDocument xml:space=\"preserve\">",
                "  <Paragraph>",
                "    \"one\"",
            ]
        );
    }

    #[test]
    fn previews_are_truncated() {
        let long = "x".repeat(60);
        let root = Node::element("p", Vec::new(), vec![Node::text(long)]);
        let lines = outline_from_dom(&root, 10);
        assert_eq!(lines[1], format!("  \"{}…\"", "x".repeat(40)));
    }
}
