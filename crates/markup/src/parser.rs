//! Error-tolerant HTML parser.
//!
//! Builds a well-formed tree under a synthetic `html` root from arbitrary
//! markup. Two stacks drive recovery:
//! - the open-element stack (innermost last, root at the bottom, never popped);
//! - the pending-inline list: inline element templates (name + attributes)
//!   not yet attached, ordered outer to inner. They are materialized right
//!   before text needs a parent, which is how formatting is carried across
//!   block boundaries and how overlapping inline tags become properly nested.
use crate::error::EngineInvariantError;
use crate::lexer::HtmlLexer;
use crate::schema::{
    closes_on_next_element_start, is_block_element, is_empty_element, is_inline_element,
    is_known_openable_element,
};
use crate::types::{Attributes, Node, TokenKind, get_attribute};

const ROOT_NAME: &str = "html";

/// Comments that survive parsing; they mark clipboard selection bounds.
const FRAGMENT_MARKERS: [&str; 2] = ["StartFragment", "EndFragment"];

pub fn parse_html(input: &str) -> Result<Node, EngineInvariantError> {
    HtmlParser::new(input)?.parse()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub max_open_depth: usize,
    /// Elements still open at end of stream (implicitly closed).
    pub unclosed_at_end: usize,
    /// Inline templates moved to the pending list by a block boundary or a
    /// mismatched end tag.
    pub carried_inlines: usize,
}

#[derive(Clone, Debug)]
struct InlineTemplate {
    name: String,
    attributes: Attributes,
}

pub struct HtmlParser<'a> {
    lexer: HtmlLexer<'a>,
    arena: NodeArena,
    open_elements: OpenElementsStack,
    pending_inlines: Vec<InlineTemplate>,
    carried_inlines: usize,
}

impl<'a> HtmlParser<'a> {
    pub fn new(input: &'a str) -> Result<Self, EngineInvariantError> {
        let mut lexer = HtmlLexer::new(input);
        lexer.next_content_token()?;
        Ok(Self {
            lexer,
            arena: NodeArena::new(),
            open_elements: OpenElementsStack::default(),
            pending_inlines: Vec::new(),
            carried_inlines: 0,
        })
    }

    pub fn parse(self) -> Result<Node, EngineInvariantError> {
        self.parse_with_stats().map(|(node, _)| node)
    }

    pub fn parse_with_stats(mut self) -> Result<(Node, ParseStats), EngineInvariantError> {
        let root = self.arena.push(ArenaNode::element(ROOT_NAME.to_string(), Vec::new()));
        self.open_elements.push(root);

        while self.lexer.token_kind() != TokenKind::EndOfStream {
            match self.lexer.token_kind() {
                TokenKind::OpeningTagStart => self.parse_opening_tag()?,
                TokenKind::ClosingTagStart => {
                    if self.lexer.next_tag_token()? == TokenKind::Name {
                        let name = self.lexer.token_text().to_lowercase();
                        // expected to be '>'
                        self.lexer.next_tag_token()?;
                        self.close_element(&name)?;
                    }
                }
                TokenKind::Text => {
                    if !self.lexer.token_text().is_empty() {
                        let text = self.lexer.token_text().to_string();
                        self.add_text(text)?;
                    }
                }
                TokenKind::Comment => self.add_comment()?,
                _ => {}
            }
            self.lexer.next_content_token()?;
        }

        let unclosed_at_end = self.open_elements.len().saturating_sub(1);
        if unclosed_at_end > 0 {
            log::trace!(
                target: "markup.parser",
                "end of stream closes {unclosed_at_end} open elements"
            );
        }
        self.open_elements.truncate(1);

        #[cfg(feature = "parser-invariants")]
        self.check_invariants(root)?;

        let stats = ParseStats {
            max_open_depth: self.open_elements.max_depth(),
            unclosed_at_end,
            carried_inlines: self.carried_inlines,
        };
        Ok((self.arena.into_dom(root)?, stats))
    }

    fn parse_opening_tag(&mut self) -> Result<(), EngineInvariantError> {
        if self.lexer.next_tag_token()? != TokenKind::Name {
            return Ok(());
        }
        let name = self.lexer.token_text().to_lowercase();
        self.lexer.next_tag_token()?;
        let attributes = self.parse_attributes()?;

        if self.lexer.token_kind() == TokenKind::EmptyTagEnd || is_empty_element(&name) {
            self.add_empty_element(name, attributes)
        } else if is_inline_element(&name) {
            log::trace!(target: "markup.parser", "pending inline <{name}>");
            self.pending_inlines.push(InlineTemplate { name, attributes });
            Ok(())
        } else if is_block_element(&name) || is_known_openable_element(&name) {
            self.open_structuring_element(name, attributes)
        } else {
            log::trace!(target: "markup.parser", "ignoring unknown element <{name}>");
            Ok(())
        }
    }

    fn parse_attributes(&mut self) -> Result<Attributes, EngineInvariantError> {
        let mut attributes = Attributes::new();
        while !matches!(
            self.lexer.token_kind(),
            TokenKind::EndOfStream | TokenKind::TagEnd | TokenKind::EmptyTagEnd
        ) {
            if self.lexer.token_kind() == TokenKind::Name {
                let name = self.lexer.token_text().to_lowercase();
                self.lexer.next_equal_sign_token()?;
                self.lexer.next_atom_token()?;
                if get_attribute(&attributes, &name).is_none() {
                    attributes.push((name, self.lexer.token_text().to_string()));
                }
            }
            self.lexer.next_tag_token()?;
        }
        Ok(attributes)
    }

    fn current_parent(&self) -> Result<usize, EngineInvariantError> {
        self.open_elements
            .current()
            .ok_or(EngineInvariantError::new("open element stack is empty"))
    }

    fn add_empty_element(
        &mut self,
        name: String,
        attributes: Attributes,
    ) -> Result<(), EngineInvariantError> {
        let parent = self.current_parent()?;
        self.arena
            .add_child(parent, ArenaNode::element(name, attributes));
        Ok(())
    }

    fn open_structuring_element(
        &mut self,
        name: String,
        attributes: Attributes,
    ) -> Result<(), EngineInvariantError> {
        if is_block_element(&name) {
            let mut carried = Vec::new();
            while self.open_elements.len() > 1 {
                let top = self.current_parent()?;
                if !is_inline_element(self.arena.name(top)) {
                    break;
                }
                self.open_elements.pop();
                carried.push(self.arena.template(top));
            }
            self.carry_over(carried, &name);
        }

        while self.open_elements.len() > 1 {
            let top = self.current_parent()?;
            if !closes_on_next_element_start(self.arena.name(top), &name) {
                break;
            }
            log::trace!(
                target: "markup.parser",
                "<{name}> implicitly closes <{}>",
                self.arena.name(top)
            );
            self.open_elements.pop();
        }

        let parent = self.current_parent()?;
        log::trace!(target: "markup.parser", "open <{name}>");
        let index = self
            .arena
            .add_child(parent, ArenaNode::element(name, attributes));
        self.open_elements.push(index);
        Ok(())
    }

    fn close_element(&mut self, name: &str) -> Result<(), EngineInvariantError> {
        if self
            .pending_inlines
            .last()
            .is_some_and(|template| template.name == name)
        {
            // opened and closed with nothing in between
            if let Some(template) = self.pending_inlines.pop() {
                let parent = self.current_parent()?;
                self.arena.add_child(
                    parent,
                    ArenaNode::element(template.name, template.attributes),
                );
            }
            return Ok(());
        }

        if !self
            .open_elements
            .iter()
            .any(|index| self.arena.name(index) == name)
        {
            log::trace!(target: "markup.parser", "ignoring stray </{name}>");
            return Ok(());
        }

        let mut carried = Vec::new();
        while self.open_elements.len() > 1 {
            let Some(top) = self.open_elements.pop() else {
                break;
            };
            if self.arena.name(top) == name {
                break;
            }
            if is_inline_element(self.arena.name(top)) {
                carried.push(self.arena.template(top));
            }
        }
        self.carry_over(carried, name);
        log::trace!(target: "markup.parser", "close <{name}>");
        Ok(())
    }

    /// `carried` is innermost first. Carried elements were opened before
    /// anything still pending, so they go underneath, outermost first.
    fn carry_over(&mut self, mut carried: Vec<InlineTemplate>, boundary: &str) {
        if carried.is_empty() {
            return;
        }
        log::trace!(
            target: "markup.parser",
            "carrying {} inline element(s) over <{boundary}>",
            carried.len()
        );
        self.carried_inlines += carried.len();
        carried.reverse();
        carried.append(&mut self.pending_inlines);
        self.pending_inlines = carried;
    }

    fn open_pending_inlines(&mut self) -> Result<(), EngineInvariantError> {
        for template in std::mem::take(&mut self.pending_inlines) {
            let parent = self.current_parent()?;
            let index = self.arena.add_child(
                parent,
                ArenaNode::element(template.name, template.attributes),
            );
            self.open_elements.push(index);
        }
        Ok(())
    }

    fn add_text(&mut self, text: String) -> Result<(), EngineInvariantError> {
        self.open_pending_inlines()?;
        let parent = self.current_parent()?;
        self.arena.add_child(parent, ArenaNode::Text { text });
        Ok(())
    }

    fn add_comment(&mut self) -> Result<(), EngineInvariantError> {
        let text = self.lexer.token_text().trim();
        if !FRAGMENT_MARKERS.contains(&text) {
            return Ok(());
        }
        let text = text.to_string();
        let parent = self.current_parent()?;
        self.arena.add_child(parent, ArenaNode::Comment { text });
        Ok(())
    }

    #[cfg(feature = "parser-invariants")]
    fn check_invariants(&self, root: usize) -> Result<(), EngineInvariantError> {
        if self.open_elements.len() != 1 || self.open_elements.current() != Some(root) {
            return Err(EngineInvariantError::new(
                "open element stack must hold only the root at end of stream",
            ));
        }
        let mut seen = vec![false; self.arena.nodes.len()];
        seen[root] = true;
        for (parent, node) in self.arena.nodes.iter().enumerate() {
            for &child in node.children().unwrap_or(&[]) {
                if child <= parent || seen[child] {
                    return Err(EngineInvariantError::new(
                        "arena node attached more than once or before its parent",
                    ));
                }
                seen[child] = true;
            }
        }
        if seen.iter().any(|attached| !attached) {
            return Err(EngineInvariantError::new("arena node left detached"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
struct OpenElementsStack {
    items: Vec<usize>,
    max_depth: usize,
}

impl OpenElementsStack {
    fn push(&mut self, index: usize) {
        self.items.push(index);
        self.max_depth = self.max_depth.max(self.items.len());
    }

    fn pop(&mut self) -> Option<usize> {
        self.items.pop()
    }

    fn current(&self) -> Option<usize> {
        self.items.last().copied()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Innermost first.
    fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().rev().copied()
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[derive(Debug)]
enum ArenaNode {
    Element {
        name: String,
        attributes: Attributes,
        children: Vec<usize>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl ArenaNode {
    fn element(name: String, attributes: Attributes) -> Self {
        ArenaNode::Element {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    fn children(&self) -> Option<&[usize]> {
        match self {
            ArenaNode::Element { children, .. } => Some(children),
            ArenaNode::Text { .. } | ArenaNode::Comment { .. } => None,
        }
    }
}

#[derive(Debug)]
struct NodeArena {
    nodes: Vec<ArenaNode>,
}

impl NodeArena {
    fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn push(&mut self, node: ArenaNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        index
    }

    /// Parents on the open stack are always elements; a text or comment
    /// parent leaves the child detached and the invariant check reports it.
    fn add_child(&mut self, parent_index: usize, child: ArenaNode) -> usize {
        let child_index = self.push(child);
        if let ArenaNode::Element { children, .. } = &mut self.nodes[parent_index] {
            children.push(child_index);
        }
        child_index
    }

    fn name(&self, index: usize) -> &str {
        match &self.nodes[index] {
            ArenaNode::Element { name, .. } => name,
            _ => "",
        }
    }

    /// Copy of an element without its children.
    fn template(&self, index: usize) -> InlineTemplate {
        match &self.nodes[index] {
            ArenaNode::Element {
                name, attributes, ..
            } => InlineTemplate {
                name: name.clone(),
                attributes: attributes.clone(),
            },
            _ => InlineTemplate {
                name: String::new(),
                attributes: Vec::new(),
            },
        }
    }

    fn into_dom(self, root_index: usize) -> Result<Node, EngineInvariantError> {
        let mut nodes = self.nodes;
        let mut built_nodes: Vec<Node> = Vec::with_capacity(nodes.len());

        fn take_children(
            n: usize,
            built: &mut Vec<Node>,
        ) -> Result<Vec<Node>, EngineInvariantError> {
            if built.len() < n {
                return Err(EngineInvariantError::new("arena child missing during build"));
            }
            Ok(built.split_off(built.len() - n))
        }

        // Iterative post-order: a node is visited once to schedule its
        // children, and again once they sit (in order) on top of
        // `built_nodes`.
        let mut stack: Vec<(usize, bool)> = vec![(root_index, false)];

        while let Some((node_index, visited)) = stack.pop() {
            if !visited {
                stack.push((node_index, true));
                if let Some(children) = nodes[node_index].children() {
                    for &child_index in children.iter().rev() {
                        stack.push((child_index, false));
                    }
                }
                continue;
            }

            let node = match &mut nodes[node_index] {
                ArenaNode::Element {
                    name,
                    attributes,
                    children,
                } => {
                    let child_count = children.len();
                    children.clear();
                    Node::Element {
                        name: std::mem::take(name),
                        attributes: std::mem::take(attributes),
                        children: take_children(child_count, &mut built_nodes)?,
                    }
                }
                ArenaNode::Text { text } => Node::Text {
                    text: std::mem::take(text),
                },
                ArenaNode::Comment { text } => Node::Comment {
                    text: std::mem::take(text),
                },
            };
            built_nodes.push(node);
        }

        match (built_nodes.pop(), built_nodes.is_empty()) {
            (Some(root), true) => Ok(root),
            _ => Err(EngineInvariantError::new(
                "arena build must yield exactly one root",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Node {
        parse_html(input).expect("parse")
    }

    fn element<'n>(node: &'n Node, path: &[usize]) -> &'n Node {
        let mut current = node;
        for &i in path {
            current = &current.children()[i];
        }
        current
    }

    #[test]
    fn root_is_synthetic_html() {
        let dom = parse("text");
        assert_eq!(dom.name(), Some("html"));
        assert_eq!(dom.children(), &[Node::text("text")]);
    }

    #[test]
    fn list_items_close_each_other() {
        let dom = parse("<ul><li>a<li>b</ul>");
        let ul = element(&dom, &[0]);
        assert_eq!(ul.name(), Some("ul"));
        assert_eq!(ul.children().len(), 2);
        for (li, text) in ul.children().iter().zip(["a", "b"]) {
            assert_eq!(li.name(), Some("li"));
            assert_eq!(li.children(), &[Node::text(text)]);
        }
    }

    #[test]
    fn overlapping_inlines_become_nested() {
        let dom = parse("<b>x<i>y</b>z</i>");
        // <b>x<i>y</i></b><i>z</i>
        assert_eq!(
            dom.to_xml_string(),
            "<html><b>x<i>y</i></b><i>z</i></html>"
        );
    }

    #[test]
    fn inlines_are_carried_into_next_block() {
        // the trailing end tags find their templates pending and attach
        // them empty
        let dom = parse("<b><i>x<p>y</p></i></b>");
        assert_eq!(
            dom.to_xml_string(),
            "<html><b><i>x</i></b><p><b><i>y</i></b></p><i /><b /></html>"
        );
    }

    #[test]
    fn carried_inlines_go_underneath_pending_ones() {
        let dom = parse("<b>x<u><p>y");
        // b was open, u still pending when p starts
        assert_eq!(
            dom.to_xml_string(),
            "<html><b>x</b><p><b><u>y</u></b></p></html>"
        );
    }

    #[test]
    fn empty_inline_is_materialized_on_close() {
        let dom = parse("<p><a name=x></a>t</p>");
        assert_eq!(
            dom.to_xml_string(),
            "<html><p><a name=\"x\" />t</p></html>"
        );
    }

    #[test]
    fn stray_end_tags_and_unknown_elements_are_ignored() {
        let dom = parse("<p>a</div><blink>b</blink></p>");
        assert_eq!(dom.to_xml_string(), "<html><p>ab</p></html>");
    }

    #[test]
    fn attributes_are_lowercased_and_first_wins() {
        let dom = parse("<DIV Class=one CLASS=two id=\"x\">t</DIV>");
        let div = element(&dom, &[0]);
        assert_eq!(div.name(), Some("div"));
        assert_eq!(div.attribute("class"), Some("one"));
        assert_eq!(div.attribute("id"), Some("x"));
    }

    #[test]
    fn void_and_self_closing_elements_are_leaves() {
        let dom = parse("<p>a<br>b<div/>c</p>");
        let p = element(&dom, &[0]);
        let names: Vec<Option<&str>> = p.children().iter().map(Node::name).collect();
        assert_eq!(names, vec![None, Some("br"), None, Some("div"), None]);
    }

    #[test]
    fn only_fragment_comments_are_kept() {
        let dom = parse("<!--x--><p><!-- StartFragment -->a<!--EndFragment--></p>");
        let p = element(&dom, &[0]);
        assert_eq!(
            p.children(),
            &[
                Node::Comment {
                    text: "StartFragment".to_string()
                },
                Node::text("a"),
                Node::Comment {
                    text: "EndFragment".to_string()
                },
            ]
        );
    }

    #[test]
    fn table_parts_close_implicitly() {
        let dom = parse("<table><tr><td>a<td>b<tr><td>c</table>");
        assert_eq!(
            dom.to_xml_string(),
            "<html><table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table></html>"
        );
    }

    #[test]
    fn new_row_pops_every_implicitly_closed_part() {
        // <tr> closes the open <td> and then the open <tr>
        let dom = parse("<table><tr><td>a<tr><td>b</table>");
        assert_eq!(
            dom.to_xml_string(),
            "<html><table><tr><td>a</td></tr><tr><td>b</td></tr></table></html>"
        );
    }

    #[test]
    fn stats_report_unclosed_and_carried() {
        let (_, stats) = HtmlParser::new("<div><b>x<p>y")
            .and_then(HtmlParser::parse_with_stats)
            .expect("parse");
        assert_eq!(stats.unclosed_at_end, 3);
        assert_eq!(stats.carried_inlines, 1);
        assert_eq!(stats.max_open_depth, 4);
    }
}
