//! HTML tree to rich-text markup conversion.
//!
//! The converter walks the parsed tree in two modes. Block mode classifies
//! each node as a section, paragraph, list, table or an implicit paragraph
//! wrapping a run of inline siblings. Inline mode turns formatting elements
//! into `Span`/`Run`/`Hyperlink` nodes and text into text content.
//!
//! Block-mode entry points take the sibling slice and the index of the node
//! to convert and return the index of the last sibling they consumed, since
//! implicit paragraphs and orphan list items swallow following siblings.
use crate::config::{ConverterConfig, OutputMode};
use crate::error::{ConvertError, EngineInvariantError};
use crate::markup::{MarkupContent, MarkupNode, MarkupTag};
use crate::parser::parse_html;
use crate::schema::{is_block_element, is_inline_element};
use crate::style::{PropertyMap, apply_local_properties, element_properties};
use crate::types::Node;

const HORIZONTAL_RULE_TEXT: &str = "----------------------";

/// Parses `html` and serializes the converted tree.
pub fn convert_html_to_markup(html: &str, config: &ConverterConfig) -> Result<String, ConvertError> {
    Ok(convert_html_to_tree(html, config)?.to_xml())
}

pub fn convert_html_to_tree(html: &str, config: &ConverterConfig) -> Result<MarkupNode, ConvertError> {
    let root = parse_html(html)?;
    convert_node_to_markup(root, config)
}

/// Converts an already parsed tree. The root's own name and attributes are
/// not converted, only its children.
pub fn convert_node_to_markup(root: Node, config: &ConverterConfig) -> Result<MarkupNode, ConvertError> {
    HtmlToMarkupConverter::new(config).convert(root)
}

/// One conversion. Holds the fragment-marker state, so a converter is
/// consumed by [`HtmlToMarkupConverter::convert`].
pub struct HtmlToMarkupConverter<'c> {
    config: &'c ConverterConfig,
    /// Mark of the inline parent recorded by the fragment comments.
    fragment_parent: Option<u32>,
    last_mark: u32,
}

impl<'c> HtmlToMarkupConverter<'c> {
    pub fn new(config: &'c ConverterConfig) -> Self {
        Self {
            config,
            fragment_parent: None,
            last_mark: 0,
        }
    }

    pub fn convert(mut self, root: Node) -> Result<MarkupNode, ConvertError> {
        let mut nodes = match root {
            Node::Element { children, .. } => children,
            other => vec![other],
        };

        let max_size = self.config.block_max_size.max(1);
        let splits = paginate(&mut nodes, max_size);

        let mut output = MarkupNode::new(MarkupTag::from_root_name(self.config.root_tag()));
        let batches = self.add_batches(&mut output, nodes, max_size);
        log::debug!(
            target: "markup.transform",
            "converted {batches} batch(es) after {splits} pagination split(s)"
        );

        if self.config.output == OutputMode::InlineFragment {
            output = self.extract_inline_fragment(output)?;
        }

        output.set_attribute("xml:space", "preserve");
        if let Some(namespace) = &self.config.namespace {
            output.set_attribute("xmlns", namespace.as_str());
        }
        Ok(output)
    }

    pub(crate) fn config(&self) -> &ConverterConfig {
        self.config
    }

    /// Packs top-level nodes into `html` wrappers of at most `max_size`
    /// serialized characters and converts each wrapper in turn.
    fn add_batches(&mut self, output: &mut MarkupNode, nodes: Vec<Node>, max_size: usize) -> usize {
        let mut batches = 0;
        let mut batch = Vec::new();
        let mut batch_size = 0;

        for node in nodes {
            let skip = match &node {
                Node::Text { text } => text.trim().is_empty(),
                Node::Element { .. } => node.text_value().is_empty(),
                Node::Comment { .. } => false,
            };
            if skip {
                continue;
            }

            let size = node.to_xml_string().chars().count();
            if batch_size + size > max_size && !batch.is_empty() {
                self.add_batch(output, std::mem::take(&mut batch));
                batches += 1;
                batch_size = 0;
            }
            batch.push(node);
            batch_size += size;
        }

        if !batch.is_empty() {
            self.add_batch(output, batch);
            batches += 1;
        }
        batches
    }

    fn add_batch(&mut self, output: &mut MarkupNode, batch: Vec<Node>) {
        let wrapper = [Node::element("html", Vec::new(), batch)];
        self.add_block(output, &wrapper, 0, &PropertyMap::new());
    }

    /// Converts every node of `nodes` in block mode.
    pub(crate) fn add_blocks(&mut self, parent: &mut MarkupNode, nodes: &[Node], inherited: &PropertyMap) {
        let mut index = 0;
        while index < nodes.len() {
            index = self.add_block(parent, nodes, index, inherited) + 1;
        }
    }

    fn add_block(
        &mut self,
        parent: &mut MarkupNode,
        siblings: &[Node],
        index: usize,
        inherited: &PropertyMap,
    ) -> usize {
        let node = &siblings[index];
        let name = match node {
            Node::Comment { text } => {
                self.define_fragment_parent(text, None);
                return index;
            }
            Node::Text { .. } => return self.add_implicit_paragraph(parent, siblings, index, inherited),
            Node::Element { name, .. } => name.as_str(),
        };

        match name {
            "html" | "body" | "div" => {
                if self.config.is_excluded_class(node.attribute("class")) {
                    log::trace!(target: "markup.transform", "skipping excluded <{name}>");
                } else {
                    self.add_section(parent, node, inherited);
                }
            }
            "form" | "pre" | "blockquote" | "caption" | "center" | "cite" => {
                self.add_section(parent, node, inherited);
            }
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "textarea" | "dd" | "dl" | "dt"
            | "tt" => self.add_paragraph(parent, node, inherited),
            "ol" | "ul" | "dir" | "menu" => self.add_list(parent, node, inherited),
            "li" => return self.add_orphan_list_items(parent, siblings, index, inherited),
            "img" => {}
            "table" => self.add_table(parent, node, inherited),
            // table parts outside a table fall through to the inline path
            "tbody" | "thead" | "tfoot" | "tr" | "td" | "th" => {
                return self.add_implicit_paragraph(parent, siblings, index, inherited);
            }
            "style" | "meta" | "head" | "title" | "script" => {
                log::trace!(target: "markup.transform", "dropping <{name}>");
            }
            custom if self.config.is_custom_paragraph_tag(custom) => {
                self.add_paragraph(parent, node, inherited);
            }
            _ => return self.add_implicit_paragraph(parent, siblings, index, inherited),
        }
        index
    }

    /// `Section` when the element has block children, `Paragraph` otherwise.
    /// A section without attributes of its own is not emitted; its blocks go
    /// straight into `parent`.
    fn add_section(&mut self, parent: &mut MarkupNode, element: &Node, inherited: &PropertyMap) {
        let has_blocks = element
            .children()
            .iter()
            .any(|child| child.name().is_some_and(is_block_element));
        if !has_blocks {
            self.add_paragraph(parent, element, inherited);
            return;
        }

        let props = element_properties(element, inherited);
        let mut section = MarkupNode::new(MarkupTag::Section);
        apply_local_properties(&mut section, &props.local, true);

        if section.has_attributes() {
            self.add_blocks(&mut section, element.children(), &props.current);
            parent.push_element(section);
        } else {
            self.add_blocks(parent, element.children(), &props.current);
        }
    }

    fn add_paragraph(&mut self, parent: &mut MarkupNode, element: &Node, inherited: &PropertyMap) {
        let props = element_properties(element, inherited);
        let mut paragraph = MarkupNode::new(MarkupTag::Paragraph);
        apply_local_properties(&mut paragraph, &props.local, true);

        for child in element.children() {
            self.add_inline(&mut paragraph, child, &props.current);
        }
        parent.push_element(paragraph);
    }

    /// Wraps the run of non-block siblings starting at `index` into one
    /// paragraph. Always consumes at least the first node.
    fn add_implicit_paragraph(
        &mut self,
        parent: &mut MarkupNode,
        siblings: &[Node],
        index: usize,
        inherited: &PropertyMap,
    ) -> usize {
        let mut paragraph = MarkupNode::new(MarkupTag::Paragraph);
        let mut last = index;

        for (offset, node) in siblings[index..].iter().enumerate() {
            match node {
                Node::Comment { text } => self.define_fragment_parent(text, None),
                Node::Text { text } => {
                    if !text.trim().is_empty() {
                        add_text_run(&mut paragraph, text);
                    }
                }
                Node::Element { name, .. } => {
                    if offset > 0 && is_block_element(name) {
                        break;
                    }
                    self.add_inline(&mut paragraph, node, inherited);
                }
            }
            last = index + offset;
        }

        if !paragraph.is_empty() {
            parent.push_element(paragraph);
        }
        last
    }

    fn add_inline(&mut self, parent: &mut MarkupNode, node: &Node, inherited: &PropertyMap) {
        let name = match node {
            Node::Comment { text } => {
                self.define_fragment_parent(text, Some(parent));
                return;
            }
            Node::Text { text } => {
                add_text_run(parent, text);
                return;
            }
            Node::Element { name, .. } => name.as_str(),
        };

        match name {
            "a" => self.add_hyperlink(parent, node, inherited),
            "img" => {}
            "br" | "hr" => {
                if self.config.emit_line_breaks {
                    add_break(parent, name);
                }
            }
            _ if is_inline_element(name) || is_block_element(name) => {
                self.add_span_or_run(parent, node, inherited);
            }
            _ => log::trace!(target: "markup.transform", "ignoring inline <{name}>"),
        }
    }

    /// `Span` when the element nests further inline content, `Run` when it
    /// only holds text.
    fn add_span_or_run(&mut self, parent: &mut MarkupNode, element: &Node, inherited: &PropertyMap) {
        let nests = element.children().iter().any(|child| {
            child.name().is_some_and(|name| {
                is_inline_element(name) || is_block_element(name) || matches!(name, "img" | "br" | "hr")
            })
        });
        let tag = if nests { MarkupTag::Span } else { MarkupTag::Run };

        let props = element_properties(element, inherited);
        let mut inline = MarkupNode::new(tag);
        apply_local_properties(&mut inline, &props.local, false);

        for child in element.children() {
            self.add_inline(&mut inline, child, &props.current);
        }
        parent.push_element(inline);
    }

    fn add_hyperlink(&mut self, parent: &mut MarkupNode, element: &Node, inherited: &PropertyMap) {
        let Some(href) = element.attribute("href") else {
            self.add_span_or_run(parent, element, inherited);
            return;
        };

        let props = element_properties(element, inherited);
        let mut link = MarkupNode::new(MarkupTag::Hyperlink);
        apply_local_properties(&mut link, &props.local, false);

        let parts: Vec<&str> = href.split('#').collect();
        if let Some(uri) = parts.first().map(|part| part.trim())
            && !uri.is_empty()
        {
            link.set_attribute("NavigateUri", uri);
        }
        if let [_, target] = parts.as_slice()
            && !target.trim().is_empty()
        {
            link.set_attribute("TargetName", target.trim());
        }

        for child in element.children() {
            self.add_inline(&mut link, child, &props.current);
        }
        parent.push_element(link);
    }

    fn add_list(&mut self, parent: &mut MarkupNode, element: &Node, inherited: &PropertyMap) {
        let props = element_properties(element, inherited);
        let marker = if element.is_element_named("ol") { "Decimal" } else { "Disc" };
        let mut list = MarkupNode::new(MarkupTag::List).with_attribute("MarkerStyle", marker);
        apply_local_properties(&mut list, &props.local, true);

        for child in element.children() {
            if child.is_element_named("li") {
                self.add_list_item(&mut list, child, &props.current);
            }
        }

        if list.has_element_children() {
            parent.push_element(list);
        }
    }

    /// `li` outside a list: it and every directly following `li` sibling go
    /// into the list `parent` ends with, or into a new one.
    fn add_orphan_list_items(
        &mut self,
        parent: &mut MarkupNode,
        siblings: &[Node],
        index: usize,
        inherited: &PropertyMap,
    ) -> usize {
        let mut list = match parent.children.pop() {
            Some(MarkupContent::Element(node)) if node.tag == MarkupTag::List => node,
            Some(other) => {
                parent.children.push(other);
                MarkupNode::new(MarkupTag::List)
            }
            None => MarkupNode::new(MarkupTag::List),
        };

        let mut last = index;
        for (offset, node) in siblings[index..].iter().enumerate() {
            if !node.is_element_named("li") {
                break;
            }
            self.add_list_item(&mut list, node, inherited);
            last = index + offset;
        }
        log::trace!(
            target: "markup.transform",
            "collected {} orphan list item(s)",
            last - index + 1
        );

        parent.push_element(list);
        last
    }

    fn add_list_item(&mut self, list: &mut MarkupNode, element: &Node, inherited: &PropertyMap) {
        let props = element_properties(element, inherited);
        let mut item = MarkupNode::new(MarkupTag::ListItem);
        self.add_blocks(&mut item, element.children(), &props.current);
        list.push_element(item);
    }

    /// `StartFragment` records the current inline parent (or clears it when
    /// seen in block context); `EndFragment` only fills a missing one.
    fn define_fragment_parent(&mut self, comment: &str, parent: Option<&mut MarkupNode>) {
        match comment {
            "StartFragment" => {
                let mark = parent.map(|node| self.mark(node));
                self.fragment_parent = mark;
            }
            "EndFragment" => {
                if self.fragment_parent.is_none()
                    && let Some(node) = parent
                {
                    let mark = self.mark(node);
                    self.fragment_parent = Some(mark);
                }
            }
            _ => {}
        }
    }

    fn mark(&mut self, node: &mut MarkupNode) -> u32 {
        self.last_mark += 1;
        node.fragment_mark = Some(self.last_mark);
        self.last_mark
    }

    fn extract_inline_fragment(&self, mut root: MarkupNode) -> Result<MarkupNode, EngineInvariantError> {
        let Some(mark) = self.fragment_parent else {
            log::debug!(target: "markup.transform", "no inline fragment parent; keeping the whole tree");
            return Ok(root);
        };
        let fragment = root
            .take_marked(mark)
            .ok_or(EngineInvariantError::new("fragment parent missing from the output tree"))?;

        log::debug!(
            target: "markup.transform",
            "extracted inline fragment from <{}>",
            fragment.tag
        );
        if fragment.tag == MarkupTag::Span {
            return Ok(fragment);
        }
        let mut span = MarkupNode::new(MarkupTag::Span);
        span.children = fragment.children;
        Ok(span)
    }
}

/// Splits top-level elements whose text is longer than `max_size` characters.
/// The head stays in place as plain text, the tail moves to a new `p`
/// sibling that is checked again. Returns the number of splits.
fn paginate(nodes: &mut Vec<Node>, max_size: usize) -> usize {
    let mut splits = 0;
    let mut index = 0;

    while index < nodes.len() {
        if !matches!(nodes[index], Node::Element { .. }) {
            index += 1;
            continue;
        }
        let value = nodes[index].text_value();
        let Some((window_end, _)) = value.char_indices().nth(max_size) else {
            index += 1;
            continue;
        };

        let (head, tail) = match value[..window_end].rfind(' ') {
            Some(space) => (&value[..space], &value[space + 1..]),
            None => (&value[..window_end], &value[window_end..]),
        };

        let mut attributes = Vec::new();
        if let Some(class) = nodes[index].attribute("class") {
            attributes.push(("class".to_string(), class.to_string()));
        }
        let remainder = Node::element("p", attributes, vec![Node::text(tail)]);

        if let Some(children) = nodes[index].children_mut() {
            *children = vec![Node::text(head)];
        }
        nodes.insert(index + 1, remainder);
        splits += 1;
        index += 1;
    }
    splits
}

/// Drops control characters and turns no-break spaces into plain spaces.
fn add_text_run(target: &mut MarkupNode, text: &str) {
    let cleaned: String = text
        .chars()
        .filter(|ch| !ch.is_control())
        .map(|ch| if ch == '\u{a0}' { ' ' } else { ch })
        .collect();
    if !cleaned.is_empty() {
        target.push_text(cleaned);
    }
}

fn add_break(parent: &mut MarkupNode, name: &str) {
    parent.push_element(MarkupNode::new(MarkupTag::LineBreak));
    if name == "hr" {
        parent.push_text(HORIZONTAL_RULE_TEXT);
        parent.push_element(MarkupNode::new(MarkupTag::LineBreak));
    }
}
