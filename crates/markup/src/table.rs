//! Table conversion.
//!
//! Column geometry is inferred from declared cell widths only. The
//! structure pass collects the ascending list of column starts shared by
//! every row, honouring `rowspan`; any row that cannot be lined up makes the
//! whole pass give up, in which case columns come from `colgroup`/`col` and
//! cells get no `ColumnSpan`.
use crate::markup::{MarkupNode, MarkupTag};
use crate::style::{PropertyMap, css_value, element_properties, format_number, try_length_value};
use crate::transform::HtmlToMarkupConverter;
use crate::types::Node;

fn is_row_group(name: &str) -> bool {
    matches!(name, "tbody" | "thead" | "tfoot")
}

fn is_cell(name: &str) -> bool {
    matches!(name, "td" | "th")
}

fn has_element_children(node: &Node) -> bool {
    node.children()
        .iter()
        .any(|child| matches!(child, Node::Element { .. }))
}

impl HtmlToMarkupConverter<'_> {
    pub(crate) fn add_table(&mut self, parent: &mut MarkupNode, table: &Node, inherited: &PropertyMap) {
        // Table formatting is inherited by the cells but not applied to the
        // table itself.
        let props = element_properties(table, inherited);

        if self.config().unwrap_single_cell_tables
            && let Some(cell) = single_cell(table)
        {
            log::trace!(target: "markup.table", "unwrapping single-cell table");
            self.add_blocks(parent, cell.children(), &props.current);
            return;
        }

        let column_starts = analyze_table_structure(table);
        match &column_starts {
            Some(starts) => log::debug!(
                target: "markup.table",
                "table geometry: {} column(s)",
                starts.len().saturating_sub(1)
            ),
            None => log::debug!(
                target: "markup.table",
                "table geometry unavailable; widths and column spans omitted"
            ),
        }
        let starts = column_starts.as_deref();

        let mut output = MarkupNode::new(MarkupTag::Table);
        add_columns(&mut output, table, starts);

        let children = table.children();
        let mut index = 0;
        while index < children.len() {
            let child = &children[index];
            match child.name() {
                Some(name) if is_row_group(name) => {
                    let group_props = element_properties(child, &props.current);
                    let mut group = MarkupNode::new(MarkupTag::TableRowGroup);
                    self.add_rows(&mut group, child.children(), &group_props.current, starts);
                    if group.has_element_children() {
                        output.push_element(group);
                    }
                    index += 1;
                }
                Some("tr") => {
                    // bare rows up to the next row group share one synthetic group
                    let end = children[index..]
                        .iter()
                        .position(|node| node.name().is_some_and(is_row_group))
                        .map_or(children.len(), |offset| index + offset);
                    let mut group = MarkupNode::new(MarkupTag::TableRowGroup);
                    self.add_rows(&mut group, &children[index..end], &props.current, starts);
                    if group.has_element_children() {
                        output.push_element(group);
                    }
                    index = end;
                }
                _ => index += 1,
            }
        }

        if output.has_element_children() {
            parent.push_element(output);
        }
    }

    fn add_rows(
        &mut self,
        group: &mut MarkupNode,
        nodes: &[Node],
        inherited: &PropertyMap,
        starts: Option<&[f64]>,
    ) {
        // row spans never cross a group boundary
        let mut spans = starts.map(|starts| vec![0u32; starts.len()]);

        let mut index = 0;
        while index < nodes.len() {
            let node = &nodes[index];
            match node.name() {
                Some("tr") => {
                    let row_props = element_properties(node, inherited);
                    let mut row = MarkupNode::new(MarkupTag::TableRow);
                    self.add_cells(&mut row, node.children(), &row_props.current, starts, spans.as_deref_mut());
                    if row.has_element_children() {
                        group.push_element(row);
                    }
                    index += 1;
                }
                Some(name) if is_cell(name) => {
                    let end = nodes[index..]
                        .iter()
                        .position(|node| node.name().is_some_and(|name| name == "tr" || is_row_group(name)))
                        .map_or(nodes.len(), |offset| index + offset);
                    let mut row = MarkupNode::new(MarkupTag::TableRow);
                    self.add_cells(&mut row, &nodes[index..end], inherited, starts, spans.as_deref_mut());
                    if row.has_element_children() {
                        group.push_element(row);
                    }
                    index = end;
                }
                _ => index += 1,
            }
        }
    }

    fn add_cells(
        &mut self,
        row: &mut MarkupNode,
        nodes: &[Node],
        inherited: &PropertyMap,
        starts: Option<&[f64]>,
        mut spans: Option<&mut [u32]>,
    ) {
        let mut column = 0;
        for node in nodes {
            if !node.name().is_some_and(is_cell) {
                continue;
            }
            let cell_props = element_properties(node, inherited);
            let mut cell = MarkupNode::new(MarkupTag::TableCell)
                .with_attribute("BorderThickness", "1,1,1,1")
                .with_attribute("BorderBrush", "Black");
            if let Some(row_span) = node.attribute("rowspan") {
                cell.set_attribute("RowSpan", row_span);
            }
            if let (Some(starts), Some(spans)) = (starts, spans.as_deref_mut()) {
                place_cell(&mut cell, node, starts, spans, &mut column);
            }

            self.add_blocks(&mut cell, node.children(), &cell_props.current);
            if cell.has_element_children() {
                row.push_element(cell);
            }
        }
    }
}

/// Moves `column` past row-spanned columns and sets `ColumnSpan` from the
/// cell's width.
fn place_cell(cell: &mut MarkupNode, node: &Node, starts: &[f64], spans: &mut [u32], column: &mut usize) {
    while *column < spans.len() && spans[*column] > 0 {
        spans[*column] -= 1;
        *column += 1;
    }
    if *column + 1 >= starts.len() {
        return;
    }
    let Some(width) = column_width(node) else {
        return;
    };

    let span = column_span(*column, width, starts);
    cell.set_attribute("ColumnSpan", span.to_string());
    let remaining = row_span(node) - 1;
    for active in &mut spans[*column..*column + span] {
        *active = remaining;
    }
    *column += span;
}

/// The only `td`/`th` of the table, looking through row groups and bare rows.
fn single_cell(table: &Node) -> Option<&Node> {
    let mut cells = table_rows(table).flat_map(|row| {
        row.children()
            .iter()
            .filter(|cell| cell.name().is_some_and(is_cell))
    });
    let first = cells.next()?;
    cells.next().is_none().then_some(first)
}

fn table_rows(table: &Node) -> impl Iterator<Item = &Node> {
    table.children().iter().flat_map(|child| {
        let rows = if child.name().is_some_and(is_row_group) {
            child.children()
        } else {
            std::slice::from_ref(child)
        };
        rows.iter().filter(|row| row.is_element_named("tr"))
    })
}

fn add_columns(output: &mut MarkupNode, table: &Node, starts: Option<&[f64]>) {
    if let Some(starts) = starts {
        for pair in starts.windows(2) {
            let column = MarkupNode::new(MarkupTag::TableColumn).with_attribute("Width", format_number(pair[1] - pair[0]));
            output.push_element(column);
        }
        return;
    }

    for child in table.children() {
        match child.name() {
            Some("colgroup") => {
                let cols = child
                    .children()
                    .iter()
                    .filter(|node| node.is_element_named("col"))
                    .count();
                for _ in 0..cols {
                    output.push_element(MarkupNode::new(MarkupTag::TableColumn));
                }
            }
            Some("col") => output.push_element(MarkupNode::new(MarkupTag::TableColumn)),
            Some(_) => break,
            None => {}
        }
    }
}

/// Column starts of the table followed by its total width, or `None` when
/// the declared widths cannot be lined up.
pub(crate) fn analyze_table_structure(table: &Node) -> Option<Vec<f64>> {
    if !has_element_children(table) {
        return None;
    }

    let mut grid = ColumnGrid::default();
    let mut table_width = 0.0_f64;
    for child in table.children() {
        let width = match child.name() {
            Some(name) if is_row_group(name) => grid.analyze_group(child, table_width)?,
            Some("tr") => grid.analyze_row(child, table_width)?,
            Some(name) if is_cell(name) => return None,
            _ => continue,
        };
        table_width = table_width.max(width);
    }

    if table_width == 0.0 {
        return None;
    }
    grid.starts.push(table_width);
    Some(grid.starts)
}

#[derive(Default)]
struct ColumnGrid {
    /// Ascending column start positions.
    starts: Vec<f64>,
    /// Remaining rows each column is covered by a row span from above.
    spans: Vec<u32>,
}

impl ColumnGrid {
    fn analyze_group(&mut self, group: &Node, known_width: f64) -> Option<f64> {
        if !has_element_children(group) {
            return None;
        }

        self.spans.fill(0);
        let mut width = 0.0_f64;
        for child in group.children() {
            match child.name() {
                Some("tr") => {
                    let row_width = self.analyze_row(child, known_width.max(width))?;
                    width = width.max(row_width);
                }
                Some(name) if is_cell(name) => return None,
                _ => {}
            }
        }
        self.spans.fill(0);

        (width > 0.0).then_some(width)
    }

    /// Returns the row's width.
    fn analyze_row(&mut self, row: &Node, known_width: f64) -> Option<f64> {
        if !has_element_children(row) {
            return None;
        }

        let mut column = 0;
        let mut column_start = 0.0_f64;
        self.skip_spanned(&mut column, &mut column_start, known_width);

        for cell in row.children().iter().filter(|node| node.name().is_some_and(is_cell)) {
            if column < self.starts.len() {
                if column_start < self.starts[column] {
                    self.starts.insert(column, column_start);
                    self.spans.insert(column, 0);
                }
            } else {
                self.starts.push(column_start);
                self.spans.push(0);
            }

            let Some(width) = column_width(cell) else {
                log::trace!(target: "markup.table", "cell without usable width");
                return None;
            };
            let Some(next) = self.next_column_index(column, width) else {
                log::trace!(target: "markup.table", "cell overlaps an active row span");
                return None;
            };

            let remaining = row_span(cell) - 1;
            for active in &mut self.spans[column..next] {
                *active = remaining;
            }
            column = next;
            column_start += width;
            let end = known_width.max(column_start);
            self.skip_spanned(&mut column, &mut column_start, end);
        }

        (column_start > 0.0).then_some(column_start)
    }

    /// When `column` starts exactly at `column_start`, steps over the
    /// columns still covered by a row span from above.
    fn skip_spanned(&mut self, column: &mut usize, column_start: &mut f64, end: f64) {
        if *column >= self.spans.len() || self.starts[*column] != *column_start {
            return;
        }
        while *column < self.spans.len() && self.spans[*column] > 0 {
            self.spans[*column] -= 1;
            *column += 1;
            *column_start = self.starts.get(*column).copied().unwrap_or(end);
        }
    }

    /// First column at or past `starts[column] + width`, or `None` when a
    /// column in between is row-spanned.
    fn next_column_index(&self, column: usize, width: f64) -> Option<usize> {
        let limit = self.starts[column] + width;
        let mut next = column + 1;
        while next < self.starts.len() && self.starts[next] < limit {
            if self.spans[next] > 0 {
                return None;
            }
            next += 1;
        }
        Some(next)
    }
}

/// Declared width from the `width` attribute, else from `style`. Zero,
/// negative and unparsable widths count as missing.
fn column_width(cell: &Node) -> Option<f64> {
    let declared = match cell.attribute("width") {
        Some(width) => width,
        None => css_value(cell.attribute("style")?, "width")?,
    };
    try_length_value(declared).filter(|width| *width > 0.0)
}

fn row_span(cell: &Node) -> u32 {
    cell.attribute("rowspan")
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|span| *span > 0)
        .unwrap_or(1)
}

/// Number of columns from `column` needed to cover `width`; a cell wider
/// than the remaining columns spans to the end.
fn column_span(column: usize, width: f64, starts: &[f64]) -> usize {
    let mut covered = 0.0;
    let mut index = column;
    while covered < width && index + 1 < starts.len() {
        covered += starts[index + 1] - starts[index];
        index += 1;
    }
    index - column
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::parser::parse_html;
    use crate::transform::convert_html_to_markup;

    fn table(html: &str) -> Node {
        let root = parse_html(html).expect("parse");
        let found = root
            .children()
            .iter()
            .find(|node| node.is_element_named("table"))
            .cloned();
        match found {
            Some(table) => table,
            None => panic!("expected a table, got: {root:?}"),
        }
    }

    fn convert(html: &str, config: ConverterConfig) -> String {
        convert_html_to_markup(html, &config.with_namespace(None)).expect("conversion")
    }

    const SPANNING: &str = "<table><tr><td width=100>a<td width=200>b<tr><td width=300>c</table>";

    #[test]
    fn widths_line_up_into_column_starts() {
        let starts = analyze_table_structure(&table(SPANNING));
        assert_eq!(starts, Some(vec![0.0, 100.0, 300.0]));
    }

    #[test]
    fn style_widths_and_points_are_accepted() {
        let starts = analyze_table_structure(&table(
            "<table><tbody><tr><td style=\"width: 72pt\">a</td><td width=\"4px\">b</td></tr></tbody></table>",
        ));
        assert_eq!(starts, Some(vec![0.0, 96.0, 100.0]));
    }

    #[test]
    fn missing_width_abandons_geometry() {
        assert_eq!(
            analyze_table_structure(&table("<table><tr><td width=100>a<td>b</table>")),
            None
        );
        assert_eq!(
            analyze_table_structure(&table("<table><tr><td width=0>a</table>")),
            None
        );
    }

    #[test]
    fn overlapping_row_span_abandons_geometry() {
        let html = "<table><tr><td width=100>a<td width=100 rowspan=2>b\
                    <tr><td width=200>c</table>";
        assert_eq!(analyze_table_structure(&table(html)), None);
    }

    #[test]
    fn row_span_skips_covered_column() {
        let html = "<table><tr><td width=100 rowspan=2>a<td width=100>b\
                    <tr><td width=100>c</table>";
        assert_eq!(
            analyze_table_structure(&table(html)),
            Some(vec![0.0, 100.0, 200.0])
        );
    }

    #[test]
    fn row_span_is_skipped_after_a_cell() {
        let middle = "<table><tr><td width=100>a<td width=100 rowspan=2>b<td width=100>c\
                      <tr><td width=100>d<td width=100>e</table>";
        assert_eq!(
            analyze_table_structure(&table(middle)),
            Some(vec![0.0, 100.0, 200.0, 300.0])
        );

        // the spanned column is the last one, so the row ends at the known width
        let last = "<table><tr><td width=100>a<td width=100 rowspan=2>b\
                    <tr><td width=100>c</table>";
        assert_eq!(
            analyze_table_structure(&table(last)),
            Some(vec![0.0, 100.0, 200.0])
        );
    }

    #[test]
    fn cell_directly_in_group_abandons_geometry() {
        let html = "<table><tbody><td width=100>a</td></tbody></table>";
        assert_eq!(analyze_table_structure(&table(html)), None);
    }

    #[test]
    fn spanning_cell_gets_column_span() {
        let xml = convert(SPANNING, ConverterConfig::default());
        assert!(
            xml.contains("<TableColumn Width=\"100\" /><TableColumn Width=\"200\" />"),
            "expected inferred columns, got: {xml}"
        );
        assert!(
            xml.contains(
                "<TableCell BorderThickness=\"1,1,1,1\" BorderBrush=\"Black\" ColumnSpan=\"2\">\
                 <Paragraph>c</Paragraph></TableCell>"
            ),
            "expected spanning cell, got: {xml}"
        );
        assert_eq!(xml.matches("ColumnSpan=\"1\"").count(), 2, "got: {xml}");
    }

    #[test]
    fn single_cell_table_is_unwrapped() {
        let html = "<table><tbody><tr><td><p>only</p></td></tr></tbody></table>";
        assert_eq!(
            convert(html, ConverterConfig::default()),
            "<FlowDocument xml:space=\"preserve\"><Paragraph>only</Paragraph></FlowDocument>"
        );

        let xml = convert(html, ConverterConfig::default().with_single_cell_unwrap(false));
        assert_eq!(
            xml,
            "<FlowDocument xml:space=\"preserve\"><Table><TableRowGroup><TableRow>\
             <TableCell BorderThickness=\"1,1,1,1\" BorderBrush=\"Black\"><Paragraph>only</Paragraph></TableCell>\
             </TableRow></TableRowGroup></Table></FlowDocument>"
        );
    }

    #[test]
    fn columns_fall_back_to_colgroup() {
        let html = "<table><colgroup><col><col></colgroup><tr><td>a<td>b</table>";
        let xml = convert(html, ConverterConfig::default());
        assert!(
            xml.starts_with("<FlowDocument xml:space=\"preserve\"><Table><TableColumn /><TableColumn /><TableRowGroup>"),
            "expected pass-through columns, got: {xml}"
        );
        assert!(!xml.contains("ColumnSpan"), "got: {xml}");
    }

    #[test]
    fn row_span_is_copied_to_cells() {
        let html = "<table><tr><td rowspan=2>a<td>b<tr><td>c</table>";
        let xml = convert(html, ConverterConfig::default());
        assert!(xml.contains("RowSpan=\"2\""), "got: {xml}");
    }

    #[test]
    fn empty_table_is_dropped() {
        let xml = convert("<p>x</p><table><tr><td></td><td></td></tr></table>", ConverterConfig::default());
        assert_eq!(xml, "<FlowDocument xml:space=\"preserve\"><Paragraph>x</Paragraph></FlowDocument>");
    }

    #[test]
    fn column_span_stops_at_table_end() {
        assert_eq!(column_span(0, 500.0, &[0.0, 100.0, 300.0]), 2);
        assert_eq!(column_span(1, 50.0, &[0.0, 100.0, 300.0]), 1);
    }
}
