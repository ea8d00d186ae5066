//! Deterministic inputs shared by the benchmarks and the stress tests.

pub const BLOCK_TEMPLATE: &str =
    "<div class=box><p style=\"margin:4px 8px\">hello <b>bold <i>both</b> italic</i></p><ul><li>one<li>two</ul></div>";

pub const TABLE_ROW_TEMPLATE: &str = "<tr><td width=100>cell</td><td width=\"150px\">cell</td></tr>";

pub fn make_blocks(blocks: usize) -> String {
    let mut html = String::with_capacity(BLOCK_TEMPLATE.len() * blocks);
    for _ in 0..blocks {
        html.push_str(BLOCK_TEMPLATE);
    }
    html
}

pub fn make_table(rows: usize) -> String {
    let mut html = String::with_capacity(TABLE_ROW_TEMPLATE.len() * rows + 32);
    html.push_str("<table><tbody>");
    for _ in 0..rows {
        html.push_str(TABLE_ROW_TEMPLATE);
    }
    html.push_str("</tbody></table>");
    html
}

/// `depth` unclosed `div`/`b` pairs followed by text.
pub fn make_unclosed_nesting(depth: usize) -> String {
    let mut html = String::with_capacity(depth * 8 + 8);
    for _ in 0..depth {
        html.push_str("<div><b>");
    }
    html.push_str("deep");
    html
}

/// A single paragraph of `words` space-separated words.
pub fn make_long_paragraph(words: usize) -> String {
    let mut html = String::with_capacity(words * 6 + 7);
    html.push_str("<p>");
    for i in 0..words {
        if i != 0 {
            html.push(' ');
        }
        html.push_str("word");
    }
    html.push_str("</p>");
    html
}
