//! Static element classification used by the parser and the transformer.
//!
//! All lookups expect lower-case names; the parser lower-cases tag names
//! before asking.

/// Void elements: no content, no closing tag expected.
pub fn is_empty_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "basefont"
            | "br"
            | "col"
            | "frame"
            | "hr"
            | "img"
            | "input"
            | "isindex"
            | "link"
            | "meta"
            | "param"
    )
}

/// Elements that start a new block and force open inline elements closed.
pub fn is_block_element(name: &str) -> bool {
    matches!(
        name,
        "blockquote"
            | "body"
            | "caption"
            | "center"
            | "cite"
            | "dd"
            | "dir"
            | "div"
            | "dl"
            | "dt"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "html"
            | "li"
            | "menu"
            | "ol"
            | "p"
            | "pre"
            | "table"
            | "tbody"
            | "td"
            | "textarea"
            | "tfoot"
            | "th"
            | "thead"
            | "tr"
            | "tt"
            | "ul"
    )
}

/// Formatting elements that flow within text and may be carried over block
/// boundaries.
pub fn is_inline_element(name: &str) -> bool {
    matches!(
        name,
        "a" | "abbr"
            | "acronym"
            | "address"
            | "b"
            | "bdo"
            | "big"
            | "button"
            | "code"
            | "del"
            | "dfn"
            | "em"
            | "font"
            | "i"
            | "idea"
            | "ins"
            | "kbd"
            | "label"
            | "legend"
            | "q"
            | "s"
            | "samp"
            | "small"
            | "span"
            | "strike"
            | "strong"
            | "sub"
            | "sup"
            | "u"
            | "var"
    )
}

/// Neither block nor inline, but still tracked on the open-element stack.
pub fn is_known_openable_element(name: &str) -> bool {
    matches!(
        name,
        "applet"
            | "base"
            | "basefont"
            | "colgroup"
            | "fieldset"
            | "frameset"
            | "head"
            | "iframe"
            | "map"
            | "noframes"
            | "noscript"
            | "object"
            | "optgroup"
            | "option"
            | "script"
            | "select"
            | "style"
            | "title"
    )
}

/// Elements with an optional end tag that close when their container does.
pub fn closes_on_parent_element_end(name: &str) -> bool {
    matches!(
        name,
        "body"
            | "colgroup"
            | "dd"
            | "dt"
            | "head"
            | "html"
            | "li"
            | "p"
            | "tbody"
            | "td"
            | "tfoot"
            | "thead"
            | "th"
            | "tr"
    )
}

/// Whether an open `current` element is implicitly closed when `next` opens.
pub fn closes_on_next_element_start(current: &str, next: &str) -> bool {
    debug_assert!(
        !current.bytes().any(|b| b.is_ascii_uppercase()),
        "schema lookups expect lower-case names, got: {current}"
    );
    match current {
        "colgroup" => {
            matches!(next, "colgroup" | "tr" | "thead" | "tfoot" | "tbody") && is_block_element(next)
        }
        "dd" | "dt" => matches!(next, "dd" | "dt") && is_block_element(next),
        "li" => next == "li",
        "p" => is_block_element(next),
        "tbody" => matches!(next, "tbody" | "thead" | "tfoot"),
        "tfoot" => matches!(next, "tbody" | "thead"),
        "thead" => matches!(next, "tbody" | "tfoot"),
        "tr" => matches!(next, "thead" | "tfoot" | "tbody" | "tr"),
        "td" | "th" => matches!(next, "td" | "th" | "tr" | "tbody" | "tfoot" | "thead"),
        _ => false,
    }
}
