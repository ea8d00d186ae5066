//! Formatting properties: tag defaults, inline `style` declarations, and
//! their translation into target attributes.
//!
//! Only a closed set of properties is recognized; anything else in a
//! `style` attribute is dropped. Each element produces a *local* map (its
//! own tag defaults overridden by its inline declarations) and a *current*
//! map (the inherited map with the local one merged on top) that is handed
//! down to its children. Only the local map is written to the emitted node;
//! the target format inherits the rest on its own.
use std::collections::BTreeMap;

use crate::markup::{MarkupNode, MarkupTag};
use crate::types::Node;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyName {
    FontFamily,
    FontStyle,
    FontWeight,
    FontSize,
    Color,
    MouseOverColor,
    BackgroundColor,
    TextDecorationUnderline,
    TextIndent,
    TextAlign,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    BorderColorTop,
    BorderColorRight,
    BorderColorBottom,
    BorderColorLeft,
    BorderWidthTop,
    BorderWidthRight,
    BorderWidthBottom,
    BorderWidthLeft,
    ListStyleType,
}

/// Property values keyed by name; iteration follows declaration order of
/// `PropertyName`, which fixes the emitted attribute order.
pub type PropertyMap = BTreeMap<PropertyName, String>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementProperties {
    /// Inherited properties with the local ones merged on top.
    pub current: PropertyMap,
    /// What this element itself sets.
    pub local: PropertyMap,
}

const MONOSPACE_FAMILY: &str = "Courier New";
const SMALL_FONT_SIZE: &str = "15";
const HEADING_FONT_SIZES: [&str; 6] = ["29", "27", "25", "23", "19", "17"];

pub fn element_properties(node: &Node, inherited: &PropertyMap) -> ElementProperties {
    let mut local = PropertyMap::new();
    let name = node.name().unwrap_or_default();

    match name {
        "i" | "italic" | "em" => {
            local.insert(PropertyName::FontStyle, "italic".to_string());
        }
        "idea" => {
            local.insert(PropertyName::Color, "Gray".to_string());
            local.insert(PropertyName::FontWeight, "bold".to_string());
        }
        "b" | "bold" | "strong" | "dfn" => {
            local.insert(PropertyName::FontWeight, "bold".to_string());
        }
        "u" | "underline" => {
            local.insert(PropertyName::TextDecorationUnderline, "true".to_string());
        }
        "font" => {
            if let Some(face) = node.attribute("face") {
                local.insert(PropertyName::FontFamily, face.to_string());
            }
            if let Some(size) = node.attribute("size").and_then(font_size_from_attribute) {
                local.insert(PropertyName::FontSize, size);
            }
            if let Some(color) = node.attribute("color") {
                local.insert(PropertyName::Color, color.to_string());
            }
        }
        "samp" | "pre" => {
            local.insert(PropertyName::FontFamily, MONOSPACE_FAMILY.to_string());
            local.insert(PropertyName::FontSize, SMALL_FONT_SIZE.to_string());
            local.insert(PropertyName::TextAlign, "Left".to_string());
        }
        "a" => {
            local.insert(PropertyName::Color, "Blue".to_string());
            local.insert(PropertyName::MouseOverColor, "Gray".to_string());
        }
        "p" => {
            if node.attribute("class") == Some("bold") {
                local.insert(PropertyName::FontWeight, "bold".to_string());
            }
        }
        "blockquote" => {
            local.insert(PropertyName::MarginLeft, "16".to_string());
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            let size = HEADING_FONT_SIZES[level.clamp(1, 6) - 1];
            local.insert(PropertyName::FontSize, size.to_string());
        }
        "ul" => {
            local.insert(PropertyName::ListStyleType, "disc".to_string());
        }
        "ol" => {
            local.insert(PropertyName::ListStyleType, "decimal".to_string());
        }
        _ => {}
    }

    if let Some(style) = node.attribute("style") {
        for (property, value) in parse_declarations(style) {
            apply_declaration(&mut local, &property, &value);
        }
    }

    let mut current = inherited.clone();
    current.extend(local.iter().map(|(k, v)| (*k, v.clone())));
    ElementProperties { current, local }
}

/// `<font size=N>`: scaled by four and clamped to `1..=1000`.
fn font_size_from_attribute(value: &str) -> Option<String> {
    let size = value.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(format_number((size * 4.0).clamp(1.0, 1000.0)))
}

/// Splits an inline style into lower-cased, trimmed `(name, value)` pairs.
pub fn parse_declarations(input: &str) -> Vec<(String, String)> {
    input
        .split(';')
        .filter_map(|pair| {
            let (n, v) = pair.split_once(':')?;
            let name = n.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            Some((name, v.trim().to_string()))
        })
        .collect()
}

/// Value of one declaration in an inline style, if present. Declarations
/// with more than one `:` are not considered.
pub fn css_value<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    style.split(';').find_map(|pair| {
        let mut parts = pair.split(':');
        let (n, v) = (parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        n.trim()
            .eq_ignore_ascii_case(property)
            .then_some(v.trim())
    })
}

const MARGIN_SIDES: [PropertyName; 4] = [
    PropertyName::MarginTop,
    PropertyName::MarginRight,
    PropertyName::MarginBottom,
    PropertyName::MarginLeft,
];
const PADDING_SIDES: [PropertyName; 4] = [
    PropertyName::PaddingTop,
    PropertyName::PaddingRight,
    PropertyName::PaddingBottom,
    PropertyName::PaddingLeft,
];
const BORDER_WIDTH_SIDES: [PropertyName; 4] = [
    PropertyName::BorderWidthTop,
    PropertyName::BorderWidthRight,
    PropertyName::BorderWidthBottom,
    PropertyName::BorderWidthLeft,
];
const BORDER_COLOR_SIDES: [PropertyName; 4] = [
    PropertyName::BorderColorTop,
    PropertyName::BorderColorRight,
    PropertyName::BorderColorBottom,
    PropertyName::BorderColorLeft,
];

fn apply_declaration(local: &mut PropertyMap, property: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let single = match property {
        "font-family" => Some((PropertyName::FontFamily, unquote(value))),
        "font-style" => Some((PropertyName::FontStyle, value)),
        "font-weight" => Some((PropertyName::FontWeight, value)),
        "font-size" => Some((PropertyName::FontSize, value)),
        "color" => Some((PropertyName::Color, value)),
        "background-color" => Some((PropertyName::BackgroundColor, value)),
        "text-indent" => Some((PropertyName::TextIndent, value)),
        "text-align" => Some((PropertyName::TextAlign, value)),
        "list-style-type" => Some((PropertyName::ListStyleType, value)),
        "margin-top" => Some((PropertyName::MarginTop, value)),
        "margin-right" => Some((PropertyName::MarginRight, value)),
        "margin-bottom" => Some((PropertyName::MarginBottom, value)),
        "margin-left" => Some((PropertyName::MarginLeft, value)),
        "padding-top" => Some((PropertyName::PaddingTop, value)),
        "padding-right" => Some((PropertyName::PaddingRight, value)),
        "padding-bottom" => Some((PropertyName::PaddingBottom, value)),
        "padding-left" => Some((PropertyName::PaddingLeft, value)),
        "border-top-width" => Some((PropertyName::BorderWidthTop, value)),
        "border-right-width" => Some((PropertyName::BorderWidthRight, value)),
        "border-bottom-width" => Some((PropertyName::BorderWidthBottom, value)),
        "border-left-width" => Some((PropertyName::BorderWidthLeft, value)),
        "border-top-color" => Some((PropertyName::BorderColorTop, value)),
        "border-right-color" => Some((PropertyName::BorderColorRight, value)),
        "border-bottom-color" => Some((PropertyName::BorderColorBottom, value)),
        "border-left-color" => Some((PropertyName::BorderColorLeft, value)),
        _ => None,
    };
    if let Some((name, value)) = single {
        local.insert(name, value.to_string());
        return;
    }

    match property {
        "text-decoration" => {
            let underline = value
                .split_ascii_whitespace()
                .any(|part| part.eq_ignore_ascii_case("underline"));
            local.insert(
                PropertyName::TextDecorationUnderline,
                underline.to_string(),
            );
        }
        "margin" => apply_sides(local, &MARGIN_SIDES, value),
        "padding" => apply_sides(local, &PADDING_SIDES, value),
        "border-width" => apply_sides(local, &BORDER_WIDTH_SIDES, value),
        "border-color" => apply_sides(local, &BORDER_COLOR_SIDES, value),
        _ => {}
    }
}

/// CSS box shorthand: 1 to 4 values in top, right, bottom, left order.
fn apply_sides(local: &mut PropertyMap, sides: &[PropertyName; 4], value: &str) {
    let parts: Vec<&str> = value.split_ascii_whitespace().collect();
    let [top, right, bottom, left] = match parts.as_slice() {
        [all] => [*all; 4],
        [vertical, horizontal] => [*vertical, *horizontal, *vertical, *horizontal],
        [top, horizontal, bottom] => [*top, *horizontal, *bottom, *horizontal],
        [top, right, bottom, left] => [*top, *right, *bottom, *left],
        _ => return,
    };
    for (side, value) in sides.iter().zip([top, right, bottom, left]) {
        local.insert(*side, value.to_string());
    }
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        value[1..value.len() - 1].trim()
    } else {
        value
    }
}

/// Length in pixels from `Npt`, `Npx` or a bare number. Percentages and
/// other units are rejected.
pub fn try_length_value(value: &str) -> Option<f64> {
    let value = value.trim().to_ascii_lowercase();
    let parsed = if let Some(points) = value.strip_suffix("pt") {
        points.trim().parse::<f64>().ok().map(|pt| pt * 96.0 / 72.0)
    } else if let Some(pixels) = value.strip_suffix("px") {
        pixels.trim().parse::<f64>().ok()
    } else {
        value.parse::<f64>().ok()
    };
    parsed.filter(|length| length.is_finite())
}

/// Shortest decimal form: `100`, `12.5`.
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

/// One, two (`left,top`) or four (`left,top,right,bottom`) values.
/// Zero and negative sides collapse to `0`.
pub fn compose_thickness(left: &str, right: &str, top: &str, bottom: &str) -> String {
    fn clamp(side: &str) -> &str {
        match side.chars().next() {
            None | Some('0') | Some('-') => "0",
            Some(_) => side,
        }
    }
    let (left, right, top, bottom) = (clamp(left), clamp(right), clamp(top), clamp(bottom));

    if left == right && top == bottom {
        if left == top {
            left.to_string()
        } else {
            format!("{left},{top}")
        }
    } else {
        format!("{left},{top},{right},{bottom}")
    }
}

fn marker_style(list_style_type: &str) -> &'static str {
    match list_style_type.to_ascii_lowercase().as_str() {
        "disc" => "Disc",
        "circle" => "Circle",
        "none" => "None",
        "square" => "Square",
        "box" => "Box",
        "lower-latin" => "LowerLatin",
        "upper-latin" => "UpperLatin",
        "lower-roman" => "LowerRoman",
        "upper-roman" => "UpperRoman",
        "decimal" => "Decimal",
        _ => "Disc",
    }
}

/// Writes `local` onto `target`. Block-only properties (indent, alignment,
/// margin, padding, borders) are skipped for inline targets and underline is
/// skipped for block targets.
pub fn apply_local_properties(target: &mut MarkupNode, local: &PropertyMap, is_block: bool) {
    struct Sides<'a> {
        set: bool,
        top: &'a str,
        right: &'a str,
        bottom: &'a str,
        left: &'a str,
    }

    impl<'a> Sides<'a> {
        fn new() -> Self {
            Self {
                set: false,
                top: "0",
                right: "0",
                bottom: "0",
                left: "0",
            }
        }

        fn compose(&self) -> Option<String> {
            self.set
                .then(|| compose_thickness(self.left, self.right, self.top, self.bottom))
        }
    }

    let mut margin = Sides::new();
    let mut padding = Sides::new();
    let mut border = Sides::new();
    let mut border_color: Option<&str> = None;

    for (name, value) in local {
        let value = value.as_str();
        match name {
            PropertyName::FontFamily => target.set_attribute("FontFamily", value),
            PropertyName::FontStyle => target.set_attribute("FontStyle", value),
            PropertyName::FontWeight => target.set_attribute("FontWeight", value),
            PropertyName::FontSize => target.set_attribute("FontSize", value),
            PropertyName::Color => target.set_attribute("Foreground", value),
            PropertyName::MouseOverColor => target.set_attribute("MouseOverForeground", value),
            PropertyName::BackgroundColor => target.set_attribute("Background", value),
            PropertyName::TextDecorationUnderline => {
                if !is_block && value == "true" {
                    target.set_attribute("TextDecorations", "Underline");
                }
            }
            PropertyName::TextIndent => {
                if is_block {
                    target.set_attribute("TextIndent", value);
                }
            }
            PropertyName::TextAlign => {
                if is_block {
                    target.set_attribute("TextAlignment", value);
                }
            }
            PropertyName::MarginTop => (margin.set, margin.top) = (true, value),
            PropertyName::MarginRight => (margin.set, margin.right) = (true, value),
            PropertyName::MarginBottom => (margin.set, margin.bottom) = (true, value),
            PropertyName::MarginLeft => (margin.set, margin.left) = (true, value),
            PropertyName::PaddingTop => (padding.set, padding.top) = (true, value),
            PropertyName::PaddingRight => (padding.set, padding.right) = (true, value),
            PropertyName::PaddingBottom => (padding.set, padding.bottom) = (true, value),
            PropertyName::PaddingLeft => (padding.set, padding.left) = (true, value),
            PropertyName::BorderWidthTop => (border.set, border.top) = (true, value),
            PropertyName::BorderWidthRight => (border.set, border.right) = (true, value),
            PropertyName::BorderWidthBottom => (border.set, border.bottom) = (true, value),
            PropertyName::BorderWidthLeft => (border.set, border.left) = (true, value),
            // sides are not distinguished; the last one wins
            PropertyName::BorderColorTop
            | PropertyName::BorderColorRight
            | PropertyName::BorderColorBottom
            | PropertyName::BorderColorLeft => border_color = Some(value),
            PropertyName::ListStyleType => {
                if target.tag == MarkupTag::List {
                    target.set_attribute("MarkerStyle", marker_style(value));
                }
            }
        }
    }

    if !is_block {
        return;
    }
    if let Some(thickness) = margin.compose() {
        target.set_attribute("Margin", thickness);
    }
    if let Some(thickness) = padding.compose() {
        target.set_attribute("Padding", thickness);
    }
    if let Some(color) = border_color {
        target.set_attribute("BorderBrush", color);
    }
    if let Some(thickness) = border.compose() {
        target.set_attribute("BorderThickness", thickness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(name: &str, attributes: &[(&str, &str)]) -> Node {
        Node::element(
            name,
            attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Vec::new(),
        )
    }

    #[test]
    fn tag_defaults() {
        let props = element_properties(&el("strong", &[]), &PropertyMap::new());
        assert_eq!(props.local.get(&PropertyName::FontWeight).map(String::as_str), Some("bold"));

        let props = element_properties(&el("h3", &[]), &PropertyMap::new());
        assert_eq!(props.local.get(&PropertyName::FontSize).map(String::as_str), Some("25"));

        let props = element_properties(&el("p", &[("class", "bold")]), &PropertyMap::new());
        assert_eq!(props.local.get(&PropertyName::FontWeight).map(String::as_str), Some("bold"));

        let props = element_properties(&el("p", &[("class", "other")]), &PropertyMap::new());
        assert!(props.local.is_empty(), "expected no local properties, got: {props:?}");
    }

    #[test]
    fn font_attributes_scale_and_clamp() {
        let props = element_properties(
            &el("font", &[("face", "Arial"), ("size", "3"), ("color", "red")]),
            &PropertyMap::new(),
        );
        assert_eq!(props.local.get(&PropertyName::FontFamily).map(String::as_str), Some("Arial"));
        assert_eq!(props.local.get(&PropertyName::FontSize).map(String::as_str), Some("12"));
        assert_eq!(props.local.get(&PropertyName::Color).map(String::as_str), Some("red"));

        let props = element_properties(&el("font", &[("size", "-2")]), &PropertyMap::new());
        assert_eq!(props.local.get(&PropertyName::FontSize).map(String::as_str), Some("1"));
        let props = element_properties(&el("font", &[("size", "big")]), &PropertyMap::new());
        assert!(props.local.get(&PropertyName::FontSize).is_none());
    }

    #[test]
    fn inline_style_overrides_tag_defaults() {
        let props = element_properties(
            &el("b", &[("style", "font-weight: normal; COLOR : red; float: left; margin: 1px 2px")]),
            &PropertyMap::new(),
        );
        assert_eq!(props.local.get(&PropertyName::FontWeight).map(String::as_str), Some("normal"));
        assert_eq!(props.local.get(&PropertyName::Color).map(String::as_str), Some("red"));
        assert_eq!(props.local.get(&PropertyName::MarginTop).map(String::as_str), Some("1px"));
        assert_eq!(props.local.get(&PropertyName::MarginLeft).map(String::as_str), Some("2px"));
        assert_eq!(props.local.len(), 6);
    }

    #[test]
    fn current_merges_local_over_inherited() {
        let mut inherited = PropertyMap::new();
        inherited.insert(PropertyName::FontStyle, "italic".to_string());
        inherited.insert(PropertyName::FontWeight, "normal".to_string());
        let props = element_properties(&el("b", &[]), &inherited);
        assert_eq!(props.current.get(&PropertyName::FontStyle).map(String::as_str), Some("italic"));
        assert_eq!(props.current.get(&PropertyName::FontWeight).map(String::as_str), Some("bold"));
        assert_eq!(props.local.len(), 1);
    }

    #[test]
    fn declarations_and_css_value() {
        let declarations = parse_declarations(" Width:100px ;;bogus; color:red");
        assert_eq!(
            declarations,
            vec![
                ("width".to_string(), "100px".to_string()),
                ("color".to_string(), "red".to_string()),
            ]
        );
        assert_eq!(css_value("color:red; WIDTH : 50pt", "width"), Some("50pt"));
        assert_eq!(css_value("color:red", "width"), None);
    }

    #[test]
    fn lengths() {
        assert_eq!(try_length_value("100"), Some(100.0));
        assert_eq!(try_length_value(" 20PX "), Some(20.0));
        assert_eq!(try_length_value("72pt"), Some(96.0));
        assert_eq!(try_length_value("50%"), None);
        assert_eq!(try_length_value("NaN"), None);
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(12.5), "12.5");
    }

    #[test]
    fn thickness_composition() {
        assert_eq!(compose_thickness("5", "5", "5", "5"), "5");
        assert_eq!(compose_thickness("5", "5", "2", "2"), "5,2");
        assert_eq!(compose_thickness("1", "3", "2", "4"), "1,2,3,4");
        assert_eq!(compose_thickness("-4", "0px", "0", "0"), "0");
        assert_eq!(compose_thickness("16", "0", "0", "0"), "16,0,0,0");
    }

    #[test]
    fn block_and_inline_application() {
        let mut local = PropertyMap::new();
        local.insert(PropertyName::TextAlign, "Center".to_string());
        local.insert(PropertyName::TextDecorationUnderline, "true".to_string());
        local.insert(PropertyName::MarginLeft, "16".to_string());
        local.insert(PropertyName::BorderColorTop, "red".to_string());
        local.insert(PropertyName::BorderColorLeft, "blue".to_string());

        let mut block = MarkupNode::new(MarkupTag::Paragraph);
        apply_local_properties(&mut block, &local, true);
        assert_eq!(block.attribute("TextAlignment"), Some("Center"));
        assert_eq!(block.attribute("TextDecorations"), None);
        assert_eq!(block.attribute("Margin"), Some("16,0,0,0"));
        assert_eq!(block.attribute("BorderBrush"), Some("blue"));

        let mut inline = MarkupNode::new(MarkupTag::Run);
        apply_local_properties(&mut inline, &local, false);
        assert_eq!(inline.attribute("TextDecorations"), Some("Underline"));
        assert_eq!(inline.attribute("TextAlignment"), None);
        assert_eq!(inline.attribute("Margin"), None);
    }

    #[test]
    fn marker_style_only_on_lists() {
        let mut local = PropertyMap::new();
        local.insert(PropertyName::ListStyleType, "Upper-Roman".to_string());

        let mut list = MarkupNode::new(MarkupTag::List).with_attribute("MarkerStyle", "Disc");
        apply_local_properties(&mut list, &local, true);
        assert_eq!(list.attribute("MarkerStyle"), Some("UpperRoman"));

        let mut paragraph = MarkupNode::new(MarkupTag::Paragraph);
        apply_local_properties(&mut paragraph, &local, true);
        assert!(!paragraph.has_attributes());

        local.insert(PropertyName::ListStyleType, "hebrew".to_string());
        apply_local_properties(&mut list, &local, true);
        assert_eq!(list.attribute("MarkerStyle"), Some("Disc"));
    }
}
