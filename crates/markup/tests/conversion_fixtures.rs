use std::path::{Path, PathBuf};

use markup::{
    ConverterConfig, MarkupContent, MarkupNode, MarkupTag, OutputMode, convert_html_to_markup,
    convert_html_to_tree,
};
use markup_test_support::{
    ConversionCase, FixtureMode, diff_lines, load_conversion_cases, split_markup_lines,
};

const DOCUMENT_OPEN: &str = "<FlowDocument xml:space=\"preserve\">";
const DOCUMENT_CLOSE: &str = "</FlowDocument>";

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn config_for(case: &ConversionCase) -> ConverterConfig {
    let output = match case.mode {
        FixtureMode::Document => OutputMode::Document,
        FixtureMode::Inline => OutputMode::InlineFragment,
    };
    let mut config = ConverterConfig::default()
        .with_namespace(None)
        .with_output(output)
        .with_line_breaks(case.line_breaks)
        .with_single_cell_unwrap(case.unwrap_single_cell);
    if let Some(size) = case.block_max_size {
        config = config.with_block_max_size(size);
    }
    config
}

/// Document output is compared without its root element; inline fragments
/// are compared whole.
fn comparable(case: &ConversionCase, xml: String) -> String {
    if case.mode == FixtureMode::Inline {
        return xml;
    }
    xml.strip_prefix(DOCUMENT_OPEN)
        .and_then(|rest| rest.strip_suffix(DOCUMENT_CLOSE))
        .map(str::to_string)
        .unwrap_or(xml)
}

#[test]
fn conversion_fixtures_match() {
    let cases = load_conversion_cases(&fixtures_dir().join("conversion.toml"));
    let mut failures = Vec::new();

    for case in &cases {
        let config = config_for(case);
        let actual = match convert_html_to_markup(&case.html, &config) {
            Ok(xml) => comparable(case, xml),
            Err(err) => {
                failures.push(format!("{}: conversion failed: {err}", case.name));
                continue;
            }
        };
        if actual != case.expected {
            let report = diff_lines(
                &split_markup_lines(&case.expected),
                &split_markup_lines(&actual),
            );
            failures.push(format!("{}:\n{report}", case.name));
        }
    }

    assert!(
        failures.is_empty(),
        "{} of {} conversion fixture(s) failed:\n{}",
        failures.len(),
        cases.len(),
        failures.join("\n")
    );
}

fn collect_tags(node: &MarkupNode, out: &mut Vec<MarkupTag>) {
    out.push(node.tag.clone());
    for child in &node.children {
        if let MarkupContent::Element(element) = child {
            collect_tags(element, out);
        }
    }
}

fn tags(html: &str) -> Vec<MarkupTag> {
    let config = ConverterConfig::default().with_namespace(None);
    let tree = convert_html_to_tree(html, &config).expect("conversion");
    let mut out = Vec::new();
    collect_tags(&tree, &mut out);
    out
}

#[test]
fn div_without_block_children_never_becomes_a_section() {
    for html in ["<div>a</div>", "<div><b>a</b> <i>b</i></div>", "<div style=\"color:red\">a</div>"] {
        let found = tags(html);
        assert!(
            !found.contains(&MarkupTag::Section) && found.contains(&MarkupTag::Paragraph),
            "expected a paragraph for {html}, got: {found:?}"
        );
    }
}

#[test]
fn every_list_item_is_wrapped_in_a_list() {
    for html in ["<li>a</li>", "<p>x</p><li>a<li>b", "<ul><li>a</ul><li>b"] {
        let config = ConverterConfig::default().with_namespace(None);
        let tree = convert_html_to_tree(html, &config).expect("conversion");

        fn check(node: &MarkupNode, path: &str) {
            for child in &node.children {
                if let MarkupContent::Element(element) = child {
                    assert!(
                        element.tag != MarkupTag::ListItem || node.tag == MarkupTag::List,
                        "list item outside a list at {path}"
                    );
                    check(element, &format!("{path}/{}", element.tag));
                }
            }
        }
        check(&tree, "root");
    }
}

#[test]
fn namespace_and_space_preserve_are_set_on_the_root() {
    let xml = convert_html_to_markup("<p>x</p>", &ConverterConfig::default()).expect("conversion");
    assert!(
        xml.starts_with(
            "<FlowDocument xml:space=\"preserve\" \
             xmlns=\"http://schemas.microsoft.com/winfx/2006/xaml/presentation\">"
        ),
        "unexpected root: {xml}"
    );
}

#[test]
fn empty_input_gives_an_empty_root() {
    let config = ConverterConfig::default().with_namespace(None);
    for html in ["", "   ", "<!DOCTYPE html>", "<html><body></body></html>"] {
        let xml = convert_html_to_markup(html, &config).expect("conversion");
        assert_eq!(xml, "<FlowDocument xml:space=\"preserve\" />", "input: {html:?}");
    }
}

#[test]
fn converting_twice_gives_the_same_output() {
    let config = ConverterConfig::default().with_namespace(None);
    let html = markup::perf_fixtures::make_blocks(3);
    let first = convert_html_to_markup(&html, &config).expect("conversion");
    let second = convert_html_to_markup(&html, &config).expect("conversion");
    assert_eq!(first, second);
}
