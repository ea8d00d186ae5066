//! Fixture loading and failure reporting for the markup integration tests.
use std::fmt::Write;
use std::fs;
use std::path::Path;

use serde::Deserialize;

const MISSING_LINE: &str = "<missing>";

/// Which output mode a conversion fixture runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureMode {
    #[default]
    Document,
    Inline,
}

/// One `[[case]]` table of a conversion fixture file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionCase {
    pub name: String,
    pub html: String,
    pub expected: String,
    #[serde(default)]
    pub mode: FixtureMode,
    #[serde(default)]
    pub line_breaks: bool,
    #[serde(default = "default_unwrap_single_cell")]
    pub unwrap_single_cell: bool,
    #[serde(default)]
    pub block_max_size: Option<usize>,
}

fn default_unwrap_single_cell() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ConversionFile {
    #[serde(rename = "case", default)]
    cases: Vec<ConversionCase>,
}

/// Expected token stream for one lexer input, one `Kind(text)` line per token.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenCase {
    pub name: String,
    pub input: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TokenFile {
    cases: Vec<TokenCase>,
}

fn read_fixture(path: &Path) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {err}", path.display()))
}

pub fn load_conversion_cases(path: &Path) -> Vec<ConversionCase> {
    let content = read_fixture(path);
    let file: ConversionFile = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
    assert!(
        !file.cases.is_empty(),
        "no [[case]] entries in {}",
        path.display()
    );
    file.cases
}

pub fn load_token_cases(path: &Path) -> Vec<TokenCase> {
    let content = read_fixture(path);
    let file: TokenFile = serde_json::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
    file.cases
}

/// Escapes quotes, backslashes and control characters so a token's text
/// fits on one line.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                let _ = write!(out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Splits serialized markup after every `>` so diffs point at a single tag.
pub fn split_markup_lines(xml: &str) -> Vec<String> {
    xml.split_inclusive('>').map(str::to_string).collect()
}

/// Describes the first differing line with two lines of context on each side.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let line = |lines: &[String], idx: usize| {
        lines
            .get(idx)
            .map_or(MISSING_LINE, String::as_str)
            .to_string()
    };
    let total = expected.len().max(actual.len());
    let first = (0..total).find(|&idx| line(expected, idx) != line(actual, idx));

    let mut out = String::new();
    match first {
        Some(idx) => {
            let from = idx.saturating_sub(2);
            let to = (idx + 3).min(total);
            let _ = writeln!(out, "first mismatch at line {}:", idx + 1);
            for at in from..to {
                let marker = if at == idx { '>' } else { ' ' };
                let _ = writeln!(out, "{marker} {:>4}  expected: {}", at + 1, line(expected, at));
                let _ = writeln!(out, "{marker} {:>4}    actual: {}", at + 1, line(actual, at));
            }
        }
        None if expected.len() != actual.len() => {
            let _ = writeln!(out, "common prefix matched but lengths differ");
        }
        None => {}
    }
    let _ = writeln!(
        out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}
