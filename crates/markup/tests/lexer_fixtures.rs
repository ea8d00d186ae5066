use std::path::Path;

use markup::{Token, tokenize};
use markup_test_support::{diff_lines, escape_text, load_token_cases};

fn format_token(token: &Token) -> String {
    format!("{:?}({})", token.kind, escape_text(&token.text))
}

#[test]
fn lexer_token_fixtures() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("lexer_tokens.json");
    let cases = load_token_cases(&path);
    assert!(!cases.is_empty(), "no lexer cases in {}", path.display());

    for case in &cases {
        let tokens = match tokenize(&case.input) {
            Ok(tokens) => tokens,
            Err(err) => panic!("{}: lexer failed: {err}", case.name),
        };
        let actual: Vec<String> = tokens.iter().map(format_token).collect();
        assert!(
            actual == case.tokens,
            "{} ({:?}):\n{}",
            case.name,
            case.input,
            diff_lines(&case.tokens, &actual)
        );
    }
}

#[test]
fn arbitrary_input_always_ends_with_end_of_stream() {
    for input in [
        "<",
        "</",
        "<a",
        "<a href=",
        "<a href='unterminated",
        "<!--",
        "<!-- x -",
        "<![CDATA[",
        "<?xml",
        "&",
        "&#",
        "&#12",
        "&amp",
        "<p/",
        "</p",
    ] {
        let tokens = match tokenize(input) {
            Ok(tokens) => tokens,
            Err(err) => panic!("lexer failed on {input:?}: {err}"),
        };
        assert!(
            matches!(tokens.last(), Some(Token { kind: markup::TokenKind::EndOfStream, .. })),
            "expected trailing EndOfStream for {input:?}, got: {tokens:?}"
        );
    }
}
