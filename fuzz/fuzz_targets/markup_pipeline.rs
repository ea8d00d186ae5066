#![no_main]

use libfuzzer_sys::fuzz_target;
use markup::{ConverterConfig, convert_html_to_markup, tokenize};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if let Err(err) = tokenize(input) {
        panic!("lexer invariant violated: {err}");
    }

    // small budget so pagination and batching run on short inputs too
    let document = ConverterConfig::default().with_block_max_size(64);
    if let Err(err) = convert_html_to_markup(input, &document) {
        panic!("document conversion failed: {err}");
    }
    if let Err(err) = convert_html_to_markup(input, &ConverterConfig::inline_fragment()) {
        panic!("inline conversion failed: {err}");
    }
});
