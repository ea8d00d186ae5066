#![no_main]

use libfuzzer_sys::fuzz_target;
use markup::clipboard::{
    add_html_clipboard_header, extract_html_from_clipboard_data, extract_html_or_sentinel,
    fragment_from_clipboard_data,
};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // arbitrary clipboard contents must never panic
    let _ = extract_html_or_sentinel(input);
    let _ = fragment_from_clipboard_data(input);

    let framed = add_html_clipboard_header(input);
    assert_eq!(extract_html_from_clipboard_data(&framed), Ok(input));
});
