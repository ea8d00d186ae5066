//! Clipboard HTML framing (`CF_HTML`).
//!
//! The header is ASCII with six zero-padded ten-digit byte offsets into the
//! whole clipboard string:
//!
//! ```text
//! Version:1.0
//! StartHTML:0000000157
//! EndHTML:..........
//! StartFragment:....
//! EndFragment:......
//! StartSelection:...
//! EndSelection:.....
//! ```
use std::fmt::Write;

use memchr::memmem;

use crate::error::{ClipboardHeaderError, UNRECOGNIZED_HEADER};

pub const START_FRAGMENT_COMMENT: &str = "<!--StartFragment-->";
pub const END_FRAGMENT_COMMENT: &str = "<!--EndFragment-->";

/// Length of the header written by [`add_html_clipboard_header`].
pub const HEADER_LEN: usize = 157;

const OFFSET_DIGITS: usize = 10;

/// Prefixes `html` with a header. Fragment offsets point inside the
/// fragment comments when present and span the whole payload otherwise.
pub fn add_html_clipboard_header(html: &str) -> String {
    let start_html = HEADER_LEN;
    let end_html = start_html + html.len();
    let start_fragment = memmem::find(html.as_bytes(), START_FRAGMENT_COMMENT.as_bytes())
        .map_or(start_html, |at| start_html + at + START_FRAGMENT_COMMENT.len());
    let end_fragment = memmem::find(html.as_bytes(), END_FRAGMENT_COMMENT.as_bytes())
        .map_or(end_html, |at| start_html + at);

    let mut out = String::with_capacity(end_html);
    let _ = write!(
        out,
        "Version:1.0\r\n\
         StartHTML:{start_html:010}\r\n\
         EndHTML:{end_html:010}\r\n\
         StartFragment:{start_fragment:010}\r\n\
         EndFragment:{end_fragment:010}\r\n\
         StartSelection:{start_fragment:010}\r\n\
         EndSelection:{end_fragment:010}\r\n"
    );
    debug_assert_eq!(out.len(), HEADER_LEN);
    out.push_str(html);
    out
}

/// The `StartHTML..EndHTML` payload. `EndHTML` past the end of `data` is
/// clamped.
pub fn extract_html_from_clipboard_data(data: &str) -> Result<&str, ClipboardHeaderError> {
    let start = read_offset(data, "StartHTML:").ok_or(ClipboardHeaderError::MissingStartHtml)??;
    let end = read_offset(data, "EndHTML:").ok_or(ClipboardHeaderError::MissingEndHtml)??;
    slice_range(data, start, end)
}

/// Same as [`extract_html_from_clipboard_data`] with failures reported as
/// [`UNRECOGNIZED_HEADER`].
pub fn extract_html_or_sentinel(data: &str) -> String {
    match extract_html_from_clipboard_data(data) {
        Ok(html) => html.to_string(),
        Err(err) => {
            log::debug!(target: "markup.clipboard", "unrecognized clipboard header: {err:?}");
            UNRECOGNIZED_HEADER.to_string()
        }
    }
}

/// The `StartFragment..EndFragment` range, i.e. the selection without its
/// surrounding context.
pub fn fragment_from_clipboard_data(data: &str) -> Result<&str, ClipboardHeaderError> {
    let start =
        read_offset(data, "StartFragment:").ok_or(ClipboardHeaderError::MissingStartFragment)??;
    let end = read_offset(data, "EndFragment:").ok_or(ClipboardHeaderError::MissingEndFragment)??;
    slice_range(data, start, end)
}

/// `None` when the label is absent, `Some(Err)` when the digits after it are
/// not a number.
fn read_offset(data: &str, label: &str) -> Option<Result<usize, ClipboardHeaderError>> {
    let at = memmem::find(data.as_bytes(), label.as_bytes())?;
    let digits_start = at + label.len();
    let parsed = data
        .get(digits_start..digits_start + OFFSET_DIGITS)
        .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<usize>().ok())
        .ok_or(ClipboardHeaderError::BadOffset);
    Some(parsed)
}

fn slice_range(data: &str, start: usize, end: usize) -> Result<&str, ClipboardHeaderError> {
    let end = end.min(data.len());
    if start > data.len() || start > end {
        return Err(ClipboardHeaderError::OffsetOutOfRange);
    }
    data.get(start..end).ok_or(ClipboardHeaderError::BadOffset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_offsets_without_markers() {
        let data = add_html_clipboard_header("<p>x</p>");
        assert!(
            data.starts_with(
                "Version:1.0\r\nStartHTML:0000000157\r\nEndHTML:0000000165\r\n\
                 StartFragment:0000000157\r\nEndFragment:0000000165\r\n"
            ),
            "unexpected header: {data:?}"
        );
        assert_eq!(extract_html_from_clipboard_data(&data), Ok("<p>x</p>"));
    }

    #[test]
    fn fragment_offsets_follow_markers() {
        let html = "<b><!--StartFragment-->sel<!--EndFragment--></b>";
        let data = add_html_clipboard_header(html);
        assert_eq!(fragment_from_clipboard_data(&data), Ok("sel"));
        assert!(data.contains("StartSelection:0000000180\r\n"), "got: {data:?}");
    }

    #[test]
    fn byte_offsets_with_multibyte_payload() {
        let html = "<p>héllo ✓</p>";
        let data = add_html_clipboard_header(html);
        assert_eq!(extract_html_from_clipboard_data(&data), Ok(html));
    }

    #[test]
    fn malformed_headers() {
        let err = extract_html_from_clipboard_data("<p>no header</p>");
        assert!(
            matches!(err, Err(ClipboardHeaderError::MissingStartHtml)),
            "expected MissingStartHtml, got: {err:?}"
        );

        let err = extract_html_from_clipboard_data("StartHTML:00000x0001\r\nEndHTML:0000000010");
        assert!(
            matches!(err, Err(ClipboardHeaderError::BadOffset)),
            "expected BadOffset, got: {err:?}"
        );

        let err = extract_html_from_clipboard_data("StartHTML:0000000100\r\n");
        assert!(
            matches!(err, Err(ClipboardHeaderError::MissingEndHtml)),
            "expected MissingEndHtml, got: {err:?}"
        );

        let err = extract_html_from_clipboard_data("StartHTML:0000009999\r\nEndHTML:0000009999\r\n");
        assert!(
            matches!(err, Err(ClipboardHeaderError::OffsetOutOfRange)),
            "expected OffsetOutOfRange, got: {err:?}"
        );

        assert_eq!(extract_html_or_sentinel("garbage"), UNRECOGNIZED_HEADER);
    }

    #[test]
    fn missing_fragment_labels_are_named() {
        let err = fragment_from_clipboard_data("StartHTML:0000000010\r\nEndHTML:0000000020\r\n");
        assert!(
            matches!(err, Err(ClipboardHeaderError::MissingStartFragment)),
            "expected MissingStartFragment, got: {err:?}"
        );

        let err = fragment_from_clipboard_data("StartFragment:0000000010\r\npayload");
        assert!(
            matches!(err, Err(ClipboardHeaderError::MissingEndFragment)),
            "expected MissingEndFragment, got: {err:?}"
        );
    }

    #[test]
    fn end_offset_is_clamped() {
        let data = "StartHTML:0000000042\r\nEndHTML:0000099999\r\npayload";
        assert_eq!(extract_html_from_clipboard_data(data), Ok("payload"));
    }
}
