//! Display-text sanitization.
//!
//! Message content comes back from a remote service and is rendered
//! verbatim into the terminal; control sequences must never reach the
//! screen buffer.

/// Strip control characters from untrusted text before display.
///
/// Newlines and tabs are kept (tabs become four spaces so column math
/// stays predictable); every other control character, including ANSI
/// escape introducers, is dropped.
pub fn sanitize_display_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\n' => out.push('\n'),
            '\t' => out.push_str("    "),
            '\r' => {}
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_text() {
        assert_eq!(sanitize_display_text("hello world"), "hello world");
    }

    #[test]
    fn strips_ansi_escape() {
        assert_eq!(sanitize_display_text("a\x1b[31mred\x1b[0mb"), "a[31mred[0mb");
    }

    #[test]
    fn keeps_newlines_expands_tabs() {
        assert_eq!(sanitize_display_text("a\tb\nc\r\n"), "a    b\nc\n");
    }
}
