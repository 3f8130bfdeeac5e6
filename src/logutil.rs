//! Log sanitization for configuration-sourced strings.
//!
//! Titles come straight out of the rule configuration and may carry newlines or
//! control characters that would break single-line log output.

/// Render a string safe for one log line: control characters are escaped and
/// long values are cut with an ellipsis. Titles are short display strings, so
/// the preview cap is tight.
pub fn log_preview(s: &str) -> String {
    const MAX_PREVIEW: usize = 120;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    for (i, ch) in s.chars().enumerate() {
        if i >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::log_preview;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(log_preview("Senior\nStaff"), "Senior\\nStaff");
        assert_eq!(log_preview("a\tb\rc"), "a\\tb\\rc");
        assert_eq!(log_preview("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn truncates_long_values() {
        let long = "t".repeat(500);
        let preview = log_preview(&long);
        assert!(preview.ends_with('…'));
        assert!(preview.chars().count() <= 121);
    }
}
