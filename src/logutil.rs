//! Helpers for keeping user-authored text (quest names, descriptions, usernames)
//! on a single log line.

/// Longest preview written to a log line; anything longer is cut with an ellipsis.
pub const MAX_LOG_PREVIEW: usize = 120;

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
/// - other control characters => `\\xNN`
///
/// Output is capped at [`MAX_LOG_PREVIEW`] characters of input.
pub fn escape_log(s: &str) -> String {
    escape_log_with_limit(s, MAX_LOG_PREVIEW)
}

pub fn escape_log_with_limit(s: &str, limit: usize) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(s.len().min(limit) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= limit {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape_log("Quest\nName\r\tEnd"), "Quest\\nName\\r\\tEnd");
        assert_eq!(escape_log("a\\b\u{7}"), "a\\\\b\\x07");
    }

    #[test]
    fn truncates_long_text() {
        let long = "x".repeat(MAX_LOG_PREVIEW + 10);
        let escaped = escape_log(&long);
        assert!(escaped.ends_with('…'));
        assert_eq!(escaped.chars().count(), MAX_LOG_PREVIEW + 1);
        assert_eq!(escape_log_with_limit("hunter", 3), "hun…");
    }
}
