//! Logging helpers for player input, narrative text and host session data.
//!
//! Narrative replies are long and multi-line; `escape_log` keeps each log record on
//! a single line. `redact` is used for `initData`, which is a signed credential and
//! must never reach a log file verbatim.

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///
/// Strings longer than `MAX_PREVIEW` characters are cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 200;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW * 4) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
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

/// Keep only a short prefix of a secret plus its length, e.g. `query_id=A…(212 chars)`.
pub fn redact(secret: &str) -> String {
    const KEEP: usize = 10;
    let total = secret.chars().count();
    if total == 0 {
        return "<empty>".to_string();
    }
    let prefix: String = secret.chars().take(KEEP.min(total / 2)).collect();
    format!("{}…({} chars)", escape_log(&prefix), total)
}
