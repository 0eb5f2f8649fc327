//! Text utilities for Telegram MarkdownV2 output.

use chrono::NaiveDateTime;

/// Characters MarkdownV2 treats as markup in regular text.
const SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape MarkdownV2 special characters.
///
/// Single left-to-right pass: each special character gets one backslash
/// prefix, and inserted backslashes are never re-scanned. Callers must apply
/// this exactly once per formatting pass.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if SPECIAL.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Fixed sentinel rendered in place of a deadline that failed to parse.
pub const INVALID_DATE: &str = "invalid date";

const DEADLINE_INPUT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const DEADLINE_OUTPUT: &str = "%-d %B %Y";

/// Render an ISO-8601 deadline (`2024-03-05T00:00:00.000Z`) as a long-form
/// date (`5 March 2024`).
///
/// Inputs shorter than 10 characters or failing to parse yield
/// [`INVALID_DATE`]; this function never errors.
pub fn format_deadline(deadline: &str) -> String {
    if deadline.len() < 10 {
        return INVALID_DATE.to_string();
    }
    match NaiveDateTime::parse_from_str(deadline, DEADLINE_INPUT) {
        Ok(dt) => dt.format(DEADLINE_OUTPUT).to_string(),
        Err(_) => INVALID_DATE.to_string(),
    }
}
