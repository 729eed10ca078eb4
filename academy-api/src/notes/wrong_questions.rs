//! Wrong-question list parsing
//!
//! Score records keep incorrectly answered question numbers as free text
//! typed by staff, e.g. `"3,7,15"`, `"3, 7 ,15"` or `"3번, 7번"`.

use std::collections::BTreeSet;

/// Parse a comma-separated wrong-question field into a set of question numbers
///
/// Each token is trimmed and read like JavaScript `parseInt`: an optional
/// sign followed by leading decimal digits, trailing characters ignored.
/// Tokens without leading digits, values that overflow, and values `<= 0`
/// are dropped.
pub fn parse_wrong_questions(text: &str) -> BTreeSet<i64> {
    text.split(',')
        .filter_map(|token| parse_leading_int(token.trim()))
        .filter(|n| *n > 0)
        .collect()
}

fn parse_leading_int(token: &str) -> Option<i64> {
    let (negative, rest) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    let value: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -value } else { value })
}
