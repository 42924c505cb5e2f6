//! Markup to plain-text normalization for documentation descriptions.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Block-level tags that separate words.
static BREAK_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?p\b[^>]*>|<br\s*/?>").expect("valid regex"));

/// Inline code markers, rendered as backticks.
static CODE_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?code\b[^>]*>").expect("valid regex"));

/// Any remaining tag or comment. A bare `<` followed by a space is text.
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z][^>]*>").expect("valid regex"));

static CHAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6}|[A-Za-z]{2,8});").expect("valid regex")
});

/// Strips markup from a raw description.
///
/// Never fails: malformed markup is left as best-effort text and an empty
/// input yields an empty string.
pub fn normalize(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }

    let text = BREAK_TAGS.replace_all(markup, " ");
    let text = CODE_TAGS.replace_all(&text, "`");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_char_refs(&text);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes an optional field; a missing description becomes empty.
pub fn normalize_opt(markup: Option<&str>) -> String {
    markup.map(normalize).unwrap_or_default()
}

fn decode_char_refs(text: &str) -> Cow<'_, str> {
    CHAR_REF.replace_all(text, |caps: &Captures<'_>| {
        let body = &caps[1];
        decode_one(body).map_or_else(|| caps[0].to_string(), String::from)
    })
}

fn decode_one(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }

    let c = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "times" => '\u{d7}',
        "pi" => '\u{3c0}',
        _ => return None,
    };
    Some(c)
}
