//! XML escaping utilities.

use std::borrow::Cow;

/// Escape text content: `&` `<` `>`.
pub(crate) fn escape_text(raw: &str) -> Cow<'_, str> {
    escape_impl(raw, false)
}

/// Escape an attribute value: `&` `<` `>` `"`.
pub(crate) fn escape_attr(raw: &str) -> Cow<'_, str> {
    escape_impl(raw, true)
}

fn escape_impl(raw: &str, escape_quotes: bool) -> Cow<'_, str> {
    let needs_escaping =
        |c: char| matches!(c, '&' | '<' | '>') || (escape_quotes && c == '"');
    if !raw.chars().any(needs_escaping) {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if escape_quotes => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
