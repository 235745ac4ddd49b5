//! Markup sanitizer for chat content

use crate::domain::traits::Sanitizer;

/// Strips every markup tag and escapes what is left.
///
/// Script and style blocks and comments are removed with their contents.
/// A `<` that does not open a tag is kept as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupStripper;

impl Sanitizer for MarkupStripper {
    fn clean(&self, input: &str) -> String {
        let text = remove_blocks(input, "<script", "</script>");
        let text = remove_blocks(&text, "<style", "</style>");
        let text = remove_blocks(&text, "<!--", "-->");
        escape(&strip_tags(&text)).trim().to_string()
    }
}

/// Remove every `open ... close` span, matching ASCII case-insensitively
fn remove_blocks(text: &str, open: &str, close: &str) -> String {
    let mut text = text.to_string();

    loop {
        // ASCII lowercasing keeps byte offsets aligned with `text`.
        let lower = text.to_ascii_lowercase();
        let Some(start) = lower.find(open) else {
            break;
        };
        let Some(len) = lower[start..].find(close) else {
            break;
        };
        text.replace_range(start..start + len + close.len(), "");
    }

    text
}

fn starts_tag(next: Option<char>) -> bool {
    matches!(next, Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?')
}

fn strip_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch == '<' && starts_tag(chars.peek().map(|(_, c)| *c)) {
            if let Some(end) = text[idx..].find('>') {
                while matches!(chars.peek(), Some((i, _)) if *i <= idx + end) {
                    chars.next();
                }
                continue;
            }
        }
        result.push(ch);
    }

    result
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
