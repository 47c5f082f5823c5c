// ABOUTME: Plain-text helpers for episode descriptions that carry simple markup.
// ABOUTME: Strips tags and decodes common entities to produce itunes:summary text.

use crate::validate::is_xml_char;

/// Named entities seen in hand-written descriptions.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&ndash;", "\u{2013}"),
    ("&mdash;", "\u{2014}"),
    ("&lsquo;", "\u{2018}"),
    ("&rsquo;", "\u{2019}"),
    ("&ldquo;", "\u{201C}"),
    ("&rdquo;", "\u{201D}"),
    ("&hellip;", "\u{2026}"),
];

/// True if the text contains at least one tag (`<p>`, `</b>`, `<!-- -->`).
///
/// A bare `<` or `&` in prose ("under <10%", "R&D") is not markup.
pub fn has_markup(s: &str) -> bool {
    s.as_bytes()
        .windows(2)
        .any(|pair| pair[0] == b'<' && opens_tag(char::from(pair[1])))
}

/// Strips HTML tags from a string, returning plain text with collapsed whitespace.
/// A `<` only starts a tag when followed by a letter, `/`, or `!`.
pub fn strip_html(s: &str) -> String {
    let mut text = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    let mut in_tag = false;

    while let Some(c) = chars.next() {
        if in_tag {
            in_tag = c != '>';
            continue;
        }
        if c == '<' && matches!(chars.peek(), Some(&next) if opens_tag(next)) {
            in_tag = true;
            // Block-level tags separate words.
            text.push(' ');
        } else {
            text.push(c);
        }
    }

    collapse_whitespace(&decode_entities(&text))
}

fn opens_tag(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '/' || c == '!'
}

/// Decodes the common named entities plus decimal and hex character references.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some((entity, replacement)) = NAMED_ENTITIES
            .iter()
            .find(|(entity, _)| rest.starts_with(entity))
        {
            out.push_str(replacement);
            rest = &rest[entity.len()..];
            continue;
        }

        match decode_char_reference(rest) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Decodes `&#123;` / `&#x7B;` at the start of `s`, returning the char and bytes consumed.
fn decode_char_reference(s: &str) -> Option<(char, usize)> {
    let body = s.strip_prefix("&#")?;
    let end = body.find(';')?;
    let digits = &body[..end];

    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };

    let decoded = char::from_u32(code).filter(|c| is_xml_char(*c))?;
    Some((decoded, 2 + end + 1))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_basic() {
        assert_eq!(strip_html("<p>Hello</p>"), "Hello");
        assert_eq!(
            strip_html("<b>Bold</b> and <i>italic</i>"),
            "Bold and italic"
        );
    }

    #[test]
    fn test_strip_html_separates_blocks() {
        assert_eq!(strip_html("<p>Hello</p><p>World</p>"), "Hello World");
        assert_eq!(strip_html("Multiple   spaces\n\nhere"), "Multiple spaces here");
    }

    #[test]
    fn test_strip_html_decodes_entities_after_tags() {
        assert_eq!(strip_html("<p>Tom &amp; Jerry</p>"), "Tom & Jerry");
        assert_eq!(strip_html("&lt;script&gt;"), "<script>");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("&quot;test&quot;"), "\"test\"");
        assert_eq!(decode_entities("&#38;&#x26;"), "&&");
        assert_eq!(decode_entities("&#xA9; 2024"), "\u{a9} 2024");
        assert_eq!(decode_entities("R&D"), "R&D");
        assert_eq!(decode_entities("&#zz;"), "&#zz;");
    }

    #[test]
    fn test_references_to_forbidden_characters_stay_literal() {
        assert_eq!(decode_entities("a&#0;b"), "a&#0;b");
        assert_eq!(decode_entities("&#x1B;[0m"), "&#x1B;[0m");
        assert_eq!(strip_html("<p>x&#12;y</p>"), "x&#12;y");
    }

    #[test]
    fn test_stray_angle_brackets_are_text() {
        assert_eq!(
            strip_html("Margin <10% today vs >20% target"),
            "Margin <10% today vs >20% target"
        );
        assert_eq!(strip_html("<p>3 < 5</p>"), "3 < 5");
    }

    #[test]
    fn test_has_markup() {
        assert!(has_markup("<p>x</p>"));
        assert!(has_markup("line<br/>break"));
        assert!(has_markup("<!-- note -->"));
        assert!(!has_markup("Q&amp;A"));
        assert!(!has_markup("Margin <10% vs >20%"));
        assert!(!has_markup("Plain strategy overview"));
    }
}
