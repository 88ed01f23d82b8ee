//! Small XML helpers shared by the package reader and writer.

use quick_xml::events::attributes::Attributes;
use quick_xml::events::BytesStart;

/// Escapes text for use in element content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters are invalid in XML 1.0.
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

/// Resolves the predefined and numeric entities.
///
/// Unknown entities are kept verbatim.
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';') {
            Some(semi) => match resolve_entity(&after[..semi]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &after[semi + 1..];
                }
                None => {
                    out.push('&');
                    rest = after;
                }
            },
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolves an entity name (without `&` and `;`) to its character.
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Reads an attribute by local name, unescaped.
pub fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    find_attr(e.attributes(), name)
}

fn find_attr(attrs: Attributes<'_>, name: &[u8]) -> Option<String> {
    for attr in attrs.flatten() {
        if attr.key.local_name().as_ref() == name {
            return Some(unescape(&String::from_utf8_lossy(&attr.value)));
        }
    }
    None
}

/// Reads an integer attribute.
pub fn attr_i64(e: &BytesStart<'_>, name: &[u8]) -> Option<i64> {
    attr(e, name).and_then(|v| v.trim().parse().ok())
}

/// Returns the text between `<{tag}` and its closing tag, for simple
/// one-off lookups in generated parts.
pub fn element_span<'a>(xml: &'a str, tag: &str) -> Option<(usize, usize)> {
    let open = format!("<{tag}");
    let start = xml.find(&open)?;
    let close = format!("</{tag}>");
    match xml[start..].find(&close) {
        Some(rel) => Some((start, start + rel + close.len())),
        None => {
            // Self-closing form.
            let end = xml[start..].find("/>")?;
            Some((start, start + end + 2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_roundtrip_entities() {
        let raw = "R&D <growth> \"fast\" 'now'";
        assert_eq!(unescape(&escape(raw)), raw);
    }

    #[test]
    fn test_escape_drops_control_chars() {
        assert_eq!(escape("a\u{1}b\tc"), "ab\tc");
    }

    #[test]
    fn test_unescape_numeric_and_unknown() {
        assert_eq!(unescape("&#8364;5 &#x41; &nbsp;"), "€5 A &nbsp;");
        assert_eq!(unescape("a & b"), "a & b");
    }

    #[test]
    fn test_element_span() {
        let xml = "<a><p:sldIdLst><p:sldId id=\"256\"/></p:sldIdLst></a>";
        let (s, e) = element_span(xml, "p:sldIdLst").unwrap();
        assert_eq!(&xml[s..e], "<p:sldIdLst><p:sldId id=\"256\"/></p:sldIdLst>");
        let empty = "<a><p:sldIdLst/></a>";
        let (s, e) = element_span(empty, "p:sldIdLst").unwrap();
        assert_eq!(&empty[s..e], "<p:sldIdLst/>");
    }
}
