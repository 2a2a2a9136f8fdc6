//! Per-page translation tables embedded in templates.
//!
//! Two shapes are recognised:
//!
//! * `<script type="application/json" data-translations>{...}</script>`,
//!   plain JSON where `{"html": "..."}` marks an HTML fragment;
//! * the legacy inline script `const translations = {...};` holding a
//!   JavaScript object literal. Bare keys, single-quoted strings, comments
//!   and trailing commas are accepted. Values cannot be tagged there, so keys
//!   ending in `Html` (`contentHtml`, `longDescHtml`) are read as fragments.

use crate::dom::{Document, Element};
use lingosite_core::translation::parse_locale_table_json;
use lingosite_core::{Error, LocaleTable, Result};
use regex::Regex;
use std::sync::LazyLock;

pub const DATA_TRANSLATIONS_ATTR: &str = "data-translations";

/// Key suffix that marks an HTML fragment in legacy object literals
pub const LEGACY_HTML_SUFFIX: &str = "Html";

static LEGACY_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:const|let|var)\s+translations\s*=\s*").expect("valid assignment pattern")
});

/// Whether `el` is an inline script carrying a page translation table
pub fn is_translation_script(el: &Element) -> bool {
    if !el.is("script") || el.has_attr("src") {
        return false;
    }
    el.has_attr(DATA_TRANSLATIONS_ATTR) || LEGACY_ASSIGNMENT.is_match(&el.text_content())
}

/// Pull the page-local translation table out of a template, if it has one.
///
/// # Errors
///
/// Returns `Error::TranslationParse` when a block is present but cannot be
/// decoded; callers skip the page rather than emit half-translated output.
pub fn extract_embedded(document: &Document, page: &str) -> Result<Option<LocaleTable>> {
    let Some(script) = document.find(&is_translation_script) else {
        return Ok(None);
    };
    let source = script.text_content();

    if script.has_attr(DATA_TRANSLATIONS_ATTR) {
        return parse_locale_table_json(page, source.trim()).map(Some);
    }

    let start = LEGACY_ASSIGNMENT
        .find(&source)
        .map(|m| m.end())
        .unwrap_or_default();
    let literal = object_literal(&source[start..]).ok_or_else(|| Error::TranslationParse {
        page: page.to_string(),
        reason: "unterminated object literal after `translations =`".to_string(),
    })?;

    let mut table = parse_locale_table_json(page, &js_literal_to_json(literal))?;
    table.promote_html_suffix(LEGACY_HTML_SUFFIX);
    Ok(Some(table))
}

/// The balanced `{...}` at the start of `src` (after whitespace), respecting
/// strings and comments.
fn object_literal(src: &str) -> Option<&str> {
    let offset = src.len() - src.trim_start().len();
    let body = &src[offset..];
    if !body.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '/' if chars.peek().is_some_and(|&(_, n)| n == '/') => {
                for (_, n) in chars.by_ref() {
                    if n == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek().is_some_and(|&(_, n)| n == '*') => {
                chars.next();
                let mut prev = ' ';
                for (_, n) in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
            }
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&body[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rewrite a JavaScript object literal as JSON: quote bare keys, convert
/// single-quoted and template strings, drop comments and trailing commas.
fn js_literal_to_json(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len() + src.len() / 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' | '`' => {
                i = copy_string(&chars, i, &mut out);
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
                continue;
            }
            ',' => {
                if !matches!(next_significant(&chars, i + 1), Some('}') | Some(']')) {
                    out.push(',');
                }
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                let is_key = next_significant(&chars, i) == Some(':');
                if is_key {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    out.push_str(&ident);
                }
                continue;
            }
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

/// First character at or after `i` that is neither whitespace nor inside a comment
fn next_significant(chars: &[char], mut i: usize) -> Option<char> {
    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            c => return Some(c),
        }
    }
    None
}

/// Copy one JS string starting at `chars[start]` as a JSON string.
/// Returns the index just past the closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                match chars.get(i + 1) {
                    Some('\'') | Some('`') => out.push(chars[i + 1]),
                    Some('\n') => {}
                    Some(&next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => {}
                }
                i += 2;
                continue;
            }
            c if c == quote => return i + 1,
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
        i += 1;
    }
    out.push('"');
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingosite_core::TranslationValue;

    fn text<'a>(table: &'a LocaleTable, locale: &str, key: &str) -> &'a str {
        table.get(locale).unwrap().get(key).unwrap().as_str()
    }

    #[test]
    fn test_no_block_is_none() {
        let doc = Document::parse("<html><body><script>console.log(1)</script></body></html>");
        assert!(extract_embedded(&doc, "a.html").unwrap().is_none());
    }

    #[test]
    fn test_json_block() {
        let doc = Document::parse(
            r#"<script type="application/json" data-translations>
{"en": {"cityName": "Beijing", "contentHtml": {"html": "<p>Capital</p>"}},
 "zh-CN": {"cityName": "北京"}}
</script>"#,
        );
        let table = extract_embedded(&doc, "beijing.html").unwrap().unwrap();
        assert_eq!(text(&table, "zh-CN", "cityName"), "北京");
        assert!(table.get("en").unwrap().get("contentHtml").unwrap().is_html());
    }

    #[test]
    fn test_legacy_literal() {
        let doc = Document::parse(
            r#"<script>
    // page strings
    const translations = {
        'en': {
            pageTitle: 'Xi\'an Travel Guide',
            cityName: "Xi'an",
            contentHtml: `<p>Home of the "Terracotta" Army</p>`,
        },
        'zh-CN': { pageTitle: '西安旅游指南', cityName: '西安' }, /* more soon */
    };
    applyCityContent(translations[getLang()] || translations.en, {});
</script>"#,
        );
        let table = extract_embedded(&doc, "xian.html").unwrap().unwrap();
        assert_eq!(text(&table, "en", "pageTitle"), "Xi'an Travel Guide");
        assert_eq!(text(&table, "en", "cityName"), "Xi'an");
        assert_eq!(
            table.get("en").unwrap().get("contentHtml"),
            Some(&TranslationValue::html(r#"<p>Home of the "Terracotta" Army</p>"#))
        );
        assert_eq!(text(&table, "zh-CN", "cityName"), "西安");
    }

    #[test]
    fn test_legacy_braces_inside_strings() {
        let doc = Document::parse(
            "<script>let translations = {en: {note: 'use {curly} and }'}};</script>",
        );
        let table = extract_embedded(&doc, "a.html").unwrap().unwrap();
        assert_eq!(text(&table, "en", "note"), "use {curly} and }");
    }

    #[test]
    fn test_malformed_json_block_is_error() {
        let doc = Document::parse(
            r#"<script type="application/json" data-translations>{"en": </script>"#,
        );
        let err = extract_embedded(&doc, "bad.html").unwrap_err();
        assert!(matches!(err, Error::TranslationParse { ref page, .. } if page == "bad.html"));
    }

    #[test]
    fn test_unterminated_literal_is_error() {
        let doc = Document::parse("<script>const translations = { en: { a: 'b' };</script>");
        assert!(extract_embedded(&doc, "bad.html").is_err());
    }

    #[test]
    fn test_external_script_is_not_a_block() {
        let doc = Document::parse(r#"<script src="js/translations.js"></script>"#);
        assert!(doc.find(&is_translation_script).is_none());
    }

    #[test]
    fn test_js_literal_to_json_keeps_values() {
        assert_eq!(
            js_literal_to_json("{a: true, b: null, c: [1, 2,], d: -1.5,}"),
            r#"{"a": true, "b": null, "c": [1, 2], "d": -1.5}"#
        );
    }
}
