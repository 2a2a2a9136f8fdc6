//! Canonical URL, hreflang alternates and JSON-LD.

use crate::dom::{Document, Element, Node};
use crate::paths::PathPlanner;
use lingosite_core::Locale;
use serde_json::Value;
use tracing::debug;

const SOCIAL_URL_META: &[(&str, &str)] = &[
    ("property", "og:url"),
    ("name", "twitter:url"),
    ("property", "twitter:url"),
];

fn is_canonical(el: &Element) -> bool {
    el.is("link") && el.attr_eq("rel", "canonical")
}

fn is_alternate(el: &Element) -> bool {
    el.is("link") && el.attr_eq("rel", "alternate") && el.has_attr("hreflang")
}

fn is_structured_data(el: &Element) -> bool {
    el.is("script") && el.attr_eq("type", "application/ld+json")
}

/// Point `<link rel="canonical">` at this page's own URL, creating it when
/// absent. Social `og:url`/`twitter:url` metas follow when the page has them.
pub fn rewrite_canonical(document: &mut Document, planner: &PathPlanner, page: &str, locale: &Locale) {
    let url = planner.canonical_url(page, locale);

    match document.find_mut(&is_canonical) {
        Some(link) => link.set_attr("href", &url),
        None => {
            let link = Element::new("link")
                .with_attr("rel", "canonical")
                .with_attr("href", &url);
            if !document.append_to_head(vec![Node::Element(link)]) {
                debug!("{}: no <head>, canonical link not added", page);
            }
        }
    }

    document.for_each_element_mut(&mut |el| {
        if el.is("meta")
            && SOCIAL_URL_META
                .iter()
                .any(|(attr, value)| el.attr_eq(attr, value))
        {
            el.set_attr("content", &url);
        }
    });
}

/// Replace whatever alternates the template carried with the full set for
/// this page: one per configured locale plus `x-default`.
pub fn rewrite_hreflang(document: &mut Document, planner: &PathPlanner, page: &str) {
    document.remove_elements(&is_alternate);

    let links = planner
        .hreflang_set(page)
        .into_iter()
        .map(|(code, url)| {
            Node::Element(
                Element::new("link")
                    .with_attr("rel", "alternate")
                    .with_attr("hreflang", &code)
                    .with_attr("href", &url),
            )
        })
        .collect();

    if !document.append_to_head(links) {
        debug!("{}: no <head>, hreflang links not added", page);
    }
}

/// Localize page URLs inside every JSON-LD block.
///
/// A string is rewritten when it is an absolute URL under the base URL whose
/// path names a page (`.html`) or a directory (`/`). Blocks that fail to
/// parse are left exactly as written, and so are blocks with nothing to
/// rewrite.
pub fn rewrite_structured_data(document: &mut Document, planner: &PathPlanner, locale: &Locale) {
    document.for_each_element_mut(&mut |el| {
        if !is_structured_data(el) {
            return;
        }
        let source = el.text_content();
        let mut value: Value = match serde_json::from_str(&source) {
            Ok(value) => value,
            Err(e) => {
                debug!("leaving unparseable JSON-LD block untouched: {}", e);
                return;
            }
        };

        if localize_value(&mut value, planner, locale) == 0 {
            return;
        }
        let Ok(json) = serde_json::to_string_pretty(&value) else {
            return;
        };

        // keep the block's own leading/trailing whitespace
        let leading = &source[..source.len() - source.trim_start().len()];
        let trailing = &source[source.trim_end().len()..];
        el.set_raw_text(&format!(
            "{}{}{}",
            leading,
            json.replace("</", "<\\/"),
            trailing
        ));
    });
}

/// Rewrite page URLs in place; returns how many strings changed
fn localize_value(value: &mut Value, planner: &PathPlanner, locale: &Locale) -> usize {
    match value {
        Value::String(s) => match localize_page_url(s, planner, locale) {
            Some(localized) if localized != *s => {
                *s = localized;
                1
            }
            _ => 0,
        },
        Value::Array(items) => items
            .iter_mut()
            .map(|v| localize_value(v, planner, locale))
            .sum(),
        Value::Object(map) => map
            .values_mut()
            .map(|v| localize_value(v, planner, locale))
            .sum(),
        _ => 0,
    }
}

fn localize_page_url(url: &str, planner: &PathPlanner, locale: &Locale) -> Option<String> {
    if !url.starts_with(planner.base_url()) {
        return None;
    }
    let split = url.find(['?', '#']).unwrap_or(url.len());
    let (path, suffix) = url.split_at(split);

    let names_page = path.ends_with(".html") || path.ends_with('/') || path == planner.base_url();
    if !names_page {
        return None;
    }
    planner
        .localize_url(path, locale)
        .map(|localized| format!("{}{}", localized, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.example.org";

    fn planner() -> PathPlanner {
        PathPlanner::new(
            BASE,
            "/out",
            "en".into(),
            vec!["en".into(), "zh-CN".into(), "ja".into()],
        )
    }

    fn head(inner: &str) -> Document {
        Document::parse(&format!("<html>\n<head>{}\n</head>\n<body></body>\n</html>", inner))
    }

    #[test]
    fn test_canonical_updated_in_place() {
        let mut doc = head(r#"<link rel="canonical" href="https://www.example.org/beijing.html">"#);
        rewrite_canonical(&mut doc, &planner(), "beijing.html", &Locale::new("zh-CN"));
        assert!(doc
            .to_html()
            .contains(r#"<link rel="canonical" href="https://www.example.org/zh-CN/beijing.html">"#));
        assert_eq!(doc.count(&is_canonical), 1);
    }

    #[test]
    fn test_canonical_created_when_missing() {
        let mut doc = head("");
        rewrite_canonical(&mut doc, &planner(), "index.html", &Locale::new("ja"));
        let link = doc.find(&is_canonical).unwrap();
        assert_eq!(link.attr("href"), Some("https://www.example.org/ja/index.html"));
    }

    #[test]
    fn test_social_url_metas_follow_canonical() {
        let mut doc = head(concat!(
            r#"<meta property="og:url" content="https://www.example.org/food.html">"#,
            r#"<meta name="twitter:url" content="https://www.example.org/food.html">"#,
            r#"<meta property="og:title" content="Food">"#,
        ));
        rewrite_canonical(&mut doc, &planner(), "food.html", &Locale::new("ja"));
        let html = doc.to_html();
        assert_eq!(html.matches("https://www.example.org/ja/food.html").count(), 3);
        assert!(html.contains(r#"<meta property="og:title" content="Food">"#));
    }

    #[test]
    fn test_twitter_url_as_property() {
        let mut doc = head(r#"<meta property="twitter:url" content="https://www.example.org/index.html">"#);
        rewrite_canonical(&mut doc, &planner(), "index.html", &Locale::new("ja"));
        assert!(doc.to_html().contains(
            r#"<meta property="twitter:url" content="https://www.example.org/ja/index.html">"#
        ));
    }

    #[test]
    fn test_hreflang_replaced_with_full_set() {
        let mut doc = head(concat!(
            "\n    ",
            r#"<link rel="alternate" hreflang="en" href="https://old.example/x.html">"#,
            "\n    ",
            r#"<link rel="alternate" type="application/rss+xml" href="/feed.xml">"#,
        ));
        rewrite_hreflang(&mut doc, &planner(), "beijing.html");

        assert_eq!(doc.count(&is_alternate), 4);
        let html = doc.to_html();
        assert!(!html.contains("old.example"));
        assert!(html.contains(r#"href="/feed.xml""#));
        assert!(html.contains(
            r#"<link rel="alternate" hreflang="x-default" href="https://www.example.org/beijing.html">"#
        ));
        assert!(html.contains(
            r#"<link rel="alternate" hreflang="zh-CN" href="https://www.example.org/zh-CN/beijing.html">"#
        ));
    }

    #[test]
    fn test_hreflang_is_stable_across_reruns() {
        let mut doc = head("");
        rewrite_hreflang(&mut doc, &planner(), "index.html");
        let once = doc.to_html();
        rewrite_hreflang(&mut doc, &planner(), "index.html");
        assert_eq!(doc.to_html(), once);
    }

    #[test]
    fn test_structured_data_rewrites_page_urls_only() {
        let mut doc = head(
            r#"<script type="application/ld+json">
{"@type": "TouristDestination", "url": "https://www.example.org/beijing.html",
 "image": "https://www.example.org/images/beijing.jpg",
 "isPartOf": {"url": "https://www.example.org/"},
 "sameAs": ["https://en.wikipedia.org/wiki/Beijing"]}
</script>"#,
        );
        rewrite_structured_data(&mut doc, &planner(), &Locale::new("zh-CN"));

        let block = doc.find(&is_structured_data).unwrap().text_content();
        let value: Value = serde_json::from_str(&block).unwrap();
        assert_eq!(value["url"], "https://www.example.org/zh-CN/beijing.html");
        assert_eq!(value["image"], "https://www.example.org/images/beijing.jpg");
        assert_eq!(value["isPartOf"]["url"], "https://www.example.org/zh-CN/");
        assert_eq!(value["sameAs"][0], "https://en.wikipedia.org/wiki/Beijing");
        assert!(block.starts_with('\n'));
    }

    #[test]
    fn test_structured_data_keeps_fragment() {
        let p = planner();
        assert_eq!(
            localize_page_url("https://www.example.org/food.html#hotpot", &p, &Locale::new("ja")),
            Some("https://www.example.org/ja/food.html#hotpot".to_string())
        );
    }

    #[test]
    fn test_malformed_structured_data_untouched() {
        let raw = r#"<script type="application/ld+json">{"url": "https://www.example.org/a.html",</script>"#;
        let mut doc = head(raw);
        rewrite_structured_data(&mut doc, &planner(), &Locale::new("ja"));
        assert!(doc.to_html().contains(raw));
    }

    #[test]
    fn test_structured_data_without_page_urls_keeps_formatting() {
        let raw = r#"<script type="application/ld+json">{ "name":"Guide" }</script>"#;
        let mut doc = head(raw);
        rewrite_structured_data(&mut doc, &planner(), &Locale::new("ja"));
        assert!(doc.to_html().contains(raw));
    }
}
