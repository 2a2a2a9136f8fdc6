//! Internal links and image references.

use crate::dom::Document;
use crate::paths::PathPlanner;
use lingosite_core::{ImageSettings, Locale};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("valid scheme pattern"));

const IMAGE_URL_ATTRS: &[&str] = &["src", "data-src"];
const IMAGE_SRCSET_ATTRS: &[&str] = &["srcset", "data-srcset"];

fn is_external(url: &str) -> bool {
    url.starts_with("//") || URL_SCHEME.is_match(url)
}

/// Split `url` at the first `?` or `#`
fn split_suffix(url: &str) -> (&str, &str) {
    url.split_at(url.find(['?', '#']).unwrap_or(url.len()))
}

/// Point every local link to a known page at that page's copy in `locale`.
/// Query strings and fragments survive; anything else is left alone.
pub fn rewrite_links(
    document: &mut Document,
    planner: &PathPlanner,
    pages: &HashSet<String>,
    locale: &Locale,
) -> usize {
    let mut rewritten = 0;
    document.for_each_element_mut(&mut |el| {
        let Some(href) = el.attr("href") else {
            return;
        };
        if let Some(target) = rewrite_href(href, planner, pages, locale) {
            el.set_attr("href", &target);
            rewritten += 1;
        }
    });
    rewritten
}

fn rewrite_href(
    href: &str,
    planner: &PathPlanner,
    pages: &HashSet<String>,
    locale: &Locale,
) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || is_external(href) {
        return None;
    }

    let (target, suffix) = split_suffix(href);
    let page = target
        .strip_prefix("./")
        .or_else(|| target.strip_prefix('/'))
        .unwrap_or(target);

    pages
        .contains(page)
        .then(|| format!("{}{}", planner.site_href(page, locale), suffix))
}

/// Swap raster image extensions for the optimized format in `src`,
/// `data-src` and `srcset` of `<img>` and `<source>`. Data URIs and images
/// hosted elsewhere are not touched.
pub fn rewrite_images(document: &mut Document, images: &ImageSettings, base_url: &str) -> usize {
    let mut rewritten = 0;
    document.for_each_element_mut(&mut |el| {
        if !(el.is("img") || el.is("source")) {
            return;
        }
        for attr in IMAGE_URL_ATTRS {
            if let Some(url) = el.attr(attr)
                && let Some(new) = rewrite_image_url(url, images, base_url)
            {
                el.set_attr(attr, &new);
                rewritten += 1;
            }
        }
        for attr in IMAGE_SRCSET_ATTRS {
            if let Some(srcset) = el.attr(attr)
                && let Some(new) = rewrite_srcset(srcset, images, base_url)
            {
                el.set_attr(attr, &new);
                rewritten += 1;
            }
        }
    });
    rewritten
}

fn rewrite_srcset(srcset: &str, images: &ImageSettings, base_url: &str) -> Option<String> {
    let mut changed = false;
    let candidates: Vec<String> = srcset
        .split(',')
        .map(|candidate| {
            let candidate = candidate.trim();
            let (url, descriptor) = candidate
                .split_once(char::is_whitespace)
                .unwrap_or((candidate, ""));
            match rewrite_image_url(url, images, base_url) {
                Some(new) => {
                    changed = true;
                    if descriptor.is_empty() {
                        new
                    } else {
                        format!("{} {}", new, descriptor.trim())
                    }
                }
                None => candidate.to_string(),
            }
        })
        .collect();
    changed.then(|| candidates.join(", "))
}

fn rewrite_image_url(url: &str, images: &ImageSettings, base_url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() || url.starts_with("data:") {
        return None;
    }
    if is_external(url) {
        let own = url
            .strip_prefix(base_url)
            .is_some_and(|rest| rest.starts_with('/'));
        if !own {
            return None;
        }
    }

    let (path, suffix) = split_suffix(url);
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    let dot = path[file_start..].rfind('.')? + file_start;
    let extension = path[dot + 1..].to_ascii_lowercase();

    images
        .raster_extensions
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(&extension))
        .then(|| format!("{}.{}{}", &path[..dot], images.target_extension, suffix))
}
