//! Template → localized page.
//!
//! [`localize`] is a pure function of its inputs: it clones the parsed
//! template and runs each step over the copy in a fixed order. Steps are
//! individually exposed so they can be tested and reused in isolation.

pub mod content;
pub mod links;
pub mod payload;
pub mod seo;

use crate::dom::Document;
use crate::paths::PathPlanner;
use lingosite_core::{Dictionary, ImageSettings, Locale, Result};
use serde_json::Value;
use std::collections::HashSet;

/// Site-wide inputs shared by every (page, locale) pair of a run
#[derive(Debug, Clone, Copy)]
pub struct LocalizeContext<'a> {
    pub planner: &'a PathPlanner,
    /// Every configured page name, for link rewriting
    pub pages: &'a HashSet<String>,
    pub images: &'a ImageSettings,
    /// Script file names to drop from the output
    pub strip_scripts: &'a [String],
}

/// Produce the `locale` rendition of `page`.
///
/// `city_details` is embedded in the client data block for pages that opt
/// into the cross-reference dataset.
///
/// # Errors
///
/// Only fails if the client data block cannot be serialized.
pub fn localize(
    source: &Document,
    page: &str,
    locale: &Locale,
    dictionary: &Dictionary,
    city_details: Option<&Value>,
    ctx: &LocalizeContext<'_>,
) -> Result<Document> {
    let mut document = source.clone();

    content::set_lang(&mut document, locale);
    content::apply_keys(&mut document, dictionary);
    content::apply_named_fields(&mut document, dictionary);

    seo::rewrite_canonical(&mut document, ctx.planner, page, locale);
    seo::rewrite_hreflang(&mut document, ctx.planner, page);
    seo::rewrite_structured_data(&mut document, ctx.planner, locale);

    links::rewrite_links(&mut document, ctx.planner, ctx.pages, locale);
    links::rewrite_images(&mut document, ctx.images, ctx.planner.base_url());

    payload::strip_translation_scripts(&mut document, ctx.strip_scripts);
    payload::inject_locale_data(&mut document, locale, dictionary, city_details)?;

    Ok(document)
}
