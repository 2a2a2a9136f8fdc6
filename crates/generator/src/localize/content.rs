//! Language attribute, keyed substitution and id-addressed fields.

use crate::dom::{Document, Element};
use lingosite_core::{Dictionary, Locale, TranslationValue};

/// Attribute naming the dictionary key for an element
pub const LANG_KEY_ATTR: &str = "data-lang-key";

/// Write a value into an element according to its kind
fn apply_value(el: &mut Element, value: &TranslationValue) {
    match value {
        TranslationValue::PlainText(text) => el.set_text(text),
        TranslationValue::HtmlFragment(html) => el.set_inner_html(html),
    }
}

/// Set `<html lang>` to the target locale
pub fn set_lang(document: &mut Document, locale: &Locale) {
    if let Some(html) = document.first_mut("html") {
        html.set_attr("lang", locale.as_str());
    }
}

/// Substitute every `data-lang-key` element whose key is in the dictionary.
///
/// `meta` gets its `content`, form fields their `placeholder`; everything
/// else gets text or markup depending on the value's kind. Returns the
/// number of elements changed.
pub fn apply_keys(document: &mut Document, dictionary: &Dictionary) -> usize {
    let mut applied = 0;
    document.for_each_element_mut(&mut |el| {
        let Some(key) = el.attr(LANG_KEY_ATTR).map(str::to_string) else {
            return;
        };
        let Some(value) = dictionary.get(&key) else {
            return;
        };
        match el.tag.as_str() {
            "meta" => el.set_attr("content", value.as_str()),
            "input" | "textarea" => el.set_attr("placeholder", value.as_str()),
            _ => apply_value(el, value),
        }
        applied += 1;
    });
    applied
}

/// Apply the fixed keys that address untagged elements by id.
pub fn apply_named_fields(document: &mut Document, dictionary: &Dictionary) {
    if let Some(title) = dictionary.get("pageTitle") {
        if let Some(el) = document.element_by_id_mut("page-title") {
            el.set_text(title.as_str());
        } else if let Some(el) = document.first_mut("title") {
            el.set_text(title.as_str());
        }
    }

    if let Some(desc) = dictionary.get("metaDesc")
        && let Some(el) = document.element_by_id_mut("meta-desc")
    {
        el.set_attr("content", desc.as_str());
    }

    if let Some(name) = dictionary.get("cityName")
        && let Some(el) = document.element_by_id_mut("city-name")
    {
        apply_value(el, name);
    }

    if let Some(el) = document.element_by_id_mut("city-sub") {
        match (dictionary.get("heroSubtitle"), dictionary.get("metaDesc")) {
            (Some(subtitle), _) => apply_value(el, subtitle),
            // only fill a subtitle nothing else has written
            (None, Some(desc)) if el.text_content().trim().is_empty() => el.set_text(desc.as_str()),
            _ => {}
        }
    }

    if let Some(content) = dictionary.get("contentHtml")
        && let Some(el) = document.element_by_id_mut("city-content")
    {
        apply_value(el, content);
    }

    if let Some(back) = dictionary.get("backText")
        && let Some(el) = document.element_by_id_mut("back-link")
    {
        apply_value(el, back);
    }
}
