//! Client-side translation payload.
//!
//! The runtime translation scripts a template ships with are removed and a
//! single JSON data block carrying the resolved dictionary takes their place.

use crate::dom::{Document, Element, Node};
use crate::extract::is_translation_script;
use lingosite_core::{Dictionary, Error, Locale, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const LOCALE_DATA_ID: &str = "i18n-data";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocaleData<'a> {
    lang: &'a str,
    translations: BTreeMap<&'a str, &'a Dictionary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    city_details: Option<&'a Value>,
}

/// File name of a script `src`, without directories or query
fn script_file_name(src: &str) -> &str {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    path.rsplit('/').next().unwrap_or(path)
}

/// Remove configured runtime scripts (matched by file name) and inline
/// translation tables. Returns the number of scripts removed.
pub fn strip_translation_scripts(document: &mut Document, strip: &[String]) -> usize {
    document.remove_elements(&|el| {
        if !el.is("script") {
            return false;
        }
        if let Some(src) = el.attr("src") {
            let name = script_file_name(src);
            return strip.iter().any(|s| s == name);
        }
        is_translation_script(el)
    })
}

/// Append `<script type="application/json" id="i18n-data">` to `<head>`
/// (or the end of the document when there is none), replacing any block a
/// previous run left behind.
///
/// # Errors
///
/// Returns `Error::InvalidData` if the payload cannot be serialized.
pub fn inject_locale_data(
    document: &mut Document,
    locale: &Locale,
    dictionary: &Dictionary,
    city_details: Option<&Value>,
) -> Result<()> {
    document.remove_elements(&|el| el.is("script") && el.id() == Some(LOCALE_DATA_ID));

    let data = LocaleData {
        lang: locale.as_str(),
        translations: BTreeMap::from([(locale.as_str(), dictionary)]),
        city_details,
    };
    let json = serde_json::to_string(&data)
        .map_err(|e| Error::InvalidData(format!("locale data for {}: {}", locale, e)))?;

    let mut script = Element::new("script")
        .with_attr("type", "application/json")
        .with_attr("id", LOCALE_DATA_ID);
    script.set_raw_text(&json.replace("</", "<\\/"));

    let node = Node::Element(script);
    if !document.append_to_head(vec![node.clone()]) {
        document.nodes.push(node);
    }
    Ok(())
}
