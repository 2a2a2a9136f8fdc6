//! Translation dictionaries and the merged per-page lookup.
//!
//! Values carry their kind from authoring time: a bare string is plain text,
//! a `{ html = "..." }` table (or `{"html": "..."}` in JSON) is an HTML
//! fragment. Nothing downstream inspects the content to guess which is which.

use crate::error::{Error, Result};
use crate::types::Locale;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::warn;

/// A single localized value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationValue {
    PlainText(String),
    HtmlFragment(String),
}

impl TranslationValue {
    pub fn text(value: impl Into<String>) -> Self {
        TranslationValue::PlainText(value.into())
    }

    pub fn html(value: impl Into<String>) -> Self {
        TranslationValue::HtmlFragment(value.into())
    }

    /// Raw string regardless of kind
    pub fn as_str(&self) -> &str {
        match self {
            TranslationValue::PlainText(s) | TranslationValue::HtmlFragment(s) => s,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, TranslationValue::HtmlFragment(_))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Html { html: String },
}

impl<'de> Deserialize<'de> for TranslationValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawValue::deserialize(deserializer)? {
            RawValue::Text(s) => TranslationValue::PlainText(s),
            RawValue::Html { html } => TranslationValue::HtmlFragment(html),
        })
    }
}

/// Client widgets only need the string, so both kinds serialize flat.
impl Serialize for TranslationValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Key → value mapping for one locale
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dictionary(BTreeMap<String, TranslationValue>);

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&TranslationValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: TranslationValue) {
        self.0.insert(key.into(), value);
    }

    /// Copy every entry of `other` over this dictionary; `other` wins on conflicts
    pub fn overlay(&mut self, other: &Dictionary) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Reinterpret plain-text values whose key ends in `suffix` as HTML
    /// fragments. Used for sources that cannot tag values themselves.
    pub fn promote_html_suffix(&mut self, suffix: &str) {
        for (key, value) in &mut self.0 {
            if key.ends_with(suffix)
                && let TranslationValue::PlainText(s) = value
            {
                *value = TranslationValue::HtmlFragment(std::mem::take(s));
            }
        }
    }
}

impl<K: Into<String>> FromIterator<(K, TranslationValue)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, TranslationValue)>>(iter: I) -> Self {
        Dictionary(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Locale → dictionary, the shape of every translation source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleTable(BTreeMap<Locale, Dictionary>);

impl LocaleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, locale: &str) -> Option<&Dictionary> {
        self.0.get(locale)
    }

    pub fn insert(&mut self, locale: Locale, dictionary: Dictionary) {
        self.0.insert(locale, dictionary);
    }

    /// Merge `other` into this table locale by locale, key by key
    pub fn overlay(&mut self, other: &LocaleTable) {
        for (locale, dictionary) in &other.0 {
            self.0
                .entry(locale.clone())
                .or_default()
                .overlay(dictionary);
        }
    }

    pub fn locales(&self) -> impl Iterator<Item = &Locale> {
        self.0.keys()
    }

    pub fn promote_html_suffix(&mut self, suffix: &str) {
        for dictionary in self.0.values_mut() {
            dictionary.promote_html_suffix(suffix);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Load a locale table from a TOML file (`[en]`, `[zh-CN]`, ... tables)
pub fn load_locale_table<P: AsRef<Path>>(path: P) -> Result<LocaleTable> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| {
        Error::ConfigParse(format!("Invalid translation file {}: {}", path.display(), e))
    })
}

/// Parse a locale table embedded in a page as a JSON object literal
pub fn parse_locale_table_json(page: &str, json: &str) -> Result<LocaleTable> {
    serde_json::from_str(json).map_err(|e| Error::TranslationParse {
        page: page.to_string(),
        reason: e.to_string(),
    })
}

/// Merge a global and a page-local table for one locale.
///
/// Each layer falls back to the default locale on its own: a page with no
/// local `ja` dictionary still gets the global `ja` navigation labels.
pub fn merge_layers(
    global: &LocaleTable,
    local: Option<&LocaleTable>,
    locale: &Locale,
    default_locale: &Locale,
) -> Dictionary {
    let mut merged = global
        .get(locale.as_str())
        .or_else(|| global.get(default_locale.as_str()))
        .cloned()
        .unwrap_or_default();

    if let Some(local) = local
        && let Some(dictionary) = local
            .get(locale.as_str())
            .or_else(|| local.get(default_locale.as_str()))
    {
        merged.overlay(dictionary);
    }

    merged
}

/// Where a dictionary came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Global,
    Local,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Global => write!(f, "global"),
            Layer::Local => write!(f, "local"),
        }
    }
}

/// Global navigation dictionary plus every page's local dictionary
#[derive(Debug, Clone)]
pub struct TranslationStore {
    default_locale: Locale,
    global: LocaleTable,
    pages: HashMap<String, LocaleTable>,
}

impl TranslationStore {
    pub fn new(default_locale: Locale, global: LocaleTable) -> Self {
        TranslationStore {
            default_locale,
            global,
            pages: HashMap::new(),
        }
    }

    /// Register a page's local table. Registering the same page twice
    /// overlays the second table on the first.
    pub fn insert_page(&mut self, page: impl Into<String>, table: LocaleTable) {
        self.pages.entry(page.into()).or_default().overlay(&table);
    }

    pub fn global(&self) -> &LocaleTable {
        &self.global
    }

    pub fn page_table(&self, page: &str) -> Option<&LocaleTable> {
        self.pages.get(page)
    }

    /// Whether the page has a local dictionary written for exactly this locale
    pub fn has_local(&self, page: &str, locale: &Locale) -> bool {
        self.page_table(page)
            .is_some_and(|t| t.get(locale.as_str()).is_some())
    }

    /// Layers that have no dictionary for `locale` and so read the default
    pub fn fallback_layers(&self, page: &str, locale: &Locale) -> Vec<Layer> {
        let mut layers = Vec::new();
        if self.global.get(locale.as_str()).is_none() {
            layers.push(Layer::Global);
        }
        if self.page_table(page).is_some() && !self.has_local(page, locale) {
            layers.push(Layer::Local);
        }
        layers
    }

    /// Merged dictionary for (page, locale); never fails.
    /// Each layer that falls back to the default locale is logged at WARN.
    pub fn resolve(&self, page: &str, locale: &Locale) -> Dictionary {
        for layer in self.fallback_layers(page, locale) {
            warn!(
                page,
                %locale,
                "no {} dictionary, falling back to {}",
                layer,
                self.default_locale
            );
        }
        merge_layers(
            &self.global,
            self.page_table(page),
            locale,
            &self.default_locale,
        )
    }
}
