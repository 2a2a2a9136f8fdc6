//! Output paths and public URLs for (page, locale) pairs.
//!
//! Every place that needs a location (output file, canonical tag, hreflang
//! links, rewritten internal links, sitemap entries) asks the planner, so
//! there is exactly one rule: the default locale lives at the site root and
//! every other locale under `/<locale>/`.

use lingosite_core::{Locale, SiteConfig};
use std::path::{Path, PathBuf};

pub const SITEMAP_FILE: &str = "sitemap.xml";

#[derive(Debug, Clone)]
pub struct PathPlanner {
    base_url: String,
    output_root: PathBuf,
    default_locale: Locale,
    locales: Vec<Locale>,
}

impl PathPlanner {
    pub fn new(
        base_url: &str,
        output_root: impl Into<PathBuf>,
        default_locale: Locale,
        locales: Vec<Locale>,
    ) -> Self {
        PathPlanner {
            base_url: base_url.trim_end_matches('/').to_string(),
            output_root: output_root.into(),
            default_locale,
            locales,
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            &config.site.base_url,
            config.output_dir(),
            config.site.default_locale.clone(),
            config.site.locales.clone(),
        )
    }

    /// Same plan, different output directory (e.g. `build --output`)
    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    pub fn is_default(&self, locale: &Locale) -> bool {
        *locale == self.default_locale
    }

    /// `""` for the default locale, `"/<locale>"` otherwise
    pub fn locale_prefix(&self, locale: &Locale) -> String {
        if self.is_default(locale) {
            String::new()
        } else {
            format!("/{}", locale)
        }
    }

    /// Path relative to the site root: `beijing.html` or `zh-CN/beijing.html`
    pub fn relative_path(&self, page: &str, locale: &Locale) -> String {
        if self.is_default(locale) {
            page.to_string()
        } else {
            format!("{}/{}", locale, page)
        }
    }

    pub fn output_path(&self, page: &str, locale: &Locale) -> PathBuf {
        self.output_root.join(self.relative_path(page, locale))
    }

    pub fn canonical_url(&self, page: &str, locale: &Locale) -> String {
        format!("{}/{}", self.base_url, self.relative_path(page, locale))
    }

    /// Root-relative link target used when rewriting `href`s
    pub fn site_href(&self, page: &str, locale: &Locale) -> String {
        format!("{}/{}", self.locale_prefix(locale), page)
    }

    /// `(hreflang, url)` pairs: `x-default` first, then every locale in order
    pub fn hreflang_set(&self, page: &str) -> Vec<(String, String)> {
        let mut set = Vec::with_capacity(self.locales.len() + 1);
        set.push((
            "x-default".to_string(),
            self.canonical_url(page, &self.default_locale),
        ));
        for locale in &self.locales {
            set.push((locale.to_string(), self.canonical_url(page, locale)));
        }
        set
    }

    /// Map an absolute URL under the base URL onto `locale`.
    ///
    /// Any locale segment already present is replaced, so a template that
    /// hard-codes `.../ja/beijing.html` still ends up pointing at the right
    /// language. Returns `None` for URLs outside the site.
    pub fn localize_url(&self, url: &str, locale: &Locale) -> Option<String> {
        let rest = url.strip_prefix(&self.base_url)?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            // `https://example.org.evil.com/...`
            return None;
        }
        let mut path = rest.trim_start_matches('/');

        if let Some((first, remainder)) = path.split_once('/')
            && self.locales.iter().any(|l| l.as_str() == first)
        {
            path = remainder;
        } else if self.locales.iter().any(|l| l.as_str() == path) {
            path = "";
        }

        Some(format!("{}/{}", self.base_url, self.relative_path(path, locale)))
    }

    pub fn sitemap_path(&self) -> PathBuf {
        self.output_root.join(SITEMAP_FILE)
    }
}
