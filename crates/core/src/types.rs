use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};

/// A locale code such as `en`, `zh-CN` or `ja`.
///
/// Codes are opaque to the generator; they are only compared, used as
/// directory names and written into `lang`/`hreflang` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(code: impl Into<String>) -> Self {
        Locale(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Locale {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Locale {
    fn from(code: &str) -> Self {
        Locale::new(code)
    }
}

/// Sitemap change frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete, validated site configuration
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Directory that contained `site.toml`; every relative path resolves against it
    pub root: PathBuf,
    pub site: SiteSettings,
    pub translations: TranslationSettings,
    pub images: ImageSettings,
    pub sitemap: SitemapSettings,
    pub cross_reference: CrossReference,
    pub pages: Vec<PageSpec>,
}

/// Locales, base URL and directories
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Absolute base URL without a trailing slash
    pub base_url: String,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub default_locale: Locale,
    /// Ordered; always contains `default_locale`
    pub locales: Vec<Locale>,
}

/// Where translation dictionaries come from
#[derive(Debug, Clone)]
pub struct TranslationSettings {
    pub global: PathBuf,
    pub pages_dir: Option<PathBuf>,
    /// File names of shared translation bundles stripped from every artifact
    pub strip_scripts: Vec<String>,
}

/// Image reference rewriting
#[derive(Debug, Clone)]
pub struct ImageSettings {
    /// Lowercase extensions without the leading dot
    pub raster_extensions: Vec<String>,
    pub target_extension: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        ImageSettings {
            raster_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            target_extension: "webp".to_string(),
        }
    }
}

/// Sitemap fallbacks for pages without their own settings
#[derive(Debug, Clone)]
pub struct SitemapSettings {
    pub default_changefreq: ChangeFreq,
    pub default_priority: f64,
}

impl Default for SitemapSettings {
    fn default() -> Self {
        SitemapSettings {
            default_changefreq: ChangeFreq::Weekly,
            default_priority: 0.5,
        }
    }
}

/// Data shared with client widgets
#[derive(Debug, Clone, Default)]
pub struct CrossReference {
    pub city_details: Option<PathBuf>,
}

/// One logical page of the site
#[derive(Debug, Clone, PartialEq)]
pub struct PageSpec {
    /// Relative file name, e.g. `beijing.html`
    pub name: String,
    pub changefreq: Option<ChangeFreq>,
    pub priority: Option<f64>,
    /// Whether the injected data block carries `cityDetails`
    pub city_details: bool,
}

impl PageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        PageSpec {
            name: name.into(),
            changefreq: None,
            priority: None,
            city_details: false,
        }
    }

    /// File stem used to find an external translation file (`beijing.html` → `beijing`)
    pub fn stem(&self) -> &str {
        self.name.strip_suffix(".html").unwrap_or(&self.name)
    }
}

impl SiteConfig {
    /// Resolve a config-relative path against the config directory
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.site.source_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.site.output_dir)
    }

    pub fn page(&self, name: &str) -> Option<&PageSpec> {
        self.pages.iter().find(|p| p.name == name)
    }

    pub fn page_names(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|p| p.name.as_str())
    }

    pub fn changefreq_for(&self, page: &str) -> ChangeFreq {
        self.page(page)
            .and_then(|p| p.changefreq)
            .unwrap_or(self.sitemap.default_changefreq)
    }

    pub fn priority_for(&self, page: &str) -> f64 {
        self.page(page)
            .and_then(|p| p.priority)
            .unwrap_or(self.sitemap.default_priority)
    }

    /// Number of artifacts a complete build emits
    pub fn expected_artifacts(&self) -> usize {
        self.pages.len() * self.site.locales.len()
    }
}
