use crate::error::{Error, Result};
use crate::types::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static LOCALE_PATTERN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("valid locale pattern")
});

/// Raw TOML configuration structure
/// This matches the site.toml file structure exactly
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    site: RawSite,
    translations: RawTranslations,
    #[serde(default)]
    images: Option<RawImages>,
    #[serde(default)]
    sitemap: Option<RawSitemap>,
    #[serde(default)]
    cross_reference: Option<RawCrossReference>,
    #[serde(default)]
    page: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    base_url: String,
    source_dir: String,
    output_dir: String,
    default_locale: String,
    locales: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawTranslations {
    global: String,
    pages_dir: Option<String>,
    #[serde(default = "default_strip_scripts")]
    strip_scripts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawImages {
    raster_extensions: Option<Vec<String>>,
    target_extension: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSitemap {
    default_changefreq: Option<ChangeFreq>,
    default_priority: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCrossReference {
    city_details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    name: String,
    changefreq: Option<ChangeFreq>,
    priority: Option<f64>,
    #[serde(default)]
    city_details: bool,
}

fn default_strip_scripts() -> Vec<String> {
    vec!["translations.js".to_string()]
}

/// Parse site.toml from a file path.
///
/// Relative paths inside the file resolve against the file's directory.
pub fn parse_site_toml<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let root = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    parse_site_toml_str(&content, root)
}

/// Parse site.toml from a string (useful for testing)
pub fn parse_site_toml_str(content: &str, root: impl Into<PathBuf>) -> Result<SiteConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let base_url = validate_base_url(&raw.site.base_url)?;
    let (default_locale, locales) = validate_locales(&raw.site.default_locale, &raw.site.locales)?;

    let site = SiteSettings {
        base_url,
        source_dir: validate_path(&raw.site.source_dir, "site.source_dir")?,
        output_dir: validate_path(&raw.site.output_dir, "site.output_dir")?,
        default_locale,
        locales,
    };

    if site.source_dir == site.output_dir {
        return Err(Error::ConfigParse(
            "site.source_dir and site.output_dir must differ; templates would be overwritten"
                .to_string(),
        ));
    }

    let pages_dir = if let Some(dir) = raw.translations.pages_dir {
        Some(validate_path(&dir, "translations.pages_dir")?)
    } else {
        None
    };

    let translations = TranslationSettings {
        global: validate_path(&raw.translations.global, "translations.global")?,
        pages_dir,
        strip_scripts: raw.translations.strip_scripts,
    };

    let images = match raw.images {
        Some(raw_images) => {
            let defaults = ImageSettings::default();
            ImageSettings {
                raster_extensions: raw_images
                    .raster_extensions
                    .map(|exts| exts.iter().map(|e| normalize_extension(e)).collect())
                    .unwrap_or(defaults.raster_extensions),
                target_extension: raw_images
                    .target_extension
                    .map(|e| normalize_extension(&e))
                    .unwrap_or(defaults.target_extension),
            }
        }
        None => ImageSettings::default(),
    };

    if images.raster_extensions.contains(&images.target_extension) {
        return Err(Error::ConfigParse(format!(
            "images.target_extension '{}' is also listed as a raster extension",
            images.target_extension
        )));
    }

    let sitemap = match raw.sitemap {
        Some(raw_sitemap) => {
            let defaults = SitemapSettings::default();
            SitemapSettings {
                default_changefreq: raw_sitemap
                    .default_changefreq
                    .unwrap_or(defaults.default_changefreq),
                default_priority: validate_priority(
                    raw_sitemap
                        .default_priority
                        .unwrap_or(defaults.default_priority),
                    "sitemap.default_priority",
                )?,
            }
        }
        None => SitemapSettings::default(),
    };

    let cross_reference = CrossReference {
        city_details: match raw.cross_reference.and_then(|c| c.city_details) {
            Some(p) => Some(validate_path(&p, "cross_reference.city_details")?),
            None => None,
        },
    };

    // Convert pages, validating names and sitemap hints
    let mut seen = HashSet::new();
    let pages: Result<Vec<PageSpec>> = raw
        .page
        .into_iter()
        .map(|p| {
            validate_page_name(&p.name)?;
            if !seen.insert(p.name.clone()) {
                return Err(Error::ConfigParse(format!(
                    "Page '{}' is listed more than once",
                    p.name
                )));
            }
            let priority = match p.priority {
                Some(value) => Some(validate_priority(value, "page.priority")?),
                None => None,
            };
            Ok(PageSpec {
                name: p.name,
                changefreq: p.changefreq,
                priority,
                city_details: p.city_details,
            })
        })
        .collect();
    let pages = pages?;

    if pages.is_empty() {
        return Err(Error::ConfigParse(
            "At least one [[page]] entry is required".to_string(),
        ));
    }

    if pages.iter().any(|p| p.city_details) && cross_reference.city_details.is_none() {
        return Err(Error::ConfigParse(
            "A page sets city_details = true but cross_reference.city_details is not configured"
                .to_string(),
        ));
    }

    Ok(SiteConfig {
        root: root.into(),
        site,
        translations,
        images,
        sitemap,
        cross_reference,
        pages,
    })
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Validate the public base URL and strip any trailing slash.
fn validate_base_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| Error::ConfigParse(format!("Invalid site.base_url '{}': {}", raw, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::ConfigParse(format!(
            "site.base_url must use http or https: '{}'",
            raw
        )));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(Error::ConfigParse(format!(
            "site.base_url must not carry a query or fragment: '{}'",
            raw
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// Validate the locale list: non-empty, well-formed, unique, containing the default.
fn validate_locales(default_locale: &str, locales: &[String]) -> Result<(Locale, Vec<Locale>)> {
    if locales.is_empty() {
        return Err(Error::ConfigParse("site.locales is empty".to_string()));
    }

    let mut seen = HashSet::new();
    for code in locales {
        if !LOCALE_PATTERN.is_match(code) {
            return Err(Error::ConfigParse(format!(
                "Invalid locale code '{}' in site.locales",
                code
            )));
        }
        if !seen.insert(code.as_str()) {
            return Err(Error::ConfigParse(format!(
                "Locale '{}' is listed more than once",
                code
            )));
        }
    }

    if !seen.contains(default_locale) {
        return Err(Error::ConfigParse(format!(
            "site.default_locale '{}' is not in site.locales",
            default_locale
        )));
    }

    Ok((
        Locale::new(default_locale),
        locales.iter().map(|c| Locale::new(c.as_str())).collect(),
    ))
}

fn validate_priority(value: f64, field_name: &str) -> Result<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::ConfigParse(format!(
            "'{}' must be between 0.0 and 1.0, got {}",
            field_name, value
        )));
    }
    Ok(value)
}

/// Validate a page name: a safe relative path to an `.html` file.
fn validate_page_name(name: &str) -> Result<()> {
    let path = validate_path(name, "page.name")?;
    if path.extension().and_then(|e| e.to_str()) != Some("html") {
        return Err(Error::ConfigParse(format!(
            "Page '{}' must be an .html file",
            name
        )));
    }
    if name.contains('\\') || name.starts_with("./") {
        return Err(Error::ConfigParse(format!(
            "Page '{}' must be written as a plain forward-slash path",
            name
        )));
    }
    Ok(())
}

/// Validate and convert a path string to PathBuf.
///
/// Rejects absolute paths and parent directory references (`..`) so a
/// site.toml cannot read templates from, or write output to, locations
/// outside the project directory.
///
/// # Arguments
///
/// * `path_str` - The path string from site.toml
/// * `field_name` - Name of the field for error messages
///
/// # Examples
///
/// ```text
/// validate_path("templates", "site.source_dir")        → Ok(PathBuf)
/// validate_path("/etc", "site.source_dir")             → Err("Absolute paths not allowed...")
/// validate_path("../elsewhere", "site.output_dir")     → Err("Parent directory references...")
/// ```
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    if path.is_absolute() || path_str.starts_with('/') {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}
