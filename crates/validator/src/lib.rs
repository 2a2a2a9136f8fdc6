//! Pre-flight checks for a site before building.
//!
//! Everything a build would skip, fall back on, or fail at is reported up
//! front: errors block a build, warnings describe degraded output.

use lingosite_core::{LocaleTable, SiteConfig};
use lingosite_generator::builder::{
    load_city_details, load_external_page, load_global_translations, load_template,
};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_site(config: &SiteConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    let default = &config.site.default_locale;

    match load_global_translations(config) {
        Ok(global) => {
            for locale in &config.site.locales {
                if global.get(locale.as_str()).is_none() {
                    report.warnings.push(format!(
                        "Global translations have no '{}' dictionary; falls back to '{}'",
                        locale, default
                    ));
                }
            }
        }
        Err(e) => report.errors.push(e.to_string()),
    }

    for page in &config.pages {
        let mut local = LocaleTable::new();

        match load_template(config, page) {
            Ok(loaded) => {
                if let Some(table) = loaded.embedded {
                    local.overlay(&table);
                }
            }
            Err(reason) => {
                report.errors.push(format!("{}: {}", page.name, reason));
                continue;
            }
        }

        match load_external_page(config, page) {
            Ok(Some(table)) => local.overlay(&table),
            Ok(None) => {}
            Err(e) => report.errors.push(format!("{}: {}", page.name, e)),
        }

        if local.is_empty() {
            debug!("{}: global translations only", page.name);
            continue;
        }
        for locale in &config.site.locales {
            if local.get(locale.as_str()).is_none() {
                report.warnings.push(format!(
                    "{}: no '{}' page translations; falls back to '{}'",
                    page.name, locale, default
                ));
            }
        }
    }

    if let Err(e) = load_city_details(config) {
        report.errors.push(format!("City details: {}", e));
    }

    check_optimized_images(config, &mut report);

    report.info.push(format!("Pages: {}", config.pages.len()));
    report.info.push(format!(
        "Locales: {}",
        config
            .site
            .locales
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    report
        .info
        .push(format!("Expected artifacts: {}", config.expected_artifacts()));

    report
}

/// Rewritten references point at `<stem>.<target>`; warn where that file is missing
fn check_optimized_images(config: &SiteConfig, report: &mut ValidationReport) {
    let source = config.source_dir();
    let images = &config.images;

    for entry in WalkDir::new(&source)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let is_raster = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                images
                    .raster_extensions
                    .iter()
                    .any(|r| r.eq_ignore_ascii_case(ext))
            });
        if !is_raster {
            continue;
        }

        let optimized = path.with_extension(&images.target_extension);
        if !optimized.exists() {
            report.warnings.push(format!(
                "No .{} version of {}",
                images.target_extension,
                display_relative(path, &source)
            ));
        }
    }
}

fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingosite_core::parse_site_toml_str;
    use std::fs;
    use tempfile::TempDir;

    const SITE: &str = r#"
[site]
base_url = "https://www.example.org"
source_dir = "templates"
output_dir = "dist"
default_locale = "en"
locales = ["en", "zh-CN", "ja"]

[translations]
global = "i18n/global.toml"

[[page]]
name = "index.html"

[[page]]
name = "beijing.html"
"#;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn valid_site(root: &Path) -> SiteConfig {
        write(
            root,
            "i18n/global.toml",
            "[en]\nnavHome = \"Home\"\n[zh-CN]\nnavHome = \"首页\"\n[ja]\nnavHome = \"ホーム\"\n",
        );
        write(root, "templates/index.html", "<html><head></head></html>");
        write(
            root,
            "templates/beijing.html",
            r#"<script type="application/json" data-translations>
{"en": {"cityName": "Beijing"}, "zh-CN": {"cityName": "北京"}, "ja": {"cityName": "北京"}}
</script>"#,
        );
        parse_site_toml_str(SITE, root).unwrap()
    }

    #[test]
    fn test_valid_site() {
        let dir = TempDir::new().unwrap();
        let config = valid_site(dir.path());
        let report = validate_site(&config);
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert!(report.info.contains(&"Expected artifacts: 6".to_string()));
        assert!(report.info.contains(&"Locales: en, zh-CN, ja".to_string()));
    }

    #[test]
    fn test_missing_template_is_error() {
        let dir = TempDir::new().unwrap();
        let config = valid_site(dir.path());
        fs::remove_file(dir.path().join("templates/index.html")).unwrap();

        let report = validate_site(&config);
        assert!(!report.is_valid());
        assert!(report.errors[0].starts_with("index.html: template not found"));
    }

    #[test]
    fn test_malformed_embedded_translations_is_error() {
        let dir = TempDir::new().unwrap();
        let config = valid_site(dir.path());
        write(
            dir.path(),
            "templates/beijing.html",
            "<script>const translations = { en: { a: 'b' };</script>",
        );

        let report = validate_site(&config);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("beijing.html"));
    }

    #[test]
    fn test_missing_global_file_is_error() {
        let dir = TempDir::new().unwrap();
        let config = valid_site(dir.path());
        fs::remove_file(dir.path().join("i18n/global.toml")).unwrap();

        let report = validate_site(&config);
        assert!(report.errors.iter().any(|e| e.contains("Global translations not found")));
    }

    #[test]
    fn test_locale_fallbacks_are_warnings() {
        let dir = TempDir::new().unwrap();
        let config = valid_site(dir.path());
        write(dir.path(), "i18n/global.toml", "[en]\nnavHome = \"Home\"\n");
        write(
            dir.path(),
            "templates/beijing.html",
            r#"<script type="application/json" data-translations>{"en": {"cityName": "Beijing"}}</script>"#,
        );

        let report = validate_site(&config);
        assert!(report.is_valid());
        // zh-CN and ja missing globally and on beijing.html
        assert_eq!(report.warnings.len(), 4, "{:?}", report.warnings);
        assert!(report
            .warnings
            .iter()
            .any(|w| w == "beijing.html: no 'ja' page translations; falls back to 'en'"));
    }

    #[test]
    fn test_raster_without_optimized_sibling() {
        let dir = TempDir::new().unwrap();
        let config = valid_site(dir.path());
        write(dir.path(), "templates/images/wall.jpg", "");
        write(dir.path(), "templates/images/wall.webp", "");
        write(dir.path(), "templates/images/temple.PNG", "");
        write(dir.path(), "templates/images/logo.svg", "");

        let report = validate_site(&config);
        assert_eq!(report.warnings.len(), 1, "{:?}", report.warnings);
        assert!(report.warnings[0].contains("temple.PNG"));
    }

    #[test]
    fn test_bad_city_details_is_error() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_site(dir.path());
        config.cross_reference.city_details = Some("data/cities.json".into());
        write(dir.path(), "data/cities.json", "{not json");

        let report = validate_site(&config);
        assert!(report.errors.iter().any(|e| e.starts_with("City details:")));
    }
}
