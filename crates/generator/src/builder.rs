//! Build orchestration: pages × locales → artifacts + sitemap.
//!
//! ```text
//! 1. Load       templates, translation tables, cross-reference data
//! 2. Localize   every (page, locale) on the rayon pool
//! 3. Write      artifacts in page-major, locale-minor order, then sitemap.xml
//! ```
//!
//! Stage 2 never touches the filesystem and stage 3 is sequential, so the
//! bytes written and the sitemap order do not depend on scheduling.

use crate::dom::Document;
use crate::extract::extract_embedded;
use crate::localize::{LocalizeContext, localize};
use crate::output::OutputSink;
use crate::paths::PathPlanner;
use crate::sitemap::SitemapBuilder;
use chrono::NaiveDate;
use lingosite_core::translation::load_locale_table;
use lingosite_core::{Error, Locale, LocaleTable, PageSpec, Result, SiteConfig, TranslationStore};
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Per-run knobs that do not belong in `site.toml`
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Overrides `site.output_dir`
    pub output_dir: Option<PathBuf>,
    /// `lastmod` for every sitemap entry
    pub generated_on: NaiveDate,
}

impl BuildOptions {
    pub fn new(generated_on: NaiveDate) -> Self {
        BuildOptions {
            output_dir: None,
            generated_on,
        }
    }
}

/// Why a page produced no artifacts
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingTemplate(PathBuf),
    Unreadable(String),
    MalformedTranslations(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingTemplate(path) => write!(f, "template not found: {}", path.display()),
            SkipReason::Unreadable(e) => write!(f, "template unreadable: {}", e),
            SkipReason::MalformedTranslations(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPage {
    pub page: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Every file written except the sitemap, in write order
    pub artifacts: Vec<PathBuf>,
    pub skipped: Vec<SkippedPage>,
    pub sitemap_path: PathBuf,
    pub sitemap_entries: usize,
}

/// A parsed template together with its embedded translation table
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    pub document: Document,
    pub embedded: Option<LocaleTable>,
}

struct Artifact {
    page: String,
    locale: Locale,
    path: PathBuf,
    html: String,
}

/// Read and parse one template, pulling out its embedded translations.
///
/// # Errors
///
/// Returns the reason the page must be skipped.
pub fn load_template(config: &SiteConfig, page: &PageSpec) -> std::result::Result<LoadedTemplate, SkipReason> {
    let path = config.source_dir().join(&page.name);
    let html = fs::read_to_string(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SkipReason::MissingTemplate(path.clone()),
        _ => SkipReason::Unreadable(e.to_string()),
    })?;

    let document = Document::parse(&html);
    let embedded = extract_embedded(&document, &page.name)
        .map_err(|e| SkipReason::MalformedTranslations(e.to_string()))?;

    Ok(LoadedTemplate { document, embedded })
}

/// Global dictionary file, required
///
/// # Errors
///
/// Fails if the file is missing or is not a valid locale table.
pub fn load_global_translations(config: &SiteConfig) -> Result<LocaleTable> {
    let path = config.resolve(&config.translations.global);
    if !path.exists() {
        return Err(Error::InvalidData(format!(
            "Global translations not found: {}",
            path.display()
        )));
    }
    load_locale_table(&path)
}

/// `<pages_dir>/<stem>.toml` for `page`, when configured and present
///
/// # Errors
///
/// Fails if the file exists but cannot be parsed.
pub fn load_external_page(config: &SiteConfig, page: &PageSpec) -> Result<Option<LocaleTable>> {
    let Some(dir) = &config.translations.pages_dir else {
        return Ok(None);
    };
    let path = config.resolve(dir).join(format!("{}.toml", page.stem()));
    if !path.exists() {
        return Ok(None);
    }
    load_locale_table(&path).map(Some)
}

/// Cross-reference JSON handed to client widgets, when configured
///
/// # Errors
///
/// Fails if the configured file cannot be read or is not valid JSON.
pub fn load_city_details(config: &SiteConfig) -> Result<Option<Value>> {
    let Some(relative) = &config.cross_reference.city_details else {
        return Ok(None);
    };
    let path = config.resolve(relative);
    let content = fs::read_to_string(&path)?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::InvalidData(format!("{}: {}", path.display(), e)))
}

/// Generate every configured (page, locale) artifact and the sitemap.
///
/// Pages whose template is missing or whose embedded or external
/// translations are malformed are skipped and listed in the report. Any
/// write failure aborts the build.
pub fn build_site(
    config: &SiteConfig,
    options: &BuildOptions,
    sink: &mut dyn OutputSink,
) -> Result<BuildReport> {
    let mut planner = PathPlanner::from_config(config);
    if let Some(dir) = &options.output_dir {
        planner = planner.with_output_root(dir.clone());
    }

    let mut store = TranslationStore::new(
        config.site.default_locale.clone(),
        load_global_translations(config)?,
    );
    let city_details = load_city_details(config)?;

    let mut report = BuildReport {
        sitemap_path: planner.sitemap_path(),
        ..BuildReport::default()
    };

    let mut templates: Vec<(&PageSpec, Document)> = Vec::with_capacity(config.pages.len());
    for page in &config.pages {
        let loaded = load_template(config, page).and_then(|loaded| {
            load_external_page(config, page)
                .map(|external| (loaded, external))
                .map_err(|e| SkipReason::MalformedTranslations(e.to_string()))
        });
        match loaded {
            Ok((loaded, external)) => {
                for table in [loaded.embedded, external].into_iter().flatten() {
                    store.insert_page(&page.name, table);
                }
                info!("Loaded {}", page.name);
                templates.push((page, loaded.document));
            }
            Err(reason) => {
                warn!("Skipping {}: {}", page.name, reason);
                report.skipped.push(SkippedPage {
                    page: page.name.clone(),
                    reason,
                });
            }
        }
    }

    let known_pages: HashSet<String> = config.page_names().map(String::from).collect();
    let ctx = LocalizeContext {
        planner: &planner,
        pages: &known_pages,
        images: &config.images,
        strip_scripts: &config.translations.strip_scripts,
    };

    let rendered = templates
        .par_iter()
        .map(|(page, document)| {
            let details = city_details.as_ref().filter(|_| page.city_details);
            render_page(document, page, details, &store, &ctx)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut sitemap = SitemapBuilder::new();
    for artifact in rendered.into_iter().flatten() {
        sink.write(&artifact.path, &artifact.html)?;
        debug!("Wrote {}", artifact.path.display());

        sitemap.record(
            planner.canonical_url(&artifact.page, &artifact.locale),
            options.generated_on,
            config.changefreq_for(&artifact.page),
            config.priority_for(&artifact.page),
        );
        report.artifacts.push(artifact.path);
    }

    sink.write(&report.sitemap_path, &sitemap.to_xml()?)?;
    report.sitemap_entries = sitemap.len();

    info!(
        "Wrote {} artifacts and {} sitemap entries ({} pages skipped)",
        report.artifacts.len(),
        report.sitemap_entries,
        report.skipped.len()
    );
    Ok(report)
}

fn render_page(
    document: &Document,
    page: &PageSpec,
    city_details: Option<&Value>,
    store: &TranslationStore,
    ctx: &LocalizeContext<'_>,
) -> Result<Vec<Artifact>> {
    ctx.planner
        .locales()
        .iter()
        .map(|locale| {
            let dictionary = store.resolve(&page.name, locale);
            let localized = localize(document, &page.name, locale, &dictionary, city_details, ctx)?;
            Ok(Artifact {
                page: page.name.clone(),
                locale: locale.clone(),
                path: ctx.planner.output_path(&page.name, locale),
                html: localized.to_html(),
            })
        })
        .collect()
}
