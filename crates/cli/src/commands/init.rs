use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SITE_TOML: &str = r#"# lingosite configuration
# All paths are relative to this file.

[site]
base_url = "https://www.example.org"
source_dir = "templates"
output_dir = "dist"
default_locale = "en"
locales = ["en", "zh-CN"]

[translations]
global = "i18n/global.toml"
# pages_dir = "i18n/pages"        # optional <page>.toml files per page
strip_scripts = ["translations.js"]

[images]
raster_extensions = ["jpg", "jpeg", "png"]
target_extension = "webp"

[sitemap]
default_changefreq = "weekly"
default_priority = 0.5

# [cross_reference]
# city_details = "data/city-details.json"

[[page]]
name = "index.html"
changefreq = "daily"
priority = 1.0
"#;

const GLOBAL_TOML: &str = r#"# Shared navigation strings, one table per locale.
# Use { html = "..." } for values that contain markup.

[en]
siteTitle = "Travel Guide"
navHome = "Home"
welcome = { html = "Welcome to <strong>our guide</strong>" }

[zh-CN]
siteTitle = "旅游指南"
navHome = "首页"
welcome = { html = "欢迎来到<strong>我们的指南</strong>" }
"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title data-lang-key="siteTitle">Travel Guide</title>
</head>
<body>
    <nav>
        <a href="index.html" data-lang-key="navHome">Home</a>
    </nav>
    <main>
        <p data-lang-key="welcome">Welcome to our guide</p>
    </main>
</body>
</html>
"#;

/// Scaffold a new site into an existing directory
pub fn run(path: PathBuf) -> Result<()> {
    println!("Initializing site directory: {}", path.display());

    if !path.exists() {
        anyhow::bail!(
            "Directory '{}' does not exist. Create it first: mkdir {}",
            path.display(),
            path.display()
        );
    }

    let site_toml_path = path.join("site.toml");
    if site_toml_path.exists() {
        anyhow::bail!(
            "site.toml already exists at {}\nHint: Delete it first or use a different directory",
            site_toml_path.display()
        );
    }

    write_new(&path, "site.toml", SITE_TOML)?;
    write_new(&path, "i18n/global.toml", GLOBAL_TOML)?;
    write_new(&path, "templates/index.html", INDEX_HTML)?;

    println!("\n✓ Initialization complete!");
    println!("\nGenerated structure:");
    println!("  {}/", path.display());
    println!("  ├── site.toml            ← Locales, base URL and page list");
    println!("  ├── i18n/");
    println!("  │   └── global.toml      ← Shared navigation strings");
    println!("  └── templates/");
    println!("      └── index.html       ← Tag text with data-lang-key");

    println!("\nNext steps:");
    println!("  1. Edit site.toml (set base_url and locales)");
    println!("  2. Add pages to templates/ and list them in site.toml");
    println!("  3. Build: lingosite build {}", path.display());

    Ok(())
}

/// Write a scaffold file, leaving any existing file alone
fn write_new(base: &Path, relative: &str, contents: &str) -> Result<()> {
    let path = base.join(relative);
    if path.exists() {
        println!("⚠ Keeping existing {}", relative);
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
