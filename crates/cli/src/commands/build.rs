use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use lingosite_core::parse_site_toml;
use lingosite_generator::{BuildOptions, FsSink, build_site};
use std::path::PathBuf;

/// Generate the localized site
pub fn run(path: PathBuf, output: Option<PathBuf>, date: Option<NaiveDate>) -> Result<()> {
    println!("🔨 Building multilingual site...");
    println!("   Source: {}", path.display());

    if !path.exists() {
        anyhow::bail!("Site directory does not exist: {}", path.display());
    }

    let config_path = path.join("site.toml");
    if !config_path.exists() {
        anyhow::bail!(
            "site.toml not found in {}\nRun 'lingosite init {}' first",
            path.display(),
            path.display()
        );
    }

    let config = parse_site_toml(&config_path).context("Failed to parse site.toml")?;
    let output_dir = output.clone().unwrap_or_else(|| config.output_dir());
    println!("   Output: {}", output_dir.display());
    println!();

    println!("✓ Loaded: {}", config.site.base_url);
    println!(
        "  Locales: {}",
        config
            .site
            .locales
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Pages: {}", config.pages.len());
    println!();

    let options = BuildOptions {
        output_dir: output,
        generated_on: date.unwrap_or_else(|| Local::now().date_naive()),
    };

    println!("🌐 Localizing pages...");
    let report = build_site(&config, &options, &mut FsSink).context("Build failed")?;
    println!("   ✓ Wrote {} pages", report.artifacts.len());
    for skipped in &report.skipped {
        eprintln!("   ⚠ Warning: skipped {} ({})", skipped.page, skipped.reason);
    }

    println!("🗺  Writing sitemap...");
    println!(
        "   ✓ {} entries in {}",
        report.sitemap_entries,
        report.sitemap_path.display()
    );

    println!();
    println!("✅ Build complete!");
    println!("   Output: {}", output_dir.display());
    println!();
    println!("To test locally:");
    println!("   cd {} && python3 -m http.server 8000", output_dir.display());
    println!();

    Ok(())
}
