use anyhow::{Context, Result};
use lingosite_core::parse_site_toml;
use lingosite_validator::validate_site;
use std::path::PathBuf;

pub fn run(path: PathBuf) -> Result<()> {
    println!("Validating site at: {}", path.display());

    let config_path = path.join("site.toml");
    let config = parse_site_toml(&config_path)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;

    println!("✓ site.toml valid");
    println!("  Base URL: {}", config.site.base_url);
    println!(
        "  Default locale: {} ({} locales)",
        config.site.default_locale,
        config.site.locales.len()
    );

    let report = validate_site(&config);

    for info in &report.info {
        println!("  {}", info);
    }
    if !report.warnings.is_empty() {
        println!();
        for warning in &report.warnings {
            println!("⚠ {}", warning);
        }
    }
    if !report.errors.is_empty() {
        println!();
        for error in &report.errors {
            println!("✗ {}", error);
        }
        anyhow::bail!("Validation failed with {} error(s)", report.errors.len());
    }

    println!("\n✓ Site is ready to build");
    Ok(())
}
