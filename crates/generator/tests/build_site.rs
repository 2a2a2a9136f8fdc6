use chrono::NaiveDate;
use lingosite_core::{SiteConfig, parse_site_toml};
use lingosite_generator::{BuildOptions, Document, FsSink, build_site};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

const SITE_TOML: &str = r#"
[site]
base_url = "https://www.example.org"
source_dir = "templates"
output_dir = "dist"
default_locale = "en"
locales = ["en", "zh-CN", "ja"]

[translations]
global = "i18n/global.toml"
pages_dir = "i18n/pages"

[sitemap]
default_changefreq = "monthly"
default_priority = 0.6

[cross_reference]
city_details = "data/city-details.json"

[[page]]
name = "index.html"
changefreq = "daily"
priority = 1.0

[[page]]
name = "beijing.html"
priority = 0.8
city_details = true

[[page]]
name = "food.html"

[[page]]
name = "shanghai.html"
"#;

const GLOBAL: &str = r#"
[en]
navHome = "Home"
navFood = "Food"

[zh-CN]
navHome = "首页"
navFood = "美食"
"#;

const INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title data-lang-key="navHome">Home</title>
    <link rel="canonical" href="https://www.example.org/index.html">
    <script src="js/translations.js"></script>
</head>
<body>
    <nav>
        <a href="index.html" data-lang-key="navHome">Home</a>
        <a href="food.html#hotpot" data-lang-key="navFood">Food</a>
        <a href="beijing.html">Beijing</a>
        <a href="shanghai.html">Shanghai</a>
    </nav>
    <img src="images/hero-wall.jpg" alt="Great Wall">
    <img src="https://cdn.example.com/map.png" alt="">
    <script src="js/app.js"></script>
</body>
</html>
"#;

const BEIJING: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title id="page-title">Beijing</title>
    <meta name="description" id="meta-desc" content="">
    <script type="application/ld+json">{"@type": "TouristDestination", "url": "https://www.example.org/beijing.html"}</script>
</head>
<body>
    <a id="back-link" href="./index.html">Back</a>
    <h1 id="city-name"></h1>
    <p id="city-sub"></p>
    <div id="city-content"></div>
    <script>
        const translations = {
            en: { pageTitle: 'Beijing Guide', cityName: 'Beijing', metaDesc: 'The capital',
                  contentHtml: '<p>The <strong>Forbidden City</strong></p>' },
            'zh-CN': { pageTitle: '北京指南', cityName: '北京', metaDesc: '首都',
                       contentHtml: '<p><strong>故宫</strong></p>' },
        };
    </script>
</body>
</html>
"#;

const FOOD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title data-lang-key="foodTitle">Food</title>
</head>
<body>
    <h2 id="hotpot" data-lang-key="hotpotTitle">Hotpot</h2>
    <a href="index.html">Home</a>
</body>
</html>
"#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn fixture() -> (TempDir, SiteConfig) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "site.toml", SITE_TOML);
    write(root, "i18n/global.toml", GLOBAL);
    write(root, "i18n/pages/food.toml", "[ja]\nfoodTitle = \"グルメ\"\nhotpotTitle = \"火鍋\"\n");
    write(root, "data/city-details.json", r#"{"beijing": {"population": 21540000}}"#);
    write(root, "templates/index.html", INDEX);
    write(root, "templates/beijing.html", BEIJING);
    write(root, "templates/food.html", FOOD);
    // shanghai.html intentionally absent

    let config = parse_site_toml(root.join("site.toml")).unwrap();
    (dir, config)
}

fn options() -> BuildOptions {
    BuildOptions::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

fn read_tree(dir: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(dir).unwrap().to_path_buf();
            (relative, fs::read_to_string(entry.path()).unwrap())
        })
        .collect()
}

#[test]
fn test_one_artifact_per_page_and_locale() {
    let (dir, config) = fixture();
    let report = build_site(&config, &options(), &mut FsSink).unwrap();

    // 3 loadable pages × 3 locales
    assert_eq!(report.artifacts.len(), 9);
    assert_eq!(report.sitemap_entries, 9);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].page, "shanghai.html");

    let out = dir.path().join("dist");
    for page in ["index.html", "beijing.html", "food.html"] {
        assert!(out.join(page).is_file(), "{page}");
        assert!(out.join("zh-CN").join(page).is_file(), "zh-CN/{page}");
        assert!(out.join("ja").join(page).is_file(), "ja/{page}");
    }
    assert!(!out.join("shanghai.html").exists());

    let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
    assert_eq!(sitemap.matches("<url>").count(), 9);
}

#[test]
fn test_rebuild_is_byte_identical() {
    let (dir, config) = fixture();
    build_site(&config, &options(), &mut FsSink).unwrap();
    let first = read_tree(&dir.path().join("dist"));

    build_site(&config, &options(), &mut FsSink).unwrap();
    let second = read_tree(&dir.path().join("dist"));

    assert_eq!(first.len(), 10);
    assert_eq!(first, second);
}

#[test]
fn test_templates_are_not_modified() {
    let (dir, config) = fixture();
    build_site(&config, &options(), &mut FsSink).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("templates/index.html")).unwrap(),
        INDEX
    );
}

#[test]
fn test_urls_agree_across_canonical_hreflang_and_sitemap() {
    let (dir, config) = fixture();
    build_site(&config, &options(), &mut FsSink).unwrap();
    let out = dir.path().join("dist");
    let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();

    for (prefix, locale) in [("", "en"), ("zh-CN/", "zh-CN"), ("ja/", "ja")] {
        let relative = format!("{prefix}beijing.html");
        let html = fs::read_to_string(out.join(&relative)).unwrap();
        let doc = Document::parse(&html);
        let expected = format!("https://www.example.org/{relative}");

        let canonical = doc
            .find(&|el| el.is("link") && el.attr_eq("rel", "canonical"))
            .unwrap();
        assert_eq!(canonical.attr("href"), Some(expected.as_str()));

        let own_alternate = doc
            .find(&|el| el.is("link") && el.attr("hreflang") == Some(locale))
            .unwrap();
        assert_eq!(own_alternate.attr("href"), Some(expected.as_str()));

        assert_eq!(
            doc.count(&|el| el.is("link") && el.has_attr("hreflang")),
            4,
            "{locale}: three locales plus x-default"
        );
        assert!(sitemap.contains(&format!("<loc>{expected}</loc>")));
    }
}

#[test]
fn test_localized_content_and_links() {
    let (dir, config) = fixture();
    build_site(&config, &options(), &mut FsSink).unwrap();
    let out = dir.path().join("dist");

    let zh_index = fs::read_to_string(out.join("zh-CN/index.html")).unwrap();
    assert!(zh_index.contains(r#"<a href="/zh-CN/beijing.html">Beijing</a>"#));
    assert!(zh_index.contains(r#"<a href="/zh-CN/food.html#hotpot" data-lang-key="navFood">美食</a>"#));
    assert!(zh_index.contains(r#"<img src="images/hero-wall.webp" alt="Great Wall">"#));
    assert!(zh_index.contains(r#"<img src="https://cdn.example.com/map.png" alt="">"#));
    assert!(!zh_index.contains("translations.js"));

    let en_index = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(en_index.contains(r#"<a href="/food.html#hotpot" data-lang-key="navFood">Food</a>"#));

    // ja has no global dictionary: falls back to en
    let ja_index = fs::read_to_string(out.join("ja/index.html")).unwrap();
    assert!(ja_index.contains(r#"<html lang="ja">"#));
    assert!(ja_index.contains(r#"data-lang-key="navHome">Home</a>"#));

    let zh_beijing = fs::read_to_string(out.join("zh-CN/beijing.html")).unwrap();
    assert!(zh_beijing.contains(r#"<title id="page-title">北京指南</title>"#));
    assert!(zh_beijing.contains(r#"<div id="city-content"><p><strong>故宫</strong></p></div>"#));
    assert!(zh_beijing.contains(r#"<p id="city-sub">首都</p>"#));
    assert!(zh_beijing.contains(r#"<a id="back-link" href="/zh-CN/index.html">Back</a>"#));
    assert!(zh_beijing.contains(r#""url": "https://www.example.org/zh-CN/beijing.html""#));
    assert!(zh_beijing.contains(r#""cityDetails":{"beijing":{"population":21540000}}"#));
    assert!(!zh_beijing.contains("const translations"));

    let ja_food = fs::read_to_string(out.join("ja/food.html")).unwrap();
    assert!(ja_food.contains(r#"<h2 id="hotpot" data-lang-key="hotpotTitle">火鍋</h2>"#));
    assert!(!ja_food.contains("cityDetails"));
}

#[test]
fn test_sitemap_metadata_per_page() {
    let (dir, config) = fixture();
    build_site(&config, &options(), &mut FsSink).unwrap();
    let sitemap = fs::read_to_string(dir.path().join("dist/sitemap.xml")).unwrap();

    assert_eq!(sitemap.matches("<changefreq>daily</changefreq>").count(), 3);
    assert_eq!(sitemap.matches("<changefreq>monthly</changefreq>").count(), 6);
    assert_eq!(sitemap.matches("<priority>0.8</priority>").count(), 3);
    assert_eq!(sitemap.matches("<priority>0.6</priority>").count(), 3);
    assert_eq!(sitemap.matches("<lastmod>2024-06-01</lastmod>").count(), 9);

    let index = sitemap.find("<loc>https://www.example.org/index.html</loc>").unwrap();
    let index_ja = sitemap.find("<loc>https://www.example.org/ja/index.html</loc>").unwrap();
    let beijing = sitemap.find("<loc>https://www.example.org/beijing.html</loc>").unwrap();
    assert!(index < index_ja && index_ja < beijing);
}
