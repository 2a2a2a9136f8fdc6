//! `sitemap.xml` for every (page, locale) URL a build writes.

use chrono::NaiveDate;
use lingosite_core::{ChangeFreq, Error, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: NaiveDate,
    pub changefreq: ChangeFreq,
    pub priority: f64,
}

/// Collects entries in the order they are recorded
#[derive(Debug, Default)]
pub struct SitemapBuilder {
    entries: Vec<SitemapEntry>,
}

impl SitemapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, loc: String, lastmod: NaiveDate, changefreq: ChangeFreq, priority: f64) {
        self.entries.push(SitemapEntry {
            loc,
            lastmod,
            changefreq,
            priority,
        });
    }

    pub fn entries(&self) -> &[SitemapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as a sitemaps.org 0.9 `urlset`
    ///
    /// # Errors
    ///
    /// Returns `Error::Sitemap` if the XML writer fails.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut urlset = BytesStart::new("urlset");
        urlset.push_attribute(("xmlns", SITEMAP_NAMESPACE));
        write(&mut writer, Event::Start(urlset))?;

        for entry in &self.entries {
            write(&mut writer, Event::Start(BytesStart::new("url")))?;
            text_element(&mut writer, "loc", &entry.loc)?;
            text_element(&mut writer, "lastmod", &entry.lastmod.format("%Y-%m-%d").to_string())?;
            text_element(&mut writer, "changefreq", entry.changefreq.as_str())?;
            text_element(&mut writer, "priority", &format!("{:.1}", entry.priority))?;
            write(&mut writer, Event::End(BytesEnd::new("url")))?;
        }

        write(&mut writer, Event::End(BytesEnd::new("urlset")))?;

        let mut xml =
            String::from_utf8(writer.into_inner()).map_err(|e| Error::Sitemap(e.to_string()))?;
        xml.push('\n');
        Ok(xml)
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Sitemap(e.to_string()))
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}
