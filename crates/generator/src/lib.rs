//! Multilingual static site generation.
//!
//! Templates are parsed once, localized per locale by a chain of pure
//! document transforms, and written under a directory-per-locale layout
//! together with a sitemap covering every artifact.

pub mod builder;
pub mod dom;
pub mod extract;
pub mod localize;
pub mod output;
pub mod paths;
pub mod sitemap;

pub use builder::{BuildOptions, BuildReport, SkipReason, SkippedPage, build_site};
pub use dom::Document;
pub use localize::{LocalizeContext, localize};
pub use output::{FsSink, MemorySink, OutputSink};
pub use paths::PathPlanner;
pub use sitemap::SitemapBuilder;
