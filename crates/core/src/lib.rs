pub mod config;
pub mod error;
pub mod translation;
pub mod types;

pub use config::{parse_site_toml, parse_site_toml_str};
pub use error::{Error, Result};
pub use translation::{Dictionary, Layer, LocaleTable, TranslationStore, TranslationValue};
pub use types::*;
