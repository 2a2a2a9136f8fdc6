// Output targets for generated artifacts (filesystem, in-memory for tests)

use lingosite_core::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a build writes its files
pub trait OutputSink {
    /// Write `contents` to `path`, replacing anything already there
    fn write(&mut self, path: &Path, contents: &str) -> Result<()>;
}

/// Writes to disk, creating parent directories as needed
#[derive(Debug, Default)]
pub struct FsSink;

impl OutputSink for FsSink {
    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        let wrap = |source| Error::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        fs::write(path, contents).map_err(wrap)
    }
}

/// Keeps every artifact in memory, keyed by path
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: BTreeMap<PathBuf, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
