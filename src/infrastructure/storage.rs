use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::Result;

/// Destination for a serialized report file.
pub trait ReportSink: Send + Sync {
    /// Stores `contents` under `filename` and returns where it went.
    fn deliver(&self, filename: &str, contents: &[u8]) -> Result<String>;
}

/// Writes reports into a directory, creating it on first use.
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ReportSink for DirectorySink {
    fn deliver(&self, filename: &str, contents: &[u8]) -> Result<String> {
        ensure_dir(&self.root)?;
        let path = self.root.join(filename);
        fs::write(&path, contents)?;
        Ok(path.display().to_string())
    }
}

pub fn ensure_reports_dir(reports_dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(reports_dir)?;
    Ok(reports_dir.to_path_buf())
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
