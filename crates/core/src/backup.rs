// ABOUTME: Timestamped backup copies taken before a file is rewritten in place.
// ABOUTME: Mirrors the site's relative layout under <backup_root>/<YYYYmmdd_HHMMSS>/.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{Result, SiteError};

/// A backup run rooted at one timestamped directory.
#[derive(Debug, Clone)]
pub struct Backup {
    dir: PathBuf,
}

impl Backup {
    /// Create a backup run under `backup_root` stamped with `started`.
    pub fn new(backup_root: impl AsRef<Path>, started: DateTime<Local>) -> Self {
        Self {
            dir: backup_root
                .as_ref()
                .join(started.format("%Y%m%d_%H%M%S").to_string()),
        }
    }

    /// Directory this run copies files into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy `source` to `<dir>/<rel_path>`, creating parent directories.
    pub fn save(&self, source: &Path, rel_path: &str) -> Result<PathBuf> {
        let target = self.dir.join(rel_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SiteError::io(parent, "create backup dir", Some(e.into())))?;
        }
        fs::copy(source, &target)
            .map_err(|e| SiteError::io(source, "backup", Some(e.into())))?;
        Ok(target)
    }
}
