// ABOUTME: Error types for sitekit including the ErrorCode enum and SiteError struct.
// ABOUTME: Provides categorized per-file errors with convenience constructors and boolean helpers.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Error codes representing the categories of failure a maintenance pass can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    MissingRoot,
    Io,
    Decode,
    MissingTag,
    Config,
    Report,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::MissingRoot => "root directory does not exist",
            ErrorCode::Io => "I/O error",
            ErrorCode::Decode => "decode error",
            ErrorCode::MissingTag => "missing tag",
            ErrorCode::Config => "configuration error",
            ErrorCode::Report => "report error",
        };
        write!(f, "{}", s)
    }
}

/// The error type shared by every sitekit crate.
///
/// Only `MissingRoot` is fatal for a batch; every other code is caught at the
/// per-file boundary, logged, and recorded in the batch report.
#[derive(Debug, thiserror::Error)]
pub struct SiteError {
    pub code: ErrorCode,
    pub path: PathBuf,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sitekit: {} {}: {}", self.op, self.path.display(), self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl SiteError {
    fn new(
        code: ErrorCode,
        path: impl Into<PathBuf>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            path: path.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a MissingRoot error.
    pub fn missing_root(path: impl Into<PathBuf>, op: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingRoot, path, op, None)
    }

    /// Create an Io error.
    pub fn io(
        path: impl Into<PathBuf>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Io, path, op, source)
    }

    /// Create a Decode error.
    pub fn decode(
        path: impl Into<PathBuf>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Decode, path, op, source)
    }

    /// Create a MissingTag error naming the absent tag.
    pub fn missing_tag(path: impl Into<PathBuf>, op: impl Into<String>, tag: &str) -> Self {
        Self::new(
            ErrorCode::MissingTag,
            path,
            op,
            Some(anyhow::anyhow!("no <{}> tag found", tag)),
        )
    }

    /// Create a Config error.
    pub fn config(
        path: impl Into<PathBuf>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Config, path, op, source)
    }

    /// Create a Report error.
    pub fn report(
        path: impl Into<PathBuf>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Report, path, op, source)
    }

    /// Returns true if this is a MissingRoot error.
    pub fn is_missing_root(&self) -> bool {
        self.code == ErrorCode::MissingRoot
    }

    /// Returns true if this is an Io error.
    pub fn is_io(&self) -> bool {
        self.code == ErrorCode::Io
    }

    /// Returns true if this is a Decode error.
    pub fn is_decode(&self) -> bool {
        self.code == ErrorCode::Decode
    }

    /// Returns true if this is a MissingTag error.
    pub fn is_missing_tag(&self) -> bool {
        self.code == ErrorCode::MissingTag
    }

    /// Returns true if this is a Config error.
    pub fn is_config(&self) -> bool {
        self.code == ErrorCode::Config
    }

    /// Returns true if this is a Report error.
    pub fn is_report(&self) -> bool {
        self.code == ErrorCode::Report
    }
}

/// Result alias used throughout sitekit.
pub type Result<T> = std::result::Result<T, SiteError>;

/// A per-file failure as recorded in batch reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

impl FileError {
    pub fn new(file: impl Into<String>, err: &SiteError) -> Self {
        Self {
            file: file.into(),
            error: err.to_string(),
        }
    }
}
