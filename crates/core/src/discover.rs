// ABOUTME: HTML page and static asset discovery under a site root with include/exclude filtering.
// ABOUTME: Provides ScanOptions, its fluent builder, and deterministic priority-first ordering.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SiteError};

/// Directories never descended into unless configured otherwise.
pub const DEFAULT_SKIP_DIRS: &[&str] = &["node_modules", ".git", "backups"];

/// Options controlling which HTML files a pass visits.
///
/// `include` and `exclude` are regular expressions matched against the
/// `/`-separated path relative to `root`. An empty `include` list keeps
/// everything.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub skip_dirs: Vec<String>,
    pub skip_minified: bool,
    pub priority: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            include: Vec::new(),
            exclude: Vec::new(),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            skip_minified: true,
            priority: Vec::new(),
        }
    }
}

impl ScanOptions {
    /// Start building options for the given root.
    pub fn builder(root: impl Into<PathBuf>) -> ScanOptionsBuilder {
        ScanOptionsBuilder::new(root)
    }
}

/// Builder for constructing ScanOptions with custom filters.
#[derive(Debug, Clone)]
pub struct ScanOptionsBuilder {
    opts: ScanOptions,
}

impl ScanOptionsBuilder {
    /// Create a builder with default options for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            opts: ScanOptions {
                root: root.into(),
                ..ScanOptions::default()
            },
        }
    }

    /// Only keep files whose relative path matches `pattern`.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.opts.include.push(pattern.into());
        self
    }

    /// Drop files whose relative path matches `pattern`.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.opts.exclude.push(pattern.into());
        self
    }

    /// Never descend into directories with this name.
    pub fn skip_dir(mut self, name: impl Into<String>) -> Self {
        self.opts.skip_dirs.push(name.into());
        self
    }

    /// Skip or keep `*.min.html` files.
    pub fn skip_minified(mut self, skip: bool) -> Self {
        self.opts.skip_minified = skip;
        self
    }

    /// List this relative path ahead of all others.
    pub fn priority(mut self, rel_path: impl Into<String>) -> Self {
        self.opts.priority.push(rel_path.into());
        self
    }

    /// Build the ScanOptions.
    pub fn build(self) -> ScanOptions {
        self.opts
    }
}

/// Returns the `/`-separated path of `path` relative to `root`.
///
/// Falls back to the full path when `path` does not live under `root`.
pub fn relative_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn compile_patterns(patterns: &[String], root: &Path) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| {
                SiteError::config(root, format!("compile pattern {:?}", p), Some(e.into()))
            })
        })
        .collect()
}

fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e.as_ref())))
        .unwrap_or(false)
}

/// Finds every HTML file under `opts.root` that passes the filters.
///
/// Priority files come first in the order they were listed, the rest follow
/// sorted by relative path. A missing root is the only fatal error.
pub fn discover_html(opts: &ScanOptions) -> Result<Vec<PathBuf>> {
    if !opts.root.is_dir() {
        return Err(SiteError::missing_root(&opts.root, "discover"));
    }

    let include = compile_patterns(&opts.include, &opts.root)?;
    let exclude = compile_patterns(&opts.exclude, &opts.root)?;

    let walker = WalkDir::new(&opts.root).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        entry
            .file_name()
            .to_str()
            .map(|name| !opts.skip_dirs.iter().any(|d| d == name))
            .unwrap_or(true)
    });

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), &["html"]) {
            continue;
        }

        let rel = relative_path(entry.path(), &opts.root);
        if opts.skip_minified && rel.ends_with(".min.html") {
            continue;
        }
        if !include.is_empty() && !include.iter().any(|re| re.is_match(&rel)) {
            continue;
        }
        if exclude.iter().any(|re| re.is_match(&rel)) {
            continue;
        }
        found.push((rel, entry.into_path()));
    }

    let rank = |rel: &str| {
        opts.priority
            .iter()
            .position(|p| p == rel)
            .unwrap_or(usize::MAX)
    };
    found.sort_by(|a, b| rank(&a.0).cmp(&rank(&b.0)).then_with(|| a.0.cmp(&b.0)));

    debug!(root = %opts.root.display(), files = found.len(), "discovered html files");
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

/// Every file under `dir` with one of `extensions` (case-insensitive, no
/// dot), sorted by path. A missing directory yields nothing.
pub fn discover_assets<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> Vec<PathBuf> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "asset directory absent");
        return Vec::new();
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), extensions))
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<html></html>").unwrap();
    }

    fn rels(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files.iter().map(|p| relative_path(p, root)).collect()
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let opts = ScanOptions::builder("/definitely/not/here").build();
        let err = discover_html(&opts).unwrap_err();
        assert!(err.is_missing_root());
    }

    #[test]
    fn test_skips_dirs_minified_and_non_html() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "index.html");
        touch(dir.path(), "index.min.html");
        touch(dir.path(), "node_modules/pkg/readme.html");
        touch(dir.path(), "blog/post.html");
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let opts = ScanOptions::builder(dir.path()).build();
        let files = discover_html(&opts).unwrap();
        assert_eq!(rels(dir.path(), &files), vec!["blog/post.html", "index.html"]);
    }

    #[test]
    fn test_priority_then_sorted() {
        let dir = TempDir::new().unwrap();
        for rel in ["a.html", "contact.html", "index.html", "z/b.html"] {
            touch(dir.path(), rel);
        }
        let opts = ScanOptions::builder(dir.path())
            .priority("index.html")
            .priority("contact.html")
            .build();
        let files = discover_html(&opts).unwrap();
        assert_eq!(
            rels(dir.path(), &files),
            vec!["index.html", "contact.html", "a.html", "z/b.html"]
        );
    }

    #[test]
    fn test_include_and_exclude_patterns() {
        let dir = TempDir::new().unwrap();
        for rel in ["index.html", "blog/one.html", "blog/drafts/two.html"] {
            touch(dir.path(), rel);
        }
        let opts = ScanOptions::builder(dir.path())
            .include(r"^blog/")
            .exclude(r"/drafts/")
            .build();
        let files = discover_html(&opts).unwrap();
        assert_eq!(rels(dir.path(), &files), vec!["blog/one.html"]);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let dir = TempDir::new().unwrap();
        let opts = ScanOptions::builder(dir.path()).include("(").build();
        assert!(discover_html(&opts).unwrap_err().is_config());
    }

    #[test]
    fn test_discover_assets_by_extension() {
        let dir = TempDir::new().unwrap();
        for rel in ["css/site.CSS", "css/vendor/a.css", "css/readme.md", "css/b.js"] {
            touch(dir.path(), rel);
        }
        let css = dir.path().join("css");
        let files = discover_assets(&css, &["css", "js"]);
        assert_eq!(rels(&css, &files), vec!["b.js", "site.CSS", "vendor/a.css"]);
        assert!(discover_assets(&dir.path().join("fonts"), &["woff2"]).is_empty());
    }

    #[test]
    fn test_empty_root_finds_nothing() {
        let dir = TempDir::new().unwrap();
        let opts = ScanOptions::builder(dir.path()).build();
        assert!(discover_html(&opts).unwrap().is_empty());
    }
}
