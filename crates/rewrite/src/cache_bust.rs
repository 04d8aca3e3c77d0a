// ABOUTME: Content-hashed asset names: versioned copies, a cache-manifest.json, and rewritten page references.
// ABOUTME: Revert reads the manifest back, points pages at the original names and removes the copies.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use sitekit_core::{
    discover_assets, discover_html, relative_path, Backup, Document, FileError, Result,
    ScanOptions, SiteError,
};

use crate::tags::{scan_tags, CriticalRegions};

pub const DEFAULT_MANIFEST: &str = "cache-manifest.json";

/// Attributes whose URLs are rewritten.
const URL_ATTRS: &[&str] = &["src", "href"];

/// Which assets get versioned names and where the manifest lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheBustConfig {
    /// Directories under the root whose files are versioned.
    pub asset_dirs: Vec<String>,
    /// Extensions without the dot, matched case-insensitively.
    pub extensions: Vec<String>,
    /// Hex digits of the SHA-256 kept in a versioned name.
    pub hash_len: usize,
    /// Manifest path relative to the root.
    pub manifest: String,
}

impl Default for CacheBustConfig {
    fn default() -> Self {
        Self {
            asset_dirs: ["css", "js", "assets", "images"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extensions: [
                "css", "js", "png", "jpg", "jpeg", "gif", "webp", "svg", "woff", "woff2", "ttf",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            hash_len: 8,
            manifest: DEFAULT_MANIFEST.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Root-relative path of the versioned copy.
    pub busted: String,
    pub hash: String,
    pub size: u64,
}

/// `cache-manifest.json`: original root-relative path to its versioned copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub timestamp: String,
    pub version: String,
    pub assets: BTreeMap<String, AssetEntry>,
}

impl Manifest {
    fn new(now: DateTime<Local>) -> Self {
        Self {
            timestamp: now.to_rfc3339(),
            version: now.format("%Y%m%d%H%M").to_string(),
            assets: BTreeMap::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SiteError::report(path, "read manifest", Some(e.into())))?;
        serde_json::from_str(&content)
            .map_err(|e| SiteError::report(path, "parse manifest", Some(e.into())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SiteError::report(path, "serialize manifest", Some(e.into())))?;
        fs::write(path, json).map_err(|e| SiteError::io(path, "write manifest", Some(e.into())))
    }
}

/// What a bust or revert run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheBustReport {
    pub manifest: PathBuf,
    /// Original root-relative paths of the versioned assets.
    pub assets: Vec<String>,
    pub copies_written: usize,
    pub copies_removed: usize,
    pub pages_updated: Vec<String>,
    pub references_updated: usize,
    pub errors: Vec<FileError>,
}

/// First `len` hex digits of the SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8], len: usize) -> String {
    let mut hex = format!("{:x}", Sha256::digest(bytes));
    hex.truncate(len);
    hex
}

/// `css/site.min.css` with hash `1a2b3c4d` becomes `css/site.min-1a2b3c4d.css`.
pub fn busted_name(rel_path: &str, hash: &str) -> String {
    let name_start = rel_path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match rel_path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let dot = name_start + dot;
            format!("{}-{}{}", &rel_path[..dot], hash, &rel_path[dot..])
        }
        _ => format!("{}-{}", rel_path, hash),
    }
}

fn file_name(rel_path: &str) -> &str {
    rel_path.rsplit('/').next().unwrap_or(rel_path)
}

/// Resolve a page reference to a root-relative path.
///
/// Returns the path and the byte range of its file name within `url`.
/// External, protocol-relative and `data:` URLs, and paths that climb above
/// the root, resolve to nothing.
fn resolve_reference(page_rel: &str, url: &str) -> Option<(String, Range<usize>)> {
    let path_end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..path_end];
    // a scheme ends before the first `/`
    let has_scheme = path
        .find(':')
        .map(|colon| !path[..colon].contains('/'))
        .unwrap_or(false);
    if has_scheme || path.starts_with("//") || path.is_empty() || path.ends_with('/') {
        return None;
    }

    let mut parts: Vec<&str> = Vec::new();
    if !path.starts_with('/') {
        parts.extend(page_rel.split('/'));
        parts.pop(); // the page's own file name
    }
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            _ => parts.push(segment),
        }
    }

    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    Some((parts.join("/"), name_start..path_end))
}

/// Point `src`/`href` references at new file names.
///
/// `renames` maps a root-relative path to the file name it should now use;
/// only the file-name part of each URL changes, so its directory prefix,
/// query and fragment stay as written.
fn rewrite_references(
    markup: &str,
    page_rel: &str,
    renames: &HashMap<String, String>,
) -> (String, usize) {
    let mut edits: Vec<(Range<usize>, &str)> = Vec::new();
    for tag in scan_tags(markup, &CriticalRegions::default()) {
        if tag.closing {
            continue;
        }
        for attr in URL_ATTRS {
            let Some(value) = tag.value_span(markup, attr) else {
                continue;
            };
            let Some((target, name)) = resolve_reference(page_rel, &markup[value.clone()]) else {
                continue;
            };
            let Some(new_name) = renames.get(&target) else {
                continue;
            };
            let span = value.start + name.start..value.start + name.end;
            if &markup[span.clone()] != new_name.as_str() {
                edits.push((span, new_name.as_str()));
            }
        }
    }
    edits.sort_by_key(|(span, _)| span.start);

    let mut out = String::with_capacity(markup.len());
    let mut last = 0;
    for (span, replacement) in &edits {
        out.push_str(&markup[last..span.start]);
        out.push_str(replacement);
        last = span.end;
    }
    out.push_str(&markup[last..]);
    (out, edits.len())
}

fn rewrite_pages(
    opts: &ScanOptions,
    renames: &HashMap<String, String>,
    backup: Option<&Backup>,
    report: &mut CacheBustReport,
) -> Result<()> {
    for path in discover_html(opts)? {
        let doc = match Document::load_strict(&path, &opts.root) {
            Ok(doc) => doc,
            Err(err) => {
                let file = relative_path(&path, &opts.root);
                warn!(file = %file, error = %err, "failed to load page");
                report.errors.push(FileError::new(file, &err));
                continue;
            }
        };

        let (markup, count) = rewrite_references(&doc.markup, &doc.rel_path, renames);
        if count == 0 {
            continue;
        }
        let written = backup
            .map(|b| b.save(&doc.path, &doc.rel_path).map(|_| ()))
            .unwrap_or(Ok(()))
            .and_then(|()| doc.write_back(&markup));
        if let Err(err) = written {
            warn!(file = %doc.rel_path, error = %err, "failed to update references");
            report.errors.push(FileError::new(doc.rel_path, &err));
            continue;
        }

        debug!(file = %doc.rel_path, references = count, "updated asset references");
        report.references_updated += count;
        report.pages_updated.push(doc.rel_path);
    }
    Ok(())
}

fn remove_copy(root: &Path, rel_path: &str, report: &mut CacheBustReport) {
    let path = root.join(rel_path);
    match fs::remove_file(&path) {
        Ok(()) => report.copies_removed += 1,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            let err = SiteError::io(&path, "remove versioned copy", Some(e.into()));
            warn!(file = %rel_path, error = %err, "failed to remove versioned copy");
            report.errors.push(FileError::new(rel_path.to_string(), &err));
        }
    }
}

/// Version every asset under the configured directories and point pages at
/// the versioned copies.
///
/// Originals stay in place next to their copies. A manifest from an earlier
/// run is honoured: its copies are not versioned again, references to them
/// move to the current copy, and copies whose content changed are removed.
pub fn bust_site(
    opts: &ScanOptions,
    config: &CacheBustConfig,
    backup: Option<&Backup>,
    now: DateTime<Local>,
) -> Result<CacheBustReport> {
    let root = &opts.root;
    if !root.is_dir() {
        return Err(SiteError::missing_root(root, "cache bust"));
    }
    if config.hash_len == 0 || config.hash_len > 64 {
        return Err(SiteError::config(
            root,
            "cache bust",
            Some(anyhow::anyhow!("hash_len must be between 1 and 64, got {}", config.hash_len)),
        ));
    }

    let manifest_path = root.join(&config.manifest);
    let previous = if manifest_path.is_file() {
        Some(Manifest::load(&manifest_path)?)
    } else {
        None
    };
    let earlier_copies: HashSet<&str> = previous
        .iter()
        .flat_map(|m| m.assets.values().map(|a| a.busted.as_str()))
        .collect();

    let mut report = CacheBustReport {
        manifest: manifest_path.clone(),
        ..Default::default()
    };
    let mut manifest = Manifest::new(now);

    for dir in &config.asset_dirs {
        for path in discover_assets(&root.join(dir), &config.extensions) {
            let rel = relative_path(&path, root);
            if earlier_copies.contains(rel.as_str()) {
                continue;
            }
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err = SiteError::io(&path, "read asset", Some(e.into()));
                    warn!(file = %rel, error = %err, "failed to hash asset");
                    report.errors.push(FileError::new(rel, &err));
                    continue;
                }
            };
            let hash = content_hash(&bytes, config.hash_len);
            let busted = busted_name(&rel, &hash);
            let copy = root.join(&busted);
            if !copy.is_file() {
                if let Err(e) = fs::copy(&path, &copy) {
                    let err = SiteError::io(&copy, "write versioned copy", Some(e.into()));
                    warn!(file = %rel, error = %err, "failed to version asset");
                    report.errors.push(FileError::new(rel, &err));
                    continue;
                }
                report.copies_written += 1;
            }
            manifest.assets.insert(
                rel.clone(),
                AssetEntry {
                    busted,
                    hash,
                    size: bytes.len() as u64,
                },
            );
            report.assets.push(rel);
        }
    }
    manifest.save(&manifest_path)?;
    info!(
        manifest = %manifest_path.display(),
        assets = manifest.assets.len(),
        "wrote cache manifest"
    );

    let mut renames: HashMap<String, String> = manifest
        .assets
        .iter()
        .map(|(original, entry)| (original.clone(), file_name(&entry.busted).to_string()))
        .collect();
    let mut stale = Vec::new();
    if let Some(previous) = &previous {
        for (original, old) in &previous.assets {
            let current = manifest.assets.get(original);
            let new_name = current.map(|e| file_name(&e.busted)).unwrap_or(file_name(original));
            renames.insert(old.busted.clone(), new_name.to_string());
            if current.map(|e| e.busted != old.busted).unwrap_or(true) {
                stale.push(old.busted.clone());
            }
        }
    }

    rewrite_pages(opts, &renames, backup, &mut report)?;
    for rel in &stale {
        remove_copy(root, rel, &mut report);
    }
    Ok(report)
}

/// Undo [`bust_site`]: point pages back at the original names, then remove
/// the versioned copies and the manifest.
pub fn revert_site(
    opts: &ScanOptions,
    config: &CacheBustConfig,
    backup: Option<&Backup>,
) -> Result<CacheBustReport> {
    let root = &opts.root;
    if !root.is_dir() {
        return Err(SiteError::missing_root(root, "cache bust revert"));
    }
    let manifest_path = root.join(&config.manifest);
    let manifest = Manifest::load(&manifest_path)?;

    let renames: HashMap<String, String> = manifest
        .assets
        .iter()
        .map(|(original, entry)| (entry.busted.clone(), file_name(original).to_string()))
        .collect();

    let mut report = CacheBustReport {
        manifest: manifest_path.clone(),
        assets: manifest.assets.keys().cloned().collect(),
        ..Default::default()
    };
    rewrite_pages(opts, &renames, backup, &mut report)?;

    for entry in manifest.assets.values() {
        remove_copy(root, &entry.busted, &mut report);
    }
    fs::remove_file(&manifest_path)
        .map_err(|e| SiteError::io(&manifest_path, "remove manifest", Some(e.into())))?;
    info!(pages = report.pages_updated.len(), "reverted cache busting");
    Ok(report)
}
