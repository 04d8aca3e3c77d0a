// ABOUTME: Batch optimizer that runs prune, inject, cleanup and minify over every page under a root.
// ABOUTME: Backs pages up before writing, records per-file counts and errors, and renders a Markdown report.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sitekit_core::{
    discover_html, relative_path, Backup, Document, FileError, Result, ScanOptions,
};

use crate::cleanup::cleanup;
use crate::inject::{InjectRules, Injector};
use crate::minify::minify_html;
use crate::prune::{PruneRules, Pruner};

/// Files listed by name in the Markdown report before the rest are summarized.
const LISTED_FILES: usize = 20;

/// Which passes run and where backups go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    pub inject: bool,
    pub cleanup: bool,
    pub minify: bool,
    pub backup: bool,
    pub backup_dir: PathBuf,
    pub dry_run: bool,
    pub prune: PruneRules,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            inject: true,
            cleanup: true,
            minify: false,
            backup: true,
            backup_dir: PathBuf::from("backups"),
            dry_run: false,
            prune: PruneRules::default(),
        }
    }
}

/// What the passes did to one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub images_lazy: usize,
    pub scripts_deferred: usize,
    pub stylesheets_deferred: usize,
    pub empty_blocks_removed: usize,
    pub comments_removed: usize,
    pub resources_pruned: usize,
    pub loader_inserted: bool,
    pub original_bytes: usize,
    pub final_bytes: usize,
    pub modified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

impl FileReport {
    pub fn saved_bytes(&self) -> usize {
        self.original_bytes.saturating_sub(self.final_bytes)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OptimizeReport {
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
    pub files: Vec<FileReport>,
    pub errors: Vec<FileError>,
}

impl OptimizeReport {
    pub fn modified(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.modified)
    }

    pub fn images_lazy(&self) -> usize {
        self.files.iter().map(|f| f.images_lazy).sum()
    }

    pub fn scripts_deferred(&self) -> usize {
        self.files.iter().map(|f| f.scripts_deferred).sum()
    }

    pub fn stylesheets_deferred(&self) -> usize {
        self.files.iter().map(|f| f.stylesheets_deferred).sum()
    }

    pub fn resources_pruned(&self) -> usize {
        self.files.iter().map(|f| f.resources_pruned).sum()
    }

    pub fn saved_bytes(&self) -> usize {
        self.modified().map(FileReport::saved_bytes).sum()
    }
}

/// Compiled passes, ready to run over pages.
#[derive(Debug, Clone)]
pub struct Optimizer {
    config: OptimizeConfig,
    injector: Injector,
    pruner: Pruner,
}

impl Optimizer {
    pub fn new(config: OptimizeConfig, rules: InjectRules) -> Result<Self> {
        Ok(Self {
            injector: Injector::new(rules)?,
            pruner: Pruner::new(config.prune.clone())?,
            config,
        })
    }

    /// Run the configured passes over one page without touching disk.
    pub fn optimize(&self, markup: &str, rel_path: &str) -> (String, FileReport) {
        let mut report = FileReport {
            file: rel_path.to_string(),
            original_bytes: markup.len(),
            ..Default::default()
        };
        let mut out = markup.to_string();

        // prune before inject: the counts cover only tags left on the page
        if !self.config.prune.is_empty() {
            let (next, stats) = self.pruner.apply(&out, rel_path);
            report.resources_pruned = stats.resources_removed;
            report.loader_inserted = stats.loader_inserted;
            out = next;
        }
        if self.config.inject {
            let (next, stats) = self.injector.apply(&out);
            report.images_lazy = stats.images_lazy;
            report.scripts_deferred = stats.scripts_deferred;
            report.stylesheets_deferred = stats.stylesheets_deferred;
            out = next;
        }
        if self.config.cleanup {
            let (next, stats) = cleanup(&out);
            report.empty_blocks_removed = stats.empty_blocks_removed;
            report.comments_removed = stats.comments_removed;
            out = next;
        }
        if self.config.minify {
            out = minify_html(&out);
        }

        report.final_bytes = out.len();
        report.modified = out != markup;
        (out, report)
    }

    /// Optimize every page under the root. Pages are written only when a
    /// pass changed them; failures are recorded and the batch moves on.
    pub fn run(&self, opts: &ScanOptions, started: DateTime<Local>) -> Result<OptimizeReport> {
        let files = discover_html(opts)?;
        let backup = (self.config.backup && !self.config.dry_run)
            .then(|| Backup::new(&self.config.backup_dir, started));

        let mut report = OptimizeReport {
            dry_run: self.config.dry_run,
            backup_dir: backup.as_ref().map(|b| b.dir().to_path_buf()),
            ..Default::default()
        };

        for path in files {
            let doc = match Document::load_strict(&path, &opts.root) {
                Ok(doc) => doc,
                Err(err) => {
                    let file = relative_path(&path, &opts.root);
                    warn!(file = %file, error = %err, "failed to load page");
                    report.errors.push(FileError::new(file, &err));
                    continue;
                }
            };

            let (markup, mut file_report) = self.optimize(&doc.markup, &doc.rel_path);
            if !file_report.modified || self.config.dry_run {
                debug!(file = %doc.rel_path, modified = file_report.modified, "optimized page");
                report.files.push(file_report);
                continue;
            }

            if let Some(backup) = &backup {
                match backup.save(&doc.path, &doc.rel_path) {
                    Ok(saved) => file_report.backup = Some(saved),
                    Err(err) => {
                        warn!(file = %doc.rel_path, error = %err, "backup failed; page left as is");
                        report.errors.push(FileError::new(doc.rel_path, &err));
                        continue;
                    }
                }
            }

            if let Err(err) = doc.write_back(&markup) {
                warn!(file = %doc.rel_path, error = %err, "failed to write page");
                report.errors.push(FileError::new(doc.rel_path, &err));
                continue;
            }

            info!(
                file = %doc.rel_path,
                images = file_report.images_lazy,
                scripts = file_report.scripts_deferred,
                stylesheets = file_report.stylesheets_deferred,
                "optimized page"
            );
            report.files.push(file_report);
        }

        Ok(report)
    }
}

fn per_file_section(lines: &mut Vec<String>, report: &OptimizeReport, count: fn(&FileReport) -> usize) {
    let mut any = false;
    for file in report.files.iter().filter(|f| count(f) > 0) {
        lines.push(format!("- {}: {}", file.file, count(file)));
        any = true;
    }
    if !any {
        lines.push("- None".to_string());
    }
}

/// Render the optimization report as Markdown.
pub fn render_markdown(report: &OptimizeReport, generated_at: DateTime<Local>) -> String {
    let modified: Vec<&FileReport> = report.modified().collect();
    let mut lines = vec![
        "# Performance Optimization Report".to_string(),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        String::new(),
    ];
    if report.dry_run {
        lines.push("_Dry run: no files were written._".to_string());
        lines.push(String::new());
    }

    lines.push("## Executive Summary".to_string());
    lines.push(format!("- Files Modified: {}", modified.len()));
    lines.push(format!(
        "- Total Size Savings: {:.2} KB",
        report.saved_bytes() as f64 / 1024.0
    ));
    lines.push(format!("- Images with Lazy Loading: {}", report.images_lazy()));
    lines.push(format!("- Scripts Deferred: {}", report.scripts_deferred()));
    lines.push(format!("- Stylesheets Deferred: {}", report.stylesheets_deferred()));
    if report.resources_pruned() > 0 {
        lines.push(format!("- Resources Pruned: {}", report.resources_pruned()));
    }
    lines.push(String::new());

    lines.push("## JavaScript Optimizations".to_string());
    lines.push("### Scripts Deferred".to_string());
    per_file_section(&mut lines, report, |f| f.scripts_deferred);
    if report.resources_pruned() > 0 {
        lines.push("### Resources Moved to Loader".to_string());
        per_file_section(&mut lines, report, |f| f.resources_pruned);
    }
    lines.push(String::new());

    lines.push("## CSS Optimizations".to_string());
    lines.push("### Stylesheets Deferred".to_string());
    per_file_section(&mut lines, report, |f| f.stylesheets_deferred);
    lines.push(String::new());

    lines.push("## Image Optimizations".to_string());
    lines.push("### Lazy Loading Applied".to_string());
    per_file_section(&mut lines, report, |f| f.images_lazy);
    lines.push(String::new());

    lines.push("## Files Modified".to_string());
    for file in modified.iter().take(LISTED_FILES) {
        lines.push(format!("- {}", file.file));
    }
    if modified.len() > LISTED_FILES {
        lines.push(format!("... and {} more", modified.len() - LISTED_FILES));
    }

    if !report.errors.is_empty() {
        lines.push(String::new());
        lines.push("## Errors".to_string());
        for err in &report.errors {
            lines.push(format!("- {}: {}", err.file, err.error));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}
