// ABOUTME: sitekit CLI: static-site maintenance commands over the audit and rewrite libraries.
// ABOUTME: Loads TOML config, installs tracing to stderr, runs one subcommand and prints its report.

mod config;
mod render;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sitekit_audit::report::DEFAULT_REPORT_PATH;
use sitekit_audit::{
    analyze_document, analyze_site, check_document, plan_fixes, scan_site, AlignmentReport,
    Checker, MatchMode,
};
use sitekit_core::{Backup, Document};
use sitekit_rewrite::{bust_site, fix_site, minify_file, render_markdown, revert_site, Optimizer};

use crate::config::SiteConfig;

/// Maintenance tools for a static HTML site.
#[derive(Parser, Debug)]
#[command(name = "sitekit")]
#[command(about = "Audit and optimize the HTML pages of a static site", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults to ./sitekit.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that every title keyword appears in the page body.
    Keywords {
        root: PathBuf,
        /// Where to write the JSON report.
        #[arg(long, default_value = DEFAULT_REPORT_PATH)]
        json: PathBuf,
        /// Match whole words instead of substrings.
        #[arg(long, default_value_t = false)]
        word_boundary: bool,
    },
    /// Suggest content additions from a saved keyword report.
    Fixes {
        #[arg(long, default_value = DEFAULT_REPORT_PATH)]
        report: PathBuf,
        /// Site root, to show each page's current H1 and opening paragraph.
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Scan (or fix) the placement of <meta charset="UTF-8">.
    Charset {
        root: PathBuf,
        #[arg(long, default_value_t = false)]
        fix: bool,
        /// With --fix, add a declaration to pages that have none.
        #[arg(long, default_value_t = false)]
        insert_missing: bool,
    },
    /// Estimate title and description widths in search results.
    Meta {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Measure how often phrases occur in a page's visible text.
    Density {
        file: PathBuf,
        #[arg(long = "keyword", required = true)]
        keywords: Vec<String>,
    },
    /// Inject lazy-loading and deferral attributes and clean up pages in place.
    Optimize {
        root: PathBuf,
        #[arg(long, default_value_t = false)]
        no_backup: bool,
        #[arg(long, default_value_t = false)]
        minify: bool,
        /// Write a Markdown report here.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Report what would change without writing anything.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Give assets content-hashed names and point pages at them.
    CacheBust {
        root: PathBuf,
        /// Restore the original names and remove the versioned copies.
        #[arg(long, default_value_t = false)]
        revert: bool,
        #[arg(long, default_value_t = false)]
        no_backup: bool,
    },
    /// Minify one HTML file.
    Minify {
        file: PathBuf,
        /// Defaults to <name>.min.html next to the input.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sitekit=debug" } else { "sitekit=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = SiteConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Keywords {
            root,
            json,
            word_boundary,
        } => run_keywords(&config, root, &json, word_boundary),
        Command::Fixes { report, root } => run_fixes(&config, &report, root.as_deref()),
        Command::Charset {
            root,
            fix,
            insert_missing,
        } => run_charset(&config, root, fix, insert_missing),
        Command::Meta { files } => run_meta(&config, &files),
        Command::Density { file, keywords } => run_density(&file, &keywords),
        Command::Optimize {
            root,
            no_backup,
            minify,
            report,
            dry_run,
        } => run_optimize(&config, root, no_backup, minify, report.as_deref(), dry_run),
        Command::CacheBust {
            root,
            revert,
            no_backup,
        } => run_cache_bust(&config, root, revert, no_backup),
        Command::Minify { file, output } => run_minify(&file, output),
    }
}

fn run_keywords(config: &SiteConfig, root: PathBuf, json: &Path, word_boundary: bool) -> Result<()> {
    let mut checker = Checker::new(&config.keywords);
    if word_boundary {
        checker = checker.with_match_mode(MatchMode::WordBoundary);
    }
    let report = analyze_site(&config.scan_options(root), &checker)?;
    println!("{}", render::alignment(&report));

    report.save(json)?;
    println!("\nDetailed results saved to: {}", json.display());
    Ok(())
}

fn run_fixes(config: &SiteConfig, report_path: &Path, root: Option<&Path>) -> Result<()> {
    let report = AlignmentReport::load(report_path)
        .with_context(|| "run `sitekit keywords <root>` first to generate the report")?;
    let plans = plan_fixes(&report, &config.fixes.templates, root);
    println!("{}", render::fix_plans(&plans));
    Ok(())
}

fn run_charset(config: &SiteConfig, root: PathBuf, fix: bool, insert_missing: bool) -> Result<()> {
    let opts = config.scan_options(root);
    if !fix {
        let report = scan_site(&opts)?;
        println!("{}", render::charset_scan(&report));
        return Ok(());
    }

    let backup = config
        .optimize
        .backup
        .then(|| Backup::new(&config.optimize.backup_dir, Local::now()));
    let report = fix_site(&opts, insert_missing, backup.as_ref())?;
    println!("{}", render::charset_fix(&report));
    if let Some(backup) = backup.filter(|_| report.changed() > 0) {
        info!(dir = %backup.dir().display(), "originals backed up");
    }
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

fn run_meta(config: &SiteConfig, files: &[PathBuf]) -> Result<()> {
    let mut checks = Vec::new();
    for path in files {
        match Document::load(path, parent_dir(path)) {
            Ok(doc) => checks.push(check_document(&doc, &config.meta)),
            Err(err) => warn!(file = %path.display(), error = %err, "skipping page"),
        }
    }
    let passing = checks.iter().filter(|c| c.passes()).count();
    for check in &checks {
        println!("{}\n", render::meta(check));
    }
    println!("{}/{} pages within limits", passing, checks.len());
    Ok(())
}

fn run_density(file: &Path, keywords: &[String]) -> Result<()> {
    let doc = Document::load(file, parent_dir(file))?;
    println!("{}", render::density(&analyze_document(&doc, keywords)));
    Ok(())
}

fn run_optimize(
    config: &SiteConfig,
    root: PathBuf,
    no_backup: bool,
    minify: bool,
    report_path: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let mut optimize = config.optimize.clone();
    optimize.backup &= !no_backup;
    optimize.minify |= minify;
    optimize.dry_run |= dry_run;

    let optimizer = Optimizer::new(optimize, config.inject.clone())?;
    let started = Local::now();
    let report = optimizer.run(&config.scan_options(root), started)?;
    println!("{}", render::optimize(&report));

    if let Some(path) = report_path {
        fs::write(path, render_markdown(&report, started))
            .with_context(|| format!("writing report to {}", path.display()))?;
        println!("\nReport saved to: {}", path.display());
    }
    Ok(())
}

fn run_cache_bust(config: &SiteConfig, root: PathBuf, revert: bool, no_backup: bool) -> Result<()> {
    let opts = config.scan_options(root);
    let backup = (config.optimize.backup && !no_backup)
        .then(|| Backup::new(&config.optimize.backup_dir, Local::now()));
    let report = if revert {
        revert_site(&opts, &config.cache_bust, backup.as_ref())?
    } else {
        bust_site(&opts, &config.cache_bust, backup.as_ref(), Local::now())?
    };
    println!("{}", render::cache_bust(&report, revert));
    if let Some(backup) = backup.filter(|_| !report.pages_updated.is_empty()) {
        info!(dir = %backup.dir().display(), "originals backed up");
    }
    Ok(())
}

fn default_minify_output(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    file.with_file_name(format!("{}.min.html", stem))
}

fn run_minify(file: &Path, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| default_minify_output(file));
    let stats = minify_file(file, &output)?;
    println!("{}", render::minify(&stats, &output.display().to_string()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_minify_output() {
        assert_eq!(
            default_minify_output(Path::new("site/metal-roofing.html")),
            PathBuf::from("site/metal-roofing.min.html")
        );
    }
}
