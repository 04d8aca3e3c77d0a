// ABOUTME: Console renderings of each tool's results for the sitekit CLI.
// ABOUTME: Pure functions from report types to text so output can be tested without a terminal.

use sitekit_audit::report::BEST_PRACTICES;
use sitekit_audit::{
    AlignmentReport, CharsetReport, DensityReport, FixPlan, MetaCheck, MetaEstimate, SkipReason,
    Verdict,
};
use sitekit_core::FileError;
use sitekit_rewrite::{CacheBustReport, CharsetFixReport, MinifyStats, OptimizeReport};

const RULE: &str = "--------------------------------------------------------------------------------";
const MISSING_WORDS_SHOWN: usize = 10;

fn errors_section(lines: &mut Vec<String>, errors: &[FileError]) {
    if errors.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("ERRORS ({})", errors.len()));
    for err in errors {
        lines.push(format!("  {}: {}", err.file, err.error));
    }
}

pub fn alignment(report: &AlignmentReport) -> String {
    let mut lines = vec![
        "TITLE-CONTENT ALIGNMENT REPORT".to_string(),
        RULE.to_string(),
        format!("Total pages analyzed: {}", report.summary.total_analyzed),
        format!(
            "Pages with missing title words: {}",
            report.summary.pages_with_issues
        ),
        format!("Compliance rate: {}", report.summary.compliance_rate),
    ];

    if !report.pages_with_issues.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "PAGES REQUIRING ATTENTION ({} pages)",
            report.pages_with_issues.len()
        ));
        for (severity, pages) in report.by_severity() {
            lines.push(String::new());
            lines.push(format!("{} missing word(s):", severity));
            for page in pages {
                lines.push(format!("  {}", page.file));
                lines.push(format!("    Title: \"{}\"", page.title));
                lines.push(format!("    Missing: {}", page.missing_words.join(", ")));
                for suggestion in &page.suggestions {
                    lines.push(format!("    -> {}", suggestion));
                }
            }
        }

        lines.push(String::new());
        lines.push("Most commonly missing words:".to_string());
        for (word, count) in report.most_missing(MISSING_WORDS_SHOWN) {
            lines.push(format!("  '{}' - missing on {} page(s)", word, count));
        }
    }

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push(format!("SKIPPED ({})", report.skipped.len()));
        for page in &report.skipped {
            let why = match page.reason {
                SkipReason::NoTitle => "no title tag found",
                SkipReason::NoKeywords => "no meaningful words in title",
            };
            lines.push(format!("  {}: {}", page.file, why));
        }
    }

    lines.push(String::new());
    lines.push("RECOMMENDATIONS".to_string());
    for rec in &report.recommendations {
        lines.push(format!("  {}", rec));
    }
    for (i, practice) in BEST_PRACTICES.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, practice));
    }

    errors_section(&mut lines, &report.errors);
    lines.join("\n")
}

pub fn fix_plans(plans: &[FixPlan]) -> String {
    let mut lines = vec![
        "CONTENT FIXES FOR MISSING TITLE WORDS".to_string(),
        RULE.to_string(),
    ];
    if plans.is_empty() {
        lines.push("No pages need content fixes.".to_string());
    }
    for plan in plans {
        lines.push(String::new());
        lines.push(plan.file.clone());
        lines.push(format!("  Missing words: {}", plan.missing_words.join(", ")));
        if plan.additions.is_empty() {
            lines.push("  No template for this page; see the report's suggestions.".to_string());
        }
        for addition in &plan.additions {
            lines.push(format!("  -> {}:", addition.kind.label()));
            lines.push(format!("     \"{}\"", addition.text));
        }
        if let Some(h1) = &plan.current_h1 {
            lines.push(format!("  Current H1: \"{}\"", h1));
        }
        if let Some(opening) = &plan.opening_excerpt {
            lines.push(format!("  First paragraph starts with: \"{}...\"", opening));
        }
    }
    lines.join("\n")
}

pub fn charset_scan(report: &CharsetReport) -> String {
    let mut lines = vec!["CHARSET PLACEMENT".to_string(), RULE.to_string()];
    for scan in &report.scans {
        let mark = if scan.status.is_correct() { "ok  " } else { "FIX " };
        lines.push(format!("{} {}: {}", mark, scan.file, scan.status.message()));
        if scan.declares_other_charset() {
            lines.push(format!(
                "     declares charset {}",
                scan.declared.as_deref().unwrap_or_default()
            ));
        }
        if !scan.has_doctype {
            lines.push("     missing <!DOCTYPE html>".to_string());
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "{} correct, {} need fixes",
        report.correct().count(),
        report.needing_fixes().count()
    ));
    errors_section(&mut lines, &report.errors);
    lines.join("\n")
}

pub fn charset_fix(report: &CharsetFixReport) -> String {
    let mut lines = vec!["CHARSET FIX".to_string(), RULE.to_string()];
    let groups = [
        ("Fixed", &report.fixed),
        ("Inserted", &report.inserted),
        ("Already correct", &report.already_correct),
        ("Skipped (no charset)", &report.skipped),
        ("No <head>", &report.no_head),
    ];
    for (label, files) in groups {
        lines.push(format!("{}: {}", label, files.len()));
        for file in files {
            lines.push(format!("  {}", file));
        }
    }
    errors_section(&mut lines, &report.errors);
    lines.join("\n")
}

fn estimate_line(estimate: &MetaEstimate) -> String {
    let verdict = match estimate.verdict {
        Verdict::Optimal => "optimal".to_string(),
        Verdict::Borderline => "borderline".to_string(),
        Verdict::TooLong { over_px } => format!("too long by {}px", over_px),
    };
    format!(
        "  {}: {} chars, ~{}px ({})",
        estimate.kind.name(),
        estimate.chars,
        estimate.pixels,
        verdict
    )
}

pub fn meta(check: &MetaCheck) -> String {
    let mut lines = vec![check.file.clone()];
    match &check.title {
        Some(title) => {
            lines.push(estimate_line(title));
            lines.push(format!("    \"{}\"", title.text));
        }
        None => lines.push("  title: missing".to_string()),
    }
    match &check.description {
        Some(description) => {
            lines.push(estimate_line(description));
            lines.push(format!("    \"{}\"", description.text));
        }
        None => lines.push("  description: missing".to_string()),
    }
    for phrase in check.title_phrases.iter().chain(&check.description_phrases) {
        let mark = if phrase.present { "found" } else { "MISSING" };
        lines.push(format!("  {}: '{}'", mark, phrase.phrase));
    }
    lines.push(format!(
        "  {}",
        if check.passes() { "PASS" } else { "NEEDS WORK" }
    ));
    lines.join("\n")
}

pub fn density(report: &DensityReport) -> String {
    let mut lines = vec![
        format!("KEYWORD DENSITY: {}", report.file),
        RULE.to_string(),
        format!("Total words: {}", report.total_words),
    ];
    for kw in &report.keywords {
        lines.push(format!(
            "  {:<30} {:>4} occurrences  {:>6.2}%",
            format!("'{}'", kw.phrase),
            kw.count,
            kw.density
        ));
    }
    lines.join("\n")
}

pub fn optimize(report: &OptimizeReport) -> String {
    let mut lines = vec!["OPTIMIZATION SUMMARY".to_string(), RULE.to_string()];
    if report.dry_run {
        lines.push("Dry run: no files were written.".to_string());
    }
    lines.push(format!("Files processed: {}", report.files.len()));
    lines.push(format!("Files modified: {}", report.modified().count()));
    lines.push(format!("Images lazy-loaded: {}", report.images_lazy()));
    lines.push(format!("Scripts deferred: {}", report.scripts_deferred()));
    lines.push(format!("Stylesheets deferred: {}", report.stylesheets_deferred()));
    lines.push(format!("Resources pruned: {}", report.resources_pruned()));
    lines.push(format!(
        "Size savings: {:.2} KB",
        report.saved_bytes() as f64 / 1024.0
    ));
    if let Some(dir) = &report.backup_dir {
        lines.push(format!("Backups: {}", dir.display()));
    }
    errors_section(&mut lines, &report.errors);
    lines.join("\n")
}

pub fn cache_bust(report: &CacheBustReport, reverted: bool) -> String {
    let title = if reverted {
        "CACHE BUSTING REVERTED"
    } else {
        "CACHE BUSTING SUMMARY"
    };
    let mut lines = vec![title.to_string(), RULE.to_string()];
    lines.push(format!("Assets: {}", report.assets.len()));
    if !reverted {
        lines.push(format!("Versioned copies written: {}", report.copies_written));
    }
    lines.push(format!("Versioned copies removed: {}", report.copies_removed));
    lines.push(format!(
        "Pages updated: {} ({} references)",
        report.pages_updated.len(),
        report.references_updated
    ));
    let verb = if reverted { "Removed" } else { "Manifest" };
    lines.push(format!("{}: {}", verb, report.manifest.display()));
    errors_section(&mut lines, &report.errors);
    lines.join("\n")
}

pub fn minify(stats: &MinifyStats, output: &str) -> String {
    [
        format!("Original size: {} bytes", stats.original_bytes),
        format!("Minified size: {} bytes", stats.minified_bytes),
        format!(
            "Size reduction: {} bytes ({:.1}%)",
            stats.saved_bytes(),
            stats.reduction_percent()
        ),
        format!("Saved to: {}", output),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sitekit_audit::{estimate, MetaKind};

    #[test]
    fn test_alignment_for_empty_site() {
        let out = alignment(&AlignmentReport::new(0, vec![], vec![], vec![]));
        assert!(out.contains("Total pages analyzed: 0\n"));
        assert!(out.contains("Compliance rate: 0%\n"));
        assert!(!out.contains("PAGES REQUIRING ATTENTION"));
        assert!(out.ends_with("5. Add keywords to the page URL structure when possible"));
    }

    #[test]
    fn test_estimate_line() {
        let title = "x".repeat(61);
        assert_eq!(
            estimate_line(&estimate(&title, MetaKind::Title)),
            "  title: 61 chars, ~610px (too long by 30px)"
        );
    }

    #[test]
    fn test_minify_summary() {
        let stats = MinifyStats::new("abcdefghij", "abcde");
        assert_eq!(
            minify(&stats, "a.min.html"),
            "Original size: 10 bytes\nMinified size: 5 bytes\nSize reduction: 5 bytes (50.0%)\nSaved to: a.min.html"
        );
    }

    #[test]
    fn test_cache_bust_summary() {
        let report = CacheBustReport {
            manifest: "site/cache-manifest.json".into(),
            assets: vec!["css/site.css".into(), "js/app.js".into()],
            copies_written: 2,
            pages_updated: vec!["index.html".into()],
            references_updated: 2,
            ..Default::default()
        };
        assert_eq!(
            cache_bust(&report, false),
            format!(
                "CACHE BUSTING SUMMARY\n{}\nAssets: 2\nVersioned copies written: 2\nVersioned copies removed: 0\nPages updated: 1 (2 references)\nManifest: site/cache-manifest.json",
                RULE
            )
        );
        assert!(cache_bust(&report, true).starts_with("CACHE BUSTING REVERTED"));
        assert!(!cache_bust(&report, true).contains("copies written"));
    }
}
