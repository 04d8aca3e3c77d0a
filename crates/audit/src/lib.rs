// ABOUTME: Read-only analyzers for static sites: keyword alignment, fix plans, charset, meta widths, density.
// ABOUTME: Re-exports the checker, the site-wide report, and each analyzer's entry points.

//! sitekit-audit - inspects pages without changing them.
//!
//! The centerpiece is the title/content keyword alignment checker: every
//! meaningful word in a page's `<title>` should also appear in its body,
//! ignoring navigation and other boilerplate.
//!
//! # Example
//!
//! ```no_run
//! use sitekit_audit::{analyze_site, Checker};
//! use sitekit_core::ScanOptions;
//!
//! fn main() -> Result<(), sitekit_core::SiteError> {
//!     let report = analyze_site(&ScanOptions::builder("public_html").build(), &Checker::default())?;
//!     println!("{} ({} pages)", report.summary.compliance_rate, report.total_pages);
//!     Ok(())
//! }
//! ```

pub mod alignment;
pub mod body;
pub mod charset;
pub mod density;
pub mod fixes;
pub mod keywords;
pub mod meta;
pub mod report;
pub mod suggest;

pub use crate::alignment::{
    find_variation, AlignmentConfig, Checker, KeywordMatch, MatchMode, PageAlignment, PageOutcome,
    Variation,
};
pub use crate::body::{Boilerplate, DEFAULT_BOILERPLATE_SELECTORS};
pub use crate::charset::{charset_status, scan_site, CharsetReport, CharsetScan, CharsetStatus};
pub use crate::density::{analyze_document, DensityReport, KeywordDensity};
pub use crate::fixes::{default_templates, plan_fixes, AdditionKind, FixPlan, PageTemplate};
pub use crate::keywords::{extract_keywords, normalize_token, Keyword, StopWords};
pub use crate::meta::{
    check_document, estimate, MetaCheck, MetaConfig, MetaEstimate, MetaKind, MetaLimits, Verdict,
};
pub use crate::report::{
    analyze_site, AlignmentReport, PageIssue, SkipReason, DEFAULT_REPORT_PATH,
};
pub use crate::suggest::{SuggestionRules, TermRule};
