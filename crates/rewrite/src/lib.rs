// ABOUTME: Mutating transforms for static sites: attribute injection, cleanup, minify, charset fix, pruning, cache busting.
// ABOUTME: Re-exports each pass and the batch optimizer that chains them over a site.

//! sitekit-rewrite - passes that change pages.
//!
//! Every pass is a function from markup to markup plus counts, and leaves
//! bytes it does not mean to change exactly as they were. The contents of
//! `<script>`, `<style>`, `<textarea>` and `<pre>` are never rewritten by
//! the text passes.
//!
//! # Example
//!
//! ```
//! use sitekit_rewrite::{InjectRules, Injector};
//!
//! let injector = Injector::new(InjectRules::default()).unwrap();
//! let (markup, stats) = injector.apply(r#"<img src="gallery.jpg">"#);
//! assert_eq!(markup, r#"<img src="gallery.jpg" loading="lazy">"#);
//! assert_eq!(stats.images_lazy, 1);
//! ```

pub mod cache_bust;
pub mod charset_fix;
pub mod cleanup;
pub mod inject;
pub mod minify;
pub mod optimizer;
pub mod protect;
pub mod prune;
pub mod tags;

pub use crate::cache_bust::{
    bust_site, revert_site, AssetEntry, CacheBustConfig, CacheBustReport, Manifest,
};
pub use crate::charset_fix::{fix_charset, fix_site, CharsetFix, CharsetFixReport};
pub use crate::cleanup::{cleanup, CleanupStats};
pub use crate::inject::{InjectRules, InjectStats, Injector};
pub use crate::minify::{minify_css, minify_file, minify_html, MinifyStats};
pub use crate::optimizer::{render_markdown, FileReport, OptimizeConfig, OptimizeReport, Optimizer};
pub use crate::prune::{PruneRules, PruneStats, Pruner};
pub use crate::tags::{scan_tags, CriticalRegions, Tag};
