// ABOUTME: Shared building blocks for the sitekit static-site maintenance tools.
// ABOUTME: Re-exports discovery, document loading, backups, markup locators, text helpers, and errors.

//! sitekit-core - the plumbing every sitekit pass shares.
//!
//! A pass discovers HTML files under a root, loads each one as a transient
//! [`Document`], inspects or rewrites it, and moves on. Failures are scoped to
//! the file that caused them; only a missing root aborts a batch.
//!
//! # Example
//!
//! ```no_run
//! use sitekit_core::{discover_html, Document, ScanOptions};
//!
//! fn main() -> Result<(), sitekit_core::SiteError> {
//!     let opts = ScanOptions::builder("public_html").priority("index.html").build();
//!     for path in discover_html(&opts)? {
//!         let doc = Document::load(&path, &opts.root)?;
//!         println!("{}: {:?}", doc.rel_path, doc.title());
//!     }
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod discover;
pub mod document;
pub mod error;
pub mod markup;
pub mod text;

pub use crate::backup::Backup;
pub use crate::discover::{
    discover_assets, discover_html, relative_path, ScanOptions, ScanOptionsBuilder,
};
pub use crate::document::{decode_lenient, title_of, Document};
pub use crate::error::{ErrorCode, FileError, Result, SiteError};
pub use crate::text::{collapse_whitespace, element_text, truncate_chars};
