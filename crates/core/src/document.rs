// ABOUTME: Transient HTML document loaded from disk, with decoding and write-back.
// ABOUTME: Lenient loads guess the charset via chardetng; strict loads require UTF-8.

use std::fs;
use std::path::{Path, PathBuf};

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

use crate::discover::relative_path;
use crate::error::{Result, SiteError};
use crate::text::collapse_whitespace;

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static META_NAMED_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("meta[name]").unwrap());

/// An HTML file read into memory for a single pass.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub rel_path: String,
    pub markup: String,
}

impl Document {
    /// Build a document from markup already in memory.
    pub fn from_markup(rel_path: impl Into<String>, markup: impl Into<String>) -> Self {
        let rel_path = rel_path.into();
        Self {
            path: PathBuf::from(&rel_path),
            rel_path,
            markup: markup.into(),
        }
    }

    /// Read `path`, decoding non-UTF-8 bytes with a detected encoding.
    pub fn load(path: &Path, root: &Path) -> Result<Self> {
        let bytes = read_bytes(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            rel_path: relative_path(path, root),
            markup: decode_lenient(&bytes),
        })
    }

    /// Read `path`, failing with a Decode error unless it is valid UTF-8.
    ///
    /// Rewriters use this so a file is never silently re-encoded on write.
    pub fn load_strict(path: &Path, root: &Path) -> Result<Self> {
        let bytes = read_bytes(path)?;
        let markup = String::from_utf8(bytes)
            .map_err(|e| SiteError::decode(path, "read", Some(e.into())))?;
        Ok(Self {
            path: path.to_path_buf(),
            rel_path: relative_path(path, root),
            markup,
        })
    }

    /// Parse the markup into a scraper tree.
    pub fn parse(&self) -> Html {
        Html::parse_document(&self.markup)
    }

    /// Trimmed text of the first `<title>`, if there is one.
    pub fn title(&self) -> Option<String> {
        title_of(&self.parse())
    }

    /// Content of `<meta name="description">`, whitespace-collapsed.
    pub fn meta_description(&self) -> Option<String> {
        let html = self.parse();
        html.select(&META_NAMED_SEL)
            .find(|el| {
                el.value()
                    .attr("name")
                    .map(|n| n.eq_ignore_ascii_case("description"))
                    .unwrap_or(false)
            })
            .and_then(|el| el.value().attr("content"))
            .map(collapse_whitespace)
    }

    /// Write `markup` back to this document's path.
    pub fn write_back(&self, markup: &str) -> Result<()> {
        fs::write(&self.path, markup)
            .map_err(|e| SiteError::io(&self.path, "write", Some(e.into())))
    }
}

/// Trimmed text of the first `<title>` in a parsed tree.
pub fn title_of(html: &Html) -> Option<String> {
    html.select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| SiteError::io(path, "read", Some(e.into())))
}

/// Decode bytes as UTF-8 when valid, otherwise with a chardetng guess.
pub fn decode_lenient(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding: &'static Encoding = detector.guess(None, true);
    debug!(encoding = encoding.name(), "decoding non-UTF-8 bytes");
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_title_and_description() {
        let doc = Document::from_markup(
            "index.html",
            r#"<html><head><title>  Roof Repair | Acme </title>
            <meta name="Description" content="Fast   roof repair."></head><body></body></html>"#,
        );
        assert_eq!(doc.title().as_deref(), Some("Roof Repair | Acme"));
        assert_eq!(doc.meta_description().as_deref(), Some("Fast roof repair."));
    }

    #[test]
    fn test_missing_title() {
        let doc = Document::from_markup("a.html", "<html><body><p>x</p></body></html>");
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_decode_lenient_latin1() {
        let bytes: &[u8] = &[0x63, 0x61, 0x66, 0xe9];
        assert_eq!(decode_lenient(bytes), "café");
    }

    #[test]
    fn test_load_strict_rejects_non_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin.html");
        fs::write(&path, [0x63, 0x61, 0x66, 0xe9]).unwrap();

        let err = Document::load_strict(&path, dir.path()).unwrap_err();
        assert!(err.is_decode());

        let doc = Document::load(&path, dir.path()).unwrap();
        assert_eq!(doc.rel_path, "latin.html");
        assert_eq!(doc.markup, "café");
    }

    #[test]
    fn test_write_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<p>old</p>").unwrap();

        let doc = Document::load_strict(&path, dir.path()).unwrap();
        doc.write_back("<p>new</p>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>new</p>");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Document::load(&dir.path().join("nope.html"), dir.path()).unwrap_err();
        assert!(err.is_io());
    }
}
