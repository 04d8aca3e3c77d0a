// ABOUTME: Boilerplate-aware body text extraction for keyword matching.
// ABOUTME: Skips nav/header/footer/cookie regions and non-visible elements before joining text nodes.

use std::collections::HashSet;

use ego_tree::{NodeId, NodeRef};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;

use sitekit_core::{collapse_whitespace, element_text};

/// Regions excluded from the body before keyword matching.
pub const DEFAULT_BOILERPLATE_SELECTORS: &[&str] = &[
    "nav",
    "header",
    "footer",
    ".navbar",
    ".navigation",
    ".menu",
    ".footer",
    ".header",
    "#navigation",
    "#footer",
    "#header",
    ".breadcrumb",
    ".cookie",
    "script",
    "style",
    "meta",
    "noscript",
];

static BODY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// Compiled list of boilerplate selectors.
#[derive(Debug, Clone)]
pub struct Boilerplate {
    selectors: Vec<Selector>,
}

impl Boilerplate {
    /// Compile the given selectors, skipping (and logging) any that fail to parse.
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selectors = selectors
            .into_iter()
            .filter_map(|css| match Selector::parse(css.as_ref()) {
                Ok(sel) => Some(sel),
                Err(err) => {
                    warn!(selector = css.as_ref(), error = %err, "ignoring invalid boilerplate selector");
                    None
                }
            })
            .collect();
        Self { selectors }
    }

    /// Ids of every element matched by a boilerplate selector.
    pub fn excluded_ids(&self, html: &Html) -> HashSet<NodeId> {
        self.selectors
            .iter()
            .flat_map(|sel| html.select(sel).map(|el| el.id()))
            .collect()
    }
}

impl Default for Boilerplate {
    fn default() -> Self {
        Self::new(DEFAULT_BOILERPLATE_SELECTORS)
    }
}

fn collect_text(node: NodeRef<'_, Node>, excluded: &HashSet<NodeId>, out: &mut Vec<String>) {
    for child in node.children() {
        if excluded.contains(&child.id()) {
            continue;
        }
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Node::Element(_) => collect_text(child, excluded, out),
            _ => {}
        }
    }
}

/// Lowercased, whitespace-collapsed body text with boilerplate removed.
///
/// Returns an empty string when the body itself is excluded.
pub fn body_text(html: &Html, excluded: &HashSet<NodeId>) -> String {
    let Some(body) = html.select(&BODY_SEL).next() else {
        return String::new();
    };
    if excluded.contains(&body.id()) {
        return String::new();
    }

    let mut parts = Vec::new();
    collect_text(*body, excluded, &mut parts);
    collapse_whitespace(&parts.join(" ")).to_lowercase()
}

fn is_excluded(element: &ElementRef, excluded: &HashSet<NodeId>) -> bool {
    excluded.contains(&element.id()) || element.ancestors().any(|a| excluded.contains(&a.id()))
}

/// Lowercased text of the first element matching `selector` outside boilerplate.
pub fn first_content_text(
    html: &Html,
    selector: &Selector,
    excluded: &HashSet<NodeId>,
) -> Option<String> {
    html.select(selector)
        .find(|el| !is_excluded(el, excluded))
        .map(|el| collapse_whitespace(&element_text(&el)).to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head><title>t</title></head><body>
        <header><h1>Site Header</h1></header>
        <nav><a href="/">Home</a></nav>
        <div class="breadcrumb">Home &gt; Roofing</div>
        <main>
          <h1>Metal   Roofing</h1>
          <p>We install <b>standing seam</b> roofs.</p>
          <script>var roofing = "hidden";</script>
        </main>
        <div id="footer">Call Now</div>
        <footer>Copyright</footer>
    </body></html>"#;

    #[test]
    fn test_body_text_excludes_boilerplate() {
        let html = Html::parse_document(PAGE);
        let excluded = Boilerplate::default().excluded_ids(&html);
        assert_eq!(
            body_text(&html, &excluded),
            "metal roofing we install standing seam roofs."
        );
    }

    #[test]
    fn test_first_content_text_skips_header_h1() {
        let html = Html::parse_document(PAGE);
        let excluded = Boilerplate::default().excluded_ids(&html);
        let h1 = Selector::parse("h1").unwrap();
        assert_eq!(
            first_content_text(&html, &h1, &excluded).as_deref(),
            Some("metal roofing")
        );
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let boilerplate = Boilerplate::new(["nav", "[[["]);
        let html = Html::parse_document("<body><nav>x</nav><p>kept</p></body>");
        let excluded = boilerplate.excluded_ids(&html);
        assert_eq!(body_text(&html, &excluded), "kept");
    }

    #[test]
    fn test_excluded_body_yields_empty_text() {
        let html = Html::parse_document(r#"<body class="header"><p>x</p></body>"#);
        let excluded = Boilerplate::default().excluded_ids(&html);
        assert_eq!(body_text(&html, &excluded), "");
    }
}
