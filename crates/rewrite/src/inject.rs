// ABOUTME: Injects lazy-loading and deferral attributes into <img>, <script src> and stylesheet <link> tags.
// ABOUTME: Rules are data; the rewrite only inserts text and is a no-op when run again.

use aho_corasick::AhoCorasick;
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

use sitekit_core::{Result, SiteError};

use crate::tags::{scan_tags, CriticalRegions, Tag};

const LAZY_ATTR: &str = r#" loading="lazy""#;
const DEFER_ATTR: &str = " defer";
const PRINT_MEDIA_ATTR: &str = r#" media="print" onload="this.media='all'""#;

/// Data tables driving the injector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectRules {
    pub lazy_images: bool,
    pub defer_scripts: bool,
    pub defer_stylesheets: bool,
    /// Case-insensitive patterns; an image whose attribute text matches one stays eager.
    pub critical_image_markers: Vec<String>,
    pub critical_regions: CriticalRegions,
    /// Substrings of `src` that keep a script blocking.
    pub critical_scripts: Vec<String>,
    /// Substrings of `href` that keep a stylesheet blocking.
    pub critical_stylesheets: Vec<String>,
    /// Only stylesheets whose `href` contains this are deferred.
    pub deferred_stylesheet_marker: String,
    /// The first N images of a document always stay eager.
    pub eager_leading_images: usize,
}

impl Default for InjectRules {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            lazy_images: true,
            defer_scripts: true,
            defer_stylesheets: true,
            critical_image_markers: owned(&[
                "hero",
                "banner",
                "logo",
                "header",
                r"above.*fold",
                "critical",
                "priority",
                r#"fetchpriority\s*=\s*["']high["']"#,
            ]),
            critical_regions: CriticalRegions::default(),
            critical_scripts: owned(&["gtag", "analytics", "main.js", "main.min.js"]),
            critical_stylesheets: owned(&["styles.min.css", "combined.min.css"]),
            deferred_stylesheet_marker: ".min.css".to_string(),
            eager_leading_images: 0,
        }
    }
}

/// Counts of attributes inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InjectStats {
    pub images_lazy: usize,
    pub scripts_deferred: usize,
    pub stylesheets_deferred: usize,
}

/// [`InjectRules`] compiled for matching.
#[derive(Debug, Clone)]
pub struct Injector {
    rules: InjectRules,
    image_markers: RegexSet,
    critical_scripts: AhoCorasick,
    critical_stylesheets: AhoCorasick,
}

fn substring_matcher(patterns: &[String], what: &str) -> Result<AhoCorasick> {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(patterns)
        .map_err(|e| SiteError::config("inject", format!("compile {}", what), Some(e.into())))
}

impl Injector {
    pub fn new(rules: InjectRules) -> Result<Self> {
        let image_markers = RegexSetBuilder::new(&rules.critical_image_markers)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                SiteError::config("inject", "compile critical image markers", Some(e.into()))
            })?;
        Ok(Self {
            critical_scripts: substring_matcher(&rules.critical_scripts, "critical scripts")?,
            critical_stylesheets: substring_matcher(
                &rules.critical_stylesheets,
                "critical stylesheets",
            )?,
            image_markers,
            rules,
        })
    }

    fn wants_lazy(&self, tag: &Tag, markup: &str, image_index: usize) -> bool {
        !tag.has_attr("loading")
            && image_index >= self.rules.eager_leading_images
            && !tag.in_critical_region
            && !self.image_markers.is_match(&markup[tag.attr_span.clone()])
    }

    fn wants_defer(&self, tag: &Tag) -> bool {
        match tag.attr("src") {
            Some(src) if !src.is_empty() => {
                !tag.has_attr("defer")
                    && !tag.has_attr("async")
                    && !self.critical_scripts.is_match(src)
            }
            _ => false,
        }
    }

    fn wants_print_media(&self, tag: &Tag) -> bool {
        let is_stylesheet = tag
            .attr("rel")
            .map(|rel| {
                rel.split_whitespace()
                    .any(|r| r.eq_ignore_ascii_case("stylesheet"))
            })
            .unwrap_or(false);
        let Some(href) = tag.attr("href") else {
            return false;
        };
        is_stylesheet
            && !tag.has_attr("media")
            && href.contains(self.rules.deferred_stylesheet_marker.as_str())
            && !self.critical_stylesheets.is_match(href)
    }

    /// Return `markup` with qualifying tags annotated.
    ///
    /// Every byte outside the inserted attributes is preserved, so running
    /// the result through `apply` again changes nothing.
    pub fn apply(&self, markup: &str) -> (String, InjectStats) {
        let mut stats = InjectStats::default();
        let mut inserts: Vec<(usize, &'static str)> = Vec::new();
        let mut image_index = 0;

        for tag in scan_tags(markup, &self.rules.critical_regions)
            .iter()
            .filter(|t| !t.closing)
        {
            match tag.name.as_str() {
                "img" if self.rules.lazy_images => {
                    if self.wants_lazy(tag, markup, image_index) {
                        inserts.push((tag.insertion_point(markup), LAZY_ATTR));
                        stats.images_lazy += 1;
                    }
                    image_index += 1;
                }
                "script" if self.rules.defer_scripts && self.wants_defer(tag) => {
                    inserts.push((tag.insertion_point(markup), DEFER_ATTR));
                    stats.scripts_deferred += 1;
                }
                "link" if self.rules.defer_stylesheets && self.wants_print_media(tag) => {
                    inserts.push((tag.insertion_point(markup), PRINT_MEDIA_ATTR));
                    stats.stylesheets_deferred += 1;
                }
                _ => {}
            }
        }

        if inserts.is_empty() {
            return (markup.to_string(), stats);
        }

        let extra: usize = inserts.iter().map(|(_, text)| text.len()).sum();
        let mut out = String::with_capacity(markup.len() + extra);
        let mut last = 0;
        for (at, text) in inserts {
            out.push_str(&markup[last..at]);
            out.push_str(text);
            last = at;
        }
        out.push_str(&markup[last..]);
        (out, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn apply(markup: &str) -> (String, InjectStats) {
        Injector::new(InjectRules::default()).unwrap().apply(markup)
    }

    #[test]
    fn test_lazy_image_and_idempotence() {
        let (once, stats) = apply(r#"<img src="a.jpg">"#);
        assert_eq!(once, r#"<img src="a.jpg" loading="lazy">"#);
        assert_eq!(stats.images_lazy, 1);

        let (twice, stats) = apply(&once);
        assert_eq!(twice, once);
        assert_eq!(stats, InjectStats::default());
    }

    #[test]
    fn test_self_closing_image() {
        let (out, _) = apply(r#"<img src="a.jpg" alt="A" />"#);
        assert_eq!(out, r#"<img src="a.jpg" alt="A" loading="lazy" />"#);
    }

    #[test]
    fn test_critical_images_stay_eager() {
        for markup in [
            r#"<img src="hero.jpg">"#,
            r#"<img src="x.jpg" class="site-LOGO">"#,
            r#"<img src="x.jpg" fetchpriority="high">"#,
            r#"<img src="x.jpg" data-role="above-the-fold">"#,
            r#"<header><a href="/"><img src="x.jpg"></a></header>"#,
            r#"<img src="x.jpg" loading="eager">"#,
        ] {
            let (out, stats) = apply(markup);
            assert_eq!(out, markup);
            assert_eq!(stats.images_lazy, 0, "{markup}");
        }
    }

    #[test]
    fn test_eager_leading_images() {
        let rules = InjectRules {
            eager_leading_images: 1,
            ..Default::default()
        };
        let (out, stats) = Injector::new(rules)
            .unwrap()
            .apply(r#"<img src="1.jpg"><img src="2.jpg">"#);
        assert_eq!(out, r#"<img src="1.jpg"><img src="2.jpg" loading="lazy">"#);
        assert_eq!(stats.images_lazy, 1);
    }

    #[test]
    fn test_script_deferral() {
        let (out, stats) = apply(r#"<script src="vendor/leaflet.js"></script>"#);
        assert_eq!(out, r#"<script src="vendor/leaflet.js" defer></script>"#);
        assert_eq!(stats.scripts_deferred, 1);

        for markup in [
            r#"<script src="gtag.js"></script>"#,
            r#"<script src="js/main.min.js"></script>"#,
            r#"<script async src="x.js"></script>"#,
            r#"<script>document.write('<script src="y.js"></script>');</script>"#,
        ] {
            let (out, _) = apply(markup);
            assert_eq!(out, markup);
        }
    }

    #[test]
    fn test_stylesheet_deferral() {
        let (out, stats) = apply(r#"<link rel="stylesheet" href="css/popup.min.css">"#);
        assert_eq!(
            out,
            r#"<link rel="stylesheet" href="css/popup.min.css" media="print" onload="this.media='all'">"#
        );
        assert_eq!(stats.stylesheets_deferred, 1);

        for markup in [
            r#"<link rel="stylesheet" href="css/styles.min.css">"#,
            r#"<link rel="stylesheet" href="css/popup.css">"#,
            r#"<link rel="stylesheet" href="a.min.css" media="screen">"#,
            r#"<link rel="preload" href="a.min.css">"#,
        ] {
            let (out, _) = apply(markup);
            assert_eq!(out, markup);
        }
    }

    #[test]
    fn test_untouched_bytes_survive() {
        let markup = "<!DOCTYPE html>\n<p>Caf\u{e9}</p>\n<!-- <img src=\"c.jpg\"> -->\n<img src=\"b.jpg\">\n";
        let (out, _) = apply(markup);
        assert_eq!(
            out,
            "<!DOCTYPE html>\n<p>Caf\u{e9}</p>\n<!-- <img src=\"c.jpg\"> -->\n<img src=\"b.jpg\" loading=\"lazy\">\n"
        );
    }

    #[test]
    fn test_unquoted_apostrophe_does_not_leak_into_later_tags() {
        let (out, stats) = apply(r#"<img alt=Bob's src="a.jpg"><p>it's</p><img src="b.jpg">"#);
        assert_eq!(
            out,
            r#"<img alt=Bob's src="a.jpg" loading="lazy"><p>it's</p><img src="b.jpg" loading="lazy">"#
        );
        assert_eq!(stats.images_lazy, 2);
    }

    #[test]
    fn test_invalid_marker_is_config_error() {
        let rules = InjectRules {
            critical_image_markers: vec!["(".into()],
            ..Default::default()
        };
        assert!(Injector::new(rules).unwrap_err().is_config());
    }
}
