// ABOUTME: TOML configuration for the sitekit CLI, one section per tool.
// ABOUTME: Every field has a default, so an absent or partial file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use sitekit_audit::{default_templates, AlignmentConfig, MetaConfig, PageTemplate};
use sitekit_core::{Result, ScanOptions, SiteError};
use sitekit_rewrite::{CacheBustConfig, InjectRules, OptimizeConfig};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "sitekit.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FixesConfig {
    pub templates: Vec<PageTemplate>,
}

impl Default for FixesConfig {
    fn default() -> Self {
        Self {
            templates: default_templates(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Discovery filters; `root` is ignored in favour of the command argument.
    pub scan: ScanOptions,
    pub keywords: AlignmentConfig,
    pub fixes: FixesConfig,
    pub inject: InjectRules,
    pub optimize: OptimizeConfig,
    pub meta: MetaConfig,
    pub cache_bust: CacheBustConfig,
}

impl SiteConfig {
    /// Load `path`, or `sitekit.toml` when present, or the defaults.
    ///
    /// An explicitly named file that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SiteError::config(path, "read", Some(e.into())))?;
        toml::from_str(&content).map_err(|e| SiteError::config(path, "parse", Some(e.into())))
    }

    /// Scan options for `root` with the configured filters.
    pub fn scan_options(&self, root: impl Into<PathBuf>) -> ScanOptions {
        ScanOptions {
            root: root.into(),
            ..self.scan.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sitekit_audit::MatchMode;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: SiteConfig = toml::from_str(
            r#"
            [scan]
            priority = ["metal-roofing.html"]

            [keywords]
            match_mode = "word_boundary"

            [inject]
            eager_leading_images = 2

            [optimize]
            minify = true
            [optimize.prune]
            resources = ["leaflet"]
            loader = "js/loader.min.js"

            [cache_bust]
            asset_dirs = ["static"]
            hash_len = 12
            "#,
        )
        .unwrap();

        let opts = config.scan_options("public_html");
        assert_eq!(opts.root, PathBuf::from("public_html"));
        assert_eq!(opts.priority, vec!["metal-roofing.html"]);
        assert!(opts.skip_minified);
        assert_eq!(config.keywords.match_mode, MatchMode::WordBoundary);
        assert!(!config.keywords.stop_words.is_empty());
        assert_eq!(config.inject.eager_leading_images, 2);
        assert!(config.inject.defer_scripts);
        assert!(config.optimize.minify);
        assert!(config.optimize.backup);
        assert_eq!(config.optimize.prune.resources, vec!["leaflet"]);
        assert_eq!(config.fixes.templates, default_templates());
        assert_eq!(config.meta.title.max_chars, 60);
        assert_eq!(config.cache_bust.asset_dirs, vec!["static"]);
        assert_eq!(config.cache_bust.hash_len, 12);
        assert_eq!(config.cache_bust.manifest, "cache-manifest.json");
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = SiteConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sitekit.toml");
        fs::write(&path, "[scan\npriority = 1").unwrap();
        assert!(SiteConfig::from_file(&path).unwrap_err().is_config());
    }
}
