// ABOUTME: Integration tests running the rewriting passes over a throwaway site on disk.
// ABOUTME: Covers the optimizer batch, backups, dry runs, charset fixing, minification and cache busting.

use std::fs;
use std::path::Path;

use chrono::{Local, TimeZone};
use pretty_assertions::assert_eq;
use sitekit_core::{Backup, ScanOptions};
use sitekit_rewrite::cache_bust::{busted_name, content_hash};
use sitekit_rewrite::{
    bust_site, fix_site, minify_file, render_markdown, revert_site, CacheBustConfig, InjectRules,
    Manifest, OptimizeConfig, Optimizer, PruneRules,
};
use tempfile::TempDir;

const INDEX: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Home</title>
    <link rel="stylesheet" href="css/styles.min.css">
    <link rel="stylesheet" href="css/popup.min.css">
</head>
<body>
    <header class="site-header"><img src="img/logo.png" alt="Logo"></header>
    <!-- gallery -->
    <img src="img/roof.jpg" alt="Roof">
    <script src="js/gtag.js"></script>
    <script src="js/gallery.js"></script>
</body>
</html>
"#;

const POST: &str = r#"<html>
<head>
    <title>Post</title>
    <meta charset="utf-8">
    <link rel="stylesheet" href="../css/leaflet.css">
</head>
<body>
    <p>Map</p>
    <script src="../js/leaflet.js"></script>
</body>
</html>
"#;

fn write(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "index.html", INDEX.as_bytes());
    write(dir.path(), "blog/post.html", POST.as_bytes());
    write(dir.path(), "legacy.html", b"<html><body>caf\xe9</body></html>");
    dir
}

fn config(backups: &Path) -> OptimizeConfig {
    OptimizeConfig {
        backup_dir: backups.to_path_buf(),
        prune: PruneRules {
            resources: vec!["leaflet".into()],
            loader: Some("js/loader.min.js".into()),
        },
        ..Default::default()
    }
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

#[test]
fn test_optimize_site() {
    let site = site();
    let backups = TempDir::new().unwrap();
    let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    let optimizer = Optimizer::new(config(backups.path()), InjectRules::default()).unwrap();
    let opts = ScanOptions::builder(site.path()).build();

    let report = optimizer.run(&opts, started).unwrap();

    let files: Vec<&str> = report.files.iter().map(|f| f.file.as_str()).collect();
    assert_eq!(files, vec!["blog/post.html", "index.html"]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].file, "legacy.html");
    assert_eq!(report.modified().count(), 2);

    assert_eq!(
        read(site.path(), "blog/post.html"),
        r#"<html>
<head>
    <title>Post</title>
    <meta charset="utf-8">
</head>
<body>
    <p>Map</p>
    <script src="../js/loader.min.js" defer></script>
</body>
</html>
"#
    );

    let index = read(site.path(), "index.html");
    assert!(index.contains(r#"<img src="img/logo.png" alt="Logo">"#));
    assert!(index.contains(r#"<img src="img/roof.jpg" alt="Roof" loading="lazy">"#));
    assert!(index.contains(r#"<script src="js/gtag.js"></script>"#));
    assert!(index.contains(r#"<script src="js/gallery.js" defer></script>"#));
    assert!(index.contains(r#"<link rel="stylesheet" href="css/styles.min.css">"#));
    assert!(index.contains(
        r#"<link rel="stylesheet" href="css/popup.min.css" media="print" onload="this.media='all'">"#
    ));
    assert!(index.contains(r#"<script src="js/loader.min.js" defer></script>"#));
    assert!(!index.contains("gallery -->"));

    let stamp = backups.path().join("20240309_140507");
    assert_eq!(report.backup_dir.as_deref(), Some(stamp.as_path()));
    assert_eq!(fs::read_to_string(stamp.join("index.html")).unwrap(), INDEX);
    assert_eq!(fs::read_to_string(stamp.join("blog/post.html")).unwrap(), POST);

    let md = render_markdown(&report, started);
    assert!(md.contains("- Files Modified: 2\n"));
    assert!(md.contains("- index.html: 1\n"));
    assert!(md.contains("- legacy.html: sitekit: read "));

    // a second run finds nothing left to do
    let again = optimizer.run(&opts, Local::now()).unwrap();
    assert_eq!(again.modified().count(), 0);
}

#[test]
fn test_dry_run_writes_nothing() {
    let site = site();
    let backups = TempDir::new().unwrap();
    let optimizer = Optimizer::new(
        OptimizeConfig {
            dry_run: true,
            ..config(backups.path())
        },
        InjectRules::default(),
    )
    .unwrap();

    let report = optimizer
        .run(&ScanOptions::builder(site.path()).build(), Local::now())
        .unwrap();

    assert_eq!(report.modified().count(), 2);
    assert_eq!(report.backup_dir, None);
    assert_eq!(read(site.path(), "index.html"), INDEX);
    assert_eq!(read(site.path(), "blog/post.html"), POST);
    assert_eq!(fs::read_dir(backups.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_root_is_fatal() {
    let dir = TempDir::new().unwrap();
    let optimizer = Optimizer::new(OptimizeConfig::default(), InjectRules::default()).unwrap();
    let err = optimizer
        .run(&ScanOptions::builder(dir.path().join("public_html")).build(), Local::now())
        .unwrap_err();
    assert!(err.is_missing_root());
}

#[test]
fn test_fix_charset_across_site() {
    let site = site();
    write(site.path(), "no-head.html", b"<p>fragment</p>");
    write(site.path(), "bare.html", b"<html><head>\n<title>Bare</title>\n</head></html>");
    let backups = TempDir::new().unwrap();
    let backup = Backup::new(backups.path(), Local::now());

    let report = fix_site(&ScanOptions::builder(site.path()).build(), false, Some(&backup)).unwrap();

    assert_eq!(report.fixed, vec!["blog/post.html"]);
    assert_eq!(report.already_correct, vec!["index.html"]);
    assert_eq!(report.skipped, vec!["bare.html"]);
    assert_eq!(report.no_head, vec!["no-head.html"]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.changed(), 1);

    assert!(read(site.path(), "blog/post.html")
        .starts_with("<html>\n<head>\n    <meta charset=\"UTF-8\">\n    <title>Post</title>\n"));
    assert_eq!(
        fs::read_to_string(backup.dir().join("blog/post.html")).unwrap(),
        POST
    );

    let report = fix_site(&ScanOptions::builder(site.path()).build(), true, None).unwrap();
    assert_eq!(report.inserted, vec!["bare.html"]);
    assert_eq!(report.fixed, Vec::<String>::new());
    assert_eq!(
        read(site.path(), "bare.html"),
        "<html><head>\n    <meta charset=\"UTF-8\">\n<title>Bare</title>\n</head></html>"
    );
}

#[test]
fn test_minify_file_in_place() {
    let site = site();
    let path = site.path().join("index.html");
    let stats = minify_file(&path, &path).unwrap();

    let minified = read(site.path(), "index.html");
    assert!(minified.starts_with("<!DOCTYPE html><html><head><meta charset=\"UTF-8\"><title>Home</title>"));
    assert!(!minified.contains("gallery -->"));
    assert_eq!(stats.minified_bytes, minified.len());
    assert!(stats.reduction_percent() > 10.0);
}

#[test]
fn test_cache_bust_then_revert() {
    let site = TempDir::new().unwrap();
    let index = r#"<link rel="stylesheet" href="css/site.css"><script src="js/app.js?v=1" defer></script>"#;
    let post = r#"<link rel="stylesheet" href="../css/site.css"><a href="../index.html">Home</a>"#;
    write(site.path(), "css/site.css", b"body{}");
    write(site.path(), "js/app.js", b"run();");
    write(site.path(), "index.html", index.as_bytes());
    write(site.path(), "blog/post.html", post.as_bytes());
    let opts = ScanOptions::builder(site.path()).build();
    let config = CacheBustConfig::default();
    let backups = TempDir::new().unwrap();
    let backup = Backup::new(backups.path(), Local::now());

    let report = bust_site(&opts, &config, Some(&backup), Local::now()).unwrap();

    let css = busted_name("css/site.css", &content_hash(b"body{}", 8));
    let js = busted_name("js/app.js", &content_hash(b"run();", 8));
    assert_eq!(report.assets, vec!["css/site.css", "js/app.js"]);
    assert_eq!(report.copies_written, 2);
    assert_eq!(report.pages_updated, vec!["blog/post.html", "index.html"]);
    assert_eq!(report.references_updated, 3);
    assert!(report.errors.is_empty());
    assert_eq!(read(site.path(), &css), "body{}");
    assert_eq!(read(site.path(), "css/site.css"), "body{}");
    assert_eq!(
        read(site.path(), "index.html"),
        format!(
            r#"<link rel="stylesheet" href="{}"><script src="{}?v=1" defer></script>"#,
            css, js
        )
    );
    assert_eq!(fs::read_to_string(backup.dir().join("index.html")).unwrap(), index);

    let manifest = Manifest::load(&site.path().join("cache-manifest.json")).unwrap();
    assert_eq!(manifest.assets["css/site.css"].busted, css);
    assert_eq!(manifest.assets["css/site.css"].size, 6);

    // nothing changed, nothing to do
    let again = bust_site(&opts, &config, None, Local::now()).unwrap();
    assert_eq!(again.assets.len(), 2);
    assert_eq!(again.copies_written, 0);
    assert!(again.pages_updated.is_empty());

    // edited stylesheet: new copy, pages follow it, the stale copy goes
    write(site.path(), "css/site.css", b"body{color:red}");
    let changed = bust_site(&opts, &config, None, Local::now()).unwrap();
    let css2 = busted_name("css/site.css", &content_hash(b"body{color:red}", 8));
    assert_eq!(changed.copies_written, 1);
    assert_eq!(changed.copies_removed, 1);
    assert_eq!(changed.references_updated, 2);
    assert!(!site.path().join(&css).exists());
    assert_eq!(
        read(site.path(), "blog/post.html"),
        format!(
            r#"<link rel="stylesheet" href="../{}"><a href="../index.html">Home</a>"#,
            css2
        )
    );

    let reverted = revert_site(&opts, &config, None).unwrap();
    assert_eq!(reverted.references_updated, 3);
    assert_eq!(reverted.copies_removed, 2);
    assert_eq!(read(site.path(), "index.html"), index);
    assert_eq!(read(site.path(), "blog/post.html"), post);
    assert!(!site.path().join(&css2).exists());
    assert!(!site.path().join("cache-manifest.json").exists());
}

#[test]
fn test_revert_without_manifest_is_report_error() {
    let site = site();
    let err = revert_site(
        &ScanOptions::builder(site.path()).build(),
        &CacheBustConfig::default(),
        None,
    )
    .unwrap_err();
    assert!(err.is_report());
}
