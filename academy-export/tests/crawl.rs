//! Crawl and bundling against an in-process HTTP server

use academy_core::{AssetDescriptor, Page};
use academy_export::{crawl_pages, Crawler, RemoteAssetBundler, Rewriter};
use axum::routing::get;
use axum::Router;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

const LESSON_HTML: &str = r#"<!DOCTYPE html>
<html><head>
<link rel="stylesheet" href="https://cdn.example.com/pico.min.css">
</head><body>
<nav><a href="/">Modules</a> <a href="/api/progress" class="api-link">Progress API</a></nav>
<div id="progress-btn-wrap"><form hx-post="/progress/toggle">
<input type="hidden" name="lesson_id" value="basics::intro">
<button type="submit">Mark Complete</button>
</form></div>
</body></html>"#;

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn site() -> Router {
    Router::new()
        .route("/", get(|| async { axum::response::Html("<html><body><h1>Home</h1></body></html>") }))
        .route(
            "/module/basics/lesson/intro",
            get(|| async { axum::response::Html(LESSON_HTML) }),
        )
        .route(
            "/module/basics",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                axum::response::Html("<html><body>too late</body></html>")
            }),
        )
}

fn pages() -> Vec<Page> {
    vec![
        Page::Home,
        Page::Module {
            module_id: "basics".into(),
        },
        Page::Lesson {
            module_id: "basics".into(),
            slug: "intro".into(),
        },
        Page::Quiz {
            module_id: "basics".into(),
        },
    ]
}

fn rewriter() -> Rewriter {
    Rewriter::new(
        &[AssetDescriptor::new(
            "https://cdn.example.com/pico.min.css",
            "vendor/pico.min.css",
        )],
        &["/api/".to_string()],
    )
}

#[tokio::test]
async fn test_slow_and_missing_pages_fail_without_stopping_crawl() {
    let base = spawn(site()).await;
    let out = TempDir::new().unwrap();
    let crawler = Crawler::new(base, Duration::from_secs(1)).unwrap();

    let report = crawl_pages(&crawler, &pages(), &rewriter(), &HashMap::new(), out.path()).await;

    assert_eq!(report.written.len(), 2);
    let failed: Vec<&str> = report.failed.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(failed, vec!["/module/basics", "/module/basics/quiz"]);
    assert!(report.failed[0].reason.contains("timed out"));
    assert!(report.failed[1].reason.contains("404"));

    assert!(out.path().join("index.html").is_file());
    assert!(out.path().join("module/basics/lesson/intro/index.html").is_file());
    assert!(!out.path().join("module/basics/index.html").exists());
}

#[tokio::test]
async fn test_exported_lesson_is_backend_free() {
    let base = spawn(site()).await;
    let out = TempDir::new().unwrap();
    let crawler = Crawler::new(base, Duration::from_secs(1)).unwrap();
    let lesson = [Page::Lesson {
        module_id: "basics".into(),
        slug: "intro".into(),
    }];

    let report = crawl_pages(&crawler, &lesson, &rewriter(), &HashMap::new(), out.path()).await;
    assert!(report.failed.is_empty());

    let html = fs::read_to_string(out.path().join("module/basics/lesson/intro/index.html")).unwrap();
    let doc = Html::parse_document(&html);

    let css = Selector::parse("link[rel=stylesheet]").unwrap();
    let hrefs: Vec<&str> = doc.select(&css).filter_map(|l| l.value().attr("href")).collect();
    assert_eq!(hrefs, vec!["/static/vendor/pico.min.css"]);

    let anchors = Selector::parse("a").unwrap();
    assert!(doc
        .select(&anchors)
        .all(|a| !a.value().attr("href").unwrap_or("").starts_with("/api")));

    let script = Selector::parse("script#static-progress-js").unwrap();
    assert_eq!(doc.select(&script).count(), 1);
    let sidebar = Selector::parse("script#static-sidebar-progress-js").unwrap();
    assert_eq!(doc.select(&sidebar).count(), 1);
}

#[tokio::test]
async fn test_warm_cache_downloads_nothing() {
    let base = spawn(Router::new().route(
        "/lib/mermaid.min.js",
        get(|| async { "window.mermaid = {};" }),
    ))
    .await;
    let cache = TempDir::new().unwrap();
    let assets = vec![AssetDescriptor::new(
        format!("{}/lib/mermaid.min.js", base),
        "vendor/mermaid.min.js",
    )];
    let bundler = RemoteAssetBundler::new(cache.path(), Duration::from_secs(2)).unwrap();

    let first_out = TempDir::new().unwrap();
    let first = bundler.bundle(&assets, first_out.path()).await.unwrap();
    assert_eq!(first.downloaded.len(), 1);
    assert!(first.failed.is_empty());

    let second_out = TempDir::new().unwrap();
    let second = bundler.bundle(&assets, second_out.path()).await.unwrap();
    assert!(second.downloaded.is_empty());
    assert_eq!(second.cached.len(), 1);
    assert_eq!(
        fs::read_to_string(second_out.path().join("vendor/mermaid.min.js")).unwrap(),
        "window.mermaid = {};"
    );
}
