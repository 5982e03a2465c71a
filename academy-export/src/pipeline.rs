//! The export run: clean, check, bundle, serve, crawl, shut down, report.

use crate::assets::{bundle_local_assets, AssetError, AssetReport, RemoteAssetBundler};
use crate::crawler::{Crawler, FetchError};
use crate::rewrite::Rewriter;
use crate::server::{EphemeralServer, ServerError, ServerSpec};
use crate::writer::write_page;
use academy_core::{AnswerKey, Config, ContentError, Course, Page};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const STEPS: usize = 6;
const RULE_WIDTH: usize = 52;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to prepare output directory {path}: {source}")]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("static directory not found: {0}")]
    MissingStatic(PathBuf),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("server did not become ready within {0:?}")]
    NotReady(Duration),

    #[error(transparent)]
    Crawler(#[from] FetchError),
}

/// Orchestrator states, in the order a run passes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Cleaning,
    CheckingDeps,
    BundlingAssets,
    StartingServer,
    Crawling,
    ShuttingDown,
    Reporting,
    Terminal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Cleaning => "cleaning",
            Stage::CheckingDeps => "checking dependencies",
            Stage::BundlingAssets => "bundling assets",
            Stage::StartingServer => "starting server",
            Stage::Crawling => "crawling",
            Stage::ShuttingDown => "shutting down",
            Stage::Reporting => "reporting",
            Stage::Terminal => "done",
        };
        f.write_str(name)
    }
}

/// A page that could not be exported
#[derive(Debug, Clone)]
pub struct PageFailure {
    pub path: String,
    pub reason: String,
}

/// Result of crawling and writing every page
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// (page path, written file)
    pub written: Vec<(String, PathBuf)>,
    pub failed: Vec<PageFailure>,
}

/// Everything a finished run reports
#[derive(Debug)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub modules: usize,
    pub pages: usize,
    pub crawl: CrawlReport,
    pub assets: AssetReport,
}

impl ExportSummary {
    /// Succeeds iff every page was written; asset failures are warnings
    pub fn is_success(&self) -> bool {
        self.crawl.failed.is_empty()
    }
}

/// Crawl `pages` in order, rewrite each and write it under `out_root`.
/// Failures are collected per page and never stop the crawl.
pub async fn crawl_pages(
    crawler: &Crawler,
    pages: &[Page],
    rewriter: &Rewriter,
    answer_keys: &HashMap<String, AnswerKey>,
    out_root: &Path,
) -> CrawlReport {
    let mut report = CrawlReport::default();

    for page in pages {
        let path = page.path();
        let html = match crawler.fetch(&path).await {
            Ok(html) => html,
            Err(err) => {
                println!("  {} ✗ FAILED ({})", path, err);
                report.failed.push(PageFailure {
                    path,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let key = match page {
            Page::Quiz { module_id } => answer_keys.get(module_id),
            _ => None,
        };
        let html = rewriter.rewrite(&html, key);

        match write_page(&path, &html, out_root) {
            Ok(file) => {
                let rel = file.strip_prefix(out_root).unwrap_or(&file);
                println!("  {} → {}", path, rel.display());
                report.written.push((path, file));
            }
            Err(err) => {
                println!("  {} ✗ FAILED ({})", path, err);
                report.failed.push(PageFailure {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }

    report
}

/// Remove and recreate the output root
pub fn clean_output(out: &Path) -> Result<(), ExportError> {
    let clean = |source| ExportError::Clean {
        path: out.to_path_buf(),
        source,
    };
    if out.exists() {
        fs::remove_dir_all(out).map_err(clean)?;
    }
    fs::create_dir_all(out).map_err(clean)
}

/// One static export run
pub struct Exporter {
    config: Config,
    server: ServerSpec,
    stage: Stage,
}

impl Exporter {
    /// `server_bin` is the executable providing `serve`
    pub fn new(config: Config, server_bin: PathBuf) -> Self {
        let server = ServerSpec {
            program: server_bin,
            config_path: config.config_path().map(Path::to_path_buf),
            port: config.export.port,
        };
        Self {
            config,
            server,
            stage: Stage::Init,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(from = %self.stage, to = %stage, "export stage");
        self.stage = stage;
    }

    fn step(&mut self, stage: Stage, n: usize, label: &str) {
        self.enter(stage);
        println!("\n[{}/{}] {}", n, STEPS, label);
    }

    /// Run every stage. Fatal preconditions return `Err`; page failures are
    /// reported in the summary.
    pub async fn run(&mut self) -> Result<ExportSummary, ExportError> {
        let out = self.config.output_dir();
        println!("📦 {} | Static Export", self.config.site.title);
        println!("{}", "=".repeat(RULE_WIDTH));

        self.step(Stage::Cleaning, 1, "Cleaning output directory...");
        clean_output(&out)?;
        println!("  ✓ Ready: {}", out.display());

        self.step(Stage::CheckingDeps, 2, "Checking dependencies...");
        let version = self.server.check_runnable().await?;
        println!("  ✓ Server: {} ({})", self.server.program.display(), version);
        let static_dir = self.config.static_dir();
        if !static_dir.is_dir() {
            return Err(ExportError::MissingStatic(static_dir));
        }
        println!("  ✓ Static files: {}", static_dir.display());
        let course = Course::load(&self.config.content_dir())?;
        let pages = course.pages();
        let answer_keys = answer_keys(&course);
        println!(
            "  ✓ Content: {} modules, {} pages",
            course.modules().len(),
            pages.len()
        );

        self.step(Stage::BundlingAssets, 3, "Bundling static assets...");
        let static_out = out.join("static");
        let copied = bundle_local_assets(&static_dir, &static_out)?;
        println!("  ✓ Copied {} files from {}", copied, static_dir.display());
        let bundler = RemoteAssetBundler::new(
            self.config.vendor_cache_dir(),
            self.config.export.page_timeout(),
        )?;
        let assets = bundler
            .bundle(&self.config.export.vendor_assets, &static_out)
            .await?;
        for local in &assets.cached {
            println!("  ✓ Cached: {}", local);
        }
        for local in &assets.downloaded {
            println!("  ↓ Downloaded: {}", local);
        }
        for (url, reason) in &assets.failed {
            println!("  ✗ FAILED: {} ({})", url, reason);
        }

        self.step(Stage::StartingServer, 4, "Starting server...");
        let mut server = EphemeralServer::start(&self.server).await?;
        println!(
            "  Server PID {} on port {}...",
            server.pid().map(|p| p.to_string()).unwrap_or_else(|| "?".into()),
            self.server.port
        );
        let ready_timeout = self.config.export.ready_timeout();
        let ready = match server.await_ready(ready_timeout).await {
            Ok(ready) => ready,
            Err(err) => {
                self.shut_down(server).await;
                return Err(err.into());
            }
        };
        if !ready {
            println!("  ✗ Server failed to start within {:?}", ready_timeout);
            self.shut_down(server).await;
            return Err(ExportError::NotReady(ready_timeout));
        }
        println!("  ✓ Server ready");

        self.step(Stage::Crawling, 5, "Crawling pages...");
        println!(
            "  Found {} pages ({} modules)",
            pages.len(),
            course.modules().len()
        );
        let crawl = match Crawler::new(server.base_url(), self.config.export.page_timeout()) {
            Ok(crawler) => {
                let rewriter = Rewriter::new(
                    &self.config.export.vendor_assets,
                    &self.config.export.server_only_prefixes,
                );
                Ok(crawl_pages(&crawler, &pages, &rewriter, &answer_keys, &out).await)
            }
            Err(err) => Err(err),
        };

        self.step(Stage::ShuttingDown, 6, "Shutting down server...");
        self.shut_down(server).await;
        let crawl = crawl?;

        self.enter(Stage::Reporting);
        let summary = ExportSummary {
            output_dir: out,
            modules: course.modules().len(),
            pages: pages.len(),
            crawl,
            assets,
        };
        print_summary(&summary);

        self.enter(Stage::Terminal);
        Ok(summary)
    }

    async fn shut_down(&mut self, server: EphemeralServer) {
        self.enter(Stage::ShuttingDown);
        match server.stop(self.config.export.shutdown_grace()).await {
            Ok(_) => println!("  ✓ Server stopped"),
            Err(err) => {
                tracing::warn!("{}", err);
                println!("  ✗ Server did not stop cleanly: {}", err);
            }
        }
    }
}

/// Answer keys of every module that has a readable quiz
fn answer_keys(course: &Course) -> HashMap<String, AnswerKey> {
    let mut keys = HashMap::new();
    for module in course.modules() {
        match course.quiz(&module.id) {
            Ok(Some(quiz)) => {
                keys.insert(module.id.clone(), quiz.answer_key());
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("Skipping quiz for {}: {}", module.id, err),
        }
    }
    keys
}

fn print_summary(summary: &ExportSummary) {
    println!("\n{}", "=".repeat(RULE_WIDTH));
    if summary.is_success() {
        println!(
            "✅ Export complete! {} pages exported.",
            summary.crawl.written.len()
        );
    } else {
        println!(
            "⚠️  Export finished with {} failure(s):",
            summary.crawl.failed.len()
        );
        for failure in &summary.crawl.failed {
            println!("   ✗ {} ({})", failure.path, failure.reason);
        }
    }
    if !summary.assets.failed.is_empty() {
        println!(
            "   {} vendor asset(s) could not be downloaded; pages will fall back to missing files",
            summary.assets.failed.len()
        );
    }
    println!("\n   Output: {}/", summary.output_dir.display());
}
