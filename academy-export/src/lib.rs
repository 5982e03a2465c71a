//! Static export of the academy site.
//!
//! The exporter starts the real server on a loopback port, crawls every page
//! the course defines, rewrites each page so it works without a backend, and
//! writes the result as a tree of `index.html` files next to a bundled copy
//! of every static and vendor asset.

pub mod assets;
pub mod crawler;
pub mod pipeline;
pub mod rewrite;
pub mod server;
pub mod writer;

pub use assets::{bundle_local_assets, AssetError, AssetReport, RemoteAssetBundler};
pub use crawler::{Crawler, FetchError};
pub use pipeline::{
    clean_output, crawl_pages, CrawlReport, ExportError, ExportSummary, Exporter, PageFailure,
    Stage,
};
pub use rewrite::{has_progress_toggle, Rewriter};
pub use server::{EphemeralServer, ServerError, ServerSpec};
pub use writer::{page_file, write_page, WriteError};
