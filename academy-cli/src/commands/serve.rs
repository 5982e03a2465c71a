//! Serve command implementation.

use academy_core::Config;
use academy_server::{serve, ServeOptions};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Run the course server until interrupted
pub async fn serve_course(
    config_path: &Path,
    port: Option<u16>,
    db: Option<PathBuf>,
    watch: bool,
) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load config")?;

    let mut options = ServeOptions::from_config(&config);
    if let Some(port) = port {
        options.port = port;
    }
    if let Some(db) = db {
        options.database = db;
    }
    options.watch = watch;

    println!("🎓 {} on http://localhost:{}", config.site.title, options.port);
    serve(config, options).await.context("Server failed")
}
