//! Export command implementation.

use academy_core::Config;
use academy_export::Exporter;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Export the site. Returns false when any page failed.
pub async fn export_site(config_path: &Path, out: Option<PathBuf>) -> Result<bool> {
    let mut config = Config::load(config_path).context("Failed to load config")?;

    if let Some(out) = out {
        // A command-line path is relative to the working directory, not the config
        config.paths.output = if out.is_absolute() {
            out
        } else {
            std::env::current_dir()
                .context("Failed to read current directory")?
                .join(out)
        };
    }

    let server_bin = match &config.export.server_bin {
        Some(bin) => config.resolve_relative(bin),
        None => std::env::current_exe().context("Failed to locate the academy executable")?,
    };

    let mut exporter = Exporter::new(config, server_bin);
    let summary = exporter.run().await.context("Export failed")?;
    Ok(summary.is_success())
}
