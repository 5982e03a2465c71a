//! Bundling of the site's own static files and third-party vendor assets.

use crate::writer::safe_relative;
use academy_core::AssetDescriptor;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("static directory not found: {0}")]
    MissingSource(PathBuf),

    #[error("asset destination {0:?} escapes the static directory")]
    UnsafeDestination(String),

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to walk {0}")]
    Walk(#[from] walkdir::Error),

    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Outcome of bundling remote assets, by local destination
#[derive(Debug, Default, Clone)]
pub struct AssetReport {
    pub downloaded: Vec<String>,
    pub cached: Vec<String>,
    /// (url, reason)
    pub failed: Vec<(String, String)>,
}

/// Replace `dest` with a copy of `src`. Returns the number of files copied.
pub fn bundle_local_assets(src: &Path, dest: &Path) -> Result<usize, AssetError> {
    if !src.is_dir() {
        return Err(AssetError::MissingSource(src.to_path_buf()));
    }
    if dest.exists() {
        fs::remove_dir_all(dest)?;
    }
    fs::create_dir_all(dest)?;

    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target).map_err(|source| AssetError::Copy {
            from: entry.path().to_path_buf(),
            to: target.clone(),
            source,
        })?;
        copied += 1;
    }

    tracing::debug!("Copied {} static files into {}", copied, dest.display());
    Ok(copied)
}

fn copy_file(from: &Path, to: &Path) -> Result<(), AssetError> {
    let copy_err = |source| AssetError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(copy_err)?;
    }
    fs::copy(from, to).map_err(copy_err)?;
    Ok(())
}

/// Downloads vendor assets into a cache directory and copies them into the
/// output's static directory.
pub struct RemoteAssetBundler {
    client: reqwest::Client,
    cache_dir: PathBuf,
}

impl RemoteAssetBundler {
    pub fn new(cache_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, AssetError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            cache_dir: cache_dir.into(),
        })
    }

    /// Fetch every descriptor missing from the cache, then copy each cached
    /// file to `<static_out>/<local>`. A failed download or copy is recorded
    /// in the report and never aborts the run.
    pub async fn bundle(
        &self,
        descriptors: &[AssetDescriptor],
        static_out: &Path,
    ) -> Result<AssetReport, AssetError> {
        let mut report = AssetReport::default();

        for asset in descriptors {
            let relative = safe_relative(asset.local.trim_start_matches('/'))
                .ok_or_else(|| AssetError::UnsafeDestination(asset.local.clone()))?;
            let cached = self.cache_dir.join(&relative);

            let fresh = !cached.is_file();
            if fresh {
                if let Err(err) = self.download(&asset.url, &cached).await {
                    tracing::warn!("Failed to download {}: {}", asset.url, err);
                    report.failed.push((asset.url.clone(), err.to_string()));
                    continue;
                }
            }

            if let Err(err) = copy_file(&cached, &static_out.join(&relative)) {
                tracing::warn!("Failed to bundle {}: {}", asset.url, err);
                report.failed.push((asset.url.clone(), err.to_string()));
                continue;
            }

            if fresh {
                report.downloaded.push(asset.local.clone());
            } else {
                report.cached.push(asset.local.clone());
            }
        }

        Ok(report)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), AssetError> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write then rename so an interrupted download never looks cached
        let partial = dest.with_extension("part");
        fs::write(&partial, &bytes)?;
        fs::rename(&partial, dest)?;
        Ok(())
    }
}
