//! Maps page paths to `index.html` files under the output root.

use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("refusing to write unsafe page path {0:?}")]
    UnsafePath(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output file for a page path: `/` is `<out>/index.html`, anything else is
/// `<out>/<path without surrounding slashes>/index.html`.
pub fn page_file(path: &str, out_root: &Path) -> Result<PathBuf, WriteError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(out_root.join("index.html"));
    }

    let relative = safe_relative(trimmed).ok_or_else(|| WriteError::UnsafePath(path.to_string()))?;
    Ok(out_root.join(relative).join("index.html"))
}

/// Write one crawled page, creating parent directories
pub fn write_page(path: &str, html: &str, out_root: &Path) -> Result<PathBuf, WriteError> {
    let file = page_file(path, out_root)?;
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|source| WriteError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&file, html).map_err(|source| WriteError::Io {
        path: file.clone(),
        source,
    })?;
    Ok(file)
}

/// A `/`-separated relative path whose segments are all plain names
pub(crate) fn safe_relative(path: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for segment in path.split('/') {
        if segment.is_empty() || segment.contains('\\') {
            return None;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => out.push(name),
            _ => return None,
        }
    }
    Some(out)
}
