//! Configuration parsing and management.

use crate::assets::{default_vendor_assets, AssetDescriptor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the academy.yml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub export: ExportConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_title() -> String {
    String::from("Course Academy")
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Course content root (one subdirectory per module)
    #[serde(default = "default_content")]
    pub content: PathBuf,

    /// The app's own CSS/JS, served under /static
    #[serde(default = "default_static", rename = "static")]
    pub static_dir: PathBuf,

    /// Static export destination
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_content() -> PathBuf {
    PathBuf::from("course")
}

fn default_static() -> PathBuf {
    PathBuf::from("static")
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: default_content(),
            static_dir: default_static(),
            output: default_output(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite file holding lesson progress and quiz attempts
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

fn default_port() -> u16 {
    8000
}

fn default_database() -> PathBuf {
    PathBuf::from("data/progress.db")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            database: default_database(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Loopback port the ephemeral server binds during export
    #[serde(default = "default_export_port")]
    pub port: u16,

    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,

    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// Downloaded vendor assets live here so they survive output cleaning
    #[serde(default = "default_vendor_cache")]
    pub vendor_cache: PathBuf,

    /// Anchors pointing under these prefixes are removed from exported pages
    #[serde(default = "default_server_only_prefixes")]
    pub server_only_prefixes: Vec<String>,

    #[serde(default = "default_vendor_assets")]
    pub vendor_assets: Vec<AssetDescriptor>,

    /// Executable providing `serve`; defaults to the running binary
    #[serde(default)]
    pub server_bin: Option<PathBuf>,
}

fn default_export_port() -> u16 {
    18765
}

fn default_ready_timeout() -> u64 {
    30
}

fn default_page_timeout() -> u64 {
    15
}

fn default_shutdown_grace() -> u64 {
    5
}

fn default_vendor_cache() -> PathBuf {
    PathBuf::from(".academy-cache")
}

fn default_server_only_prefixes() -> Vec<String> {
    vec![String::from("/api/")]
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            port: default_export_port(),
            ready_timeout_secs: default_ready_timeout(),
            page_timeout_secs: default_page_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
            vendor_cache: default_vendor_cache(),
            server_only_prefixes: default_server_only_prefixes(),
            vendor_assets: default_vendor_assets(),
            server_bin: None,
        }
    }
}

impl ExportConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load the config file if it exists, otherwise fall back to defaults
    /// resolved against the directory the file would live in.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        tracing::info!("No config at {:?}; using defaults", path);
        Ok(Config {
            config_path: Some(path.to_path_buf()),
            ..Config::default()
        })
    }

    /// Path of the file this config was loaded from (or would be)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Get the static assets directory, resolved relative to config file
    pub fn static_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.static_dir)
    }

    /// Get the export output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Get the progress database path, resolved relative to config file
    pub fn database_path(&self) -> PathBuf {
        self.resolve_path(&self.server.database)
    }

    /// Get the vendor asset cache directory, resolved relative to config file
    pub fn vendor_cache_dir(&self) -> PathBuf {
        self.resolve_path(&self.export.vendor_cache)
    }

    /// Resolve an arbitrary path relative to the config file location
    pub fn resolve_relative(&self, path: &Path) -> PathBuf {
        self.resolve_path(path)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_deref().and_then(Path::parent) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.site.title, "Course Academy");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.export.port, 18765);
        assert_eq!(config.export.server_only_prefixes, vec!["/api/"]);
        assert_eq!(config.export.vendor_assets.len(), 6);
        assert_eq!(config.export.page_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("academy.yml");
        fs::write(
            &path,
            r#"
site:
  title: "Rust Course"
paths:
  content: "lessons"
export:
  port: 19000
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.site.title, "Rust Course");
        assert_eq!(config.content_dir(), dir.path().join("lessons"));
        assert_eq!(config.static_dir(), dir.path().join("static"));
        assert_eq!(config.export.port, 19000);
        assert_eq!(config.export.ready_timeout_secs, 30);
    }

    #[test]
    fn test_missing_file_resolves_against_its_directory() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path().join("academy.yml")).unwrap();

        assert_eq!(config.output_dir(), dir.path().join("dist"));
        assert_eq!(config.database_path(), dir.path().join("data/progress.db"));
        assert_eq!(config.vendor_cache_dir(), dir.path().join(".academy-cache"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let dir = tempdir().unwrap();
        let mut config = Config::load(dir.path().join("academy.yml")).unwrap();
        config.paths.output = PathBuf::from("/srv/site");
        assert_eq!(config.output_dir(), PathBuf::from("/srv/site"));
    }
}
