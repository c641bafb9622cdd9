//! Layered configuration for the image cache tool.
//!
//! Values resolve in priority order: environment variables (`APOD_*`,
//! `__`-separated for nesting) over the user's TOML config file over
//! built-in defaults. Every value has a default, so a fresh install works
//! with no config file at all.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "APOD_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the cached image files and the index database.
    pub cache_dir: PathBuf,
    /// File name of the index database inside `cache_dir`.
    pub database_file: String,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// NASA API key. The shared `DEMO_KEY` works out of the box but is
    /// heavily rate-limited; users should set their own via `APOD_API__KEY`.
    pub key: String,
    pub base_url: String,
    /// Per-request timeout, covering the metadata call and the image
    /// download alike.
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            database_file: "image_cache.db".to_string(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: "DEMO_KEY".to_string(),
            base_url: "https://api.nasa.gov/planetary/apod".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load() -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = default_config_file() {
            figment = figment.merge(Toml::file(path));
        }
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from an explicitly chosen file instead of the
    /// standard location. Environment variables still take priority.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        debug!(cache_dir = %config.cache_dir.display(), "configuration loaded");
        Ok(config)
    }

    /// Full path of the index database file.
    pub fn database_path(&self) -> PathBuf {
        self.cache_dir.join(&self.database_file)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "apod")
}

/// The user's config file location, e.g. `~/.config/apod/config.toml` on
/// Linux. `None` only when no home directory can be determined.
pub fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

fn default_cache_dir() -> PathBuf {
    project_dirs().map(|dirs| dirs.cache_dir().join("images")).unwrap_or_else(|| PathBuf::from("images"))
}
