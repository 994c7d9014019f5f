//! Configuration loading and validation.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults ([`Config::default`]);
//! 2. a configuration file, TOML, YAML or JSON picked by extension (the
//!    platform config directory's `config.toml` when no path is given and it
//!    exists);
//! 3. environment variables prefixed `YOMU_`, with `__` separating nested
//!    keys (`YOMU_DUPLICATES__CHUNK_SIZE=100`).
//!
//! Command-line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "YOMU_";
const APP_NAME: &str = "yomu";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "yomu.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file of the local metadata store. Defaults to the platform
    /// data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the reader server. When set, metadata is read from and
    /// written to the server instead of the local database.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Defaults to the number of hardware threads minus one.
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicatesConfig {
    pub chunk_size: usize,
    pub check_alternative_titles: bool,
}

impl Default for DuplicatesConfig {
    fn default() -> Self {
        Self { chunk_size: 200, check_alternative_titles: false }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// An `EnvFilter` directive, e.g. `info` or `yomu_meta=debug,info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub queue: QueueConfig,
    pub duplicates: DuplicatesConfig,
    pub log: LogConfig,
}

impl Config {
    /// Load and validate the configuration.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|path| path.is_file()),
        };
        tracing::debug!(path = ?path, "loading configuration");
        let config: Self = Self::figment(path.as_deref())?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// The merged configuration sources, not yet extracted.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
            figment = match extension.as_str() {
                "toml" => figment.merge(Toml::file_exact(path)),
                "yaml" | "yml" => figment.merge(Yaml::file_exact(path)),
                "json" => figment.merge(Json::file_exact(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.display().to_string())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.duplicates.chunk_size == 0 {
            exn::bail!(ErrorKind::Invalid("duplicates.chunk_size must be at least 1"));
        }
        if self.queue.concurrency == Some(0) {
            exn::bail!(ErrorKind::Invalid("queue.concurrency must be at least 1"));
        }
        if self.server.url.as_deref().is_some_and(|url| !url.starts_with("http://") && !url.starts_with("https://")) {
            exn::bail!(ErrorKind::Invalid("server.url must be an http(s) URL"));
        }
        Ok(())
    }

    /// Configured database path, or `yomu.db` in the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(DATABASE_FILE)),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME).ok_or_raise(|| ErrorKind::NoHomeDirectory)
}

/// `config.toml` in the platform configuration directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().ok().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
