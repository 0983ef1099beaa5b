//! Configuration management with layered hierarchy
//!
//! Later layers win: built-in defaults, the global user file, an explicit
//! `--config` file, then `TAXON_*` environment variables.

use miette::Diagnostic;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::assets::RemoteConfig;
use crate::core::resource::DEFAULT_LIMIT;

/// Default database file, relative to the working directory
pub const DEFAULT_DATABASE: &str = "taxon.db";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    #[diagnostic(code(taxon::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    #[diagnostic(
        code(taxon::config::parse),
        help("keys: database, asset_dir, public_url, remote, default_limit")
    )]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {var}: '{value}'")]
    #[diagnostic(code(taxon::config::env))]
    Env { var: &'static str, value: String },
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite database path
    pub database: PathBuf,
    /// Root of the directory asset store
    pub asset_dir: PathBuf,
    /// Base URL under which `asset_dir` is served
    pub public_url: Option<String>,
    /// Remote image service; when set it replaces the directory store
    pub remote: Option<RemoteConfig>,
    pub default_limit: u64,
}

/// One configuration layer as read from a file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Layer {
    database: Option<PathBuf>,
    asset_dir: Option<PathBuf>,
    public_url: Option<String>,
    remote: Option<RemoteLayer>,
    default_limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RemoteLayer {
    endpoint: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
}

impl Layer {
    /// Merge another layer into this one (other takes precedence)
    fn merge(&mut self, other: Layer) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.asset_dir.is_some() {
            self.asset_dir = other.asset_dir;
        }
        if other.public_url.is_some() {
            self.public_url = other.public_url;
        }
        if other.default_limit.is_some() {
            self.default_limit = other.default_limit;
        }
        if let Some(remote) = other.remote {
            let current = self.remote.get_or_insert_with(RemoteLayer::default);
            if remote.endpoint.is_some() {
                current.endpoint = remote.endpoint;
            }
            if remote.api_key.is_some() {
                current.api_key = remote.api_key;
            }
            if remote.api_secret.is_some() {
                current.api_secret = remote.api_secret;
            }
        }
    }

    fn read(path: &Path) -> Result<Layer, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Layer::default());
        }
        serde_yml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn from_env(env: &dyn Fn(&str) -> Option<String>) -> Result<Layer, ConfigError> {
        let get = |var: &str| env(var).filter(|v| !v.trim().is_empty());
        let mut layer = Layer {
            database: get("TAXON_DATABASE").map(PathBuf::from),
            asset_dir: get("TAXON_ASSET_DIR").map(PathBuf::from),
            public_url: get("TAXON_PUBLIC_URL"),
            ..Default::default()
        };
        if let Some(value) = get("TAXON_DEFAULT_LIMIT") {
            layer.default_limit = Some(value.trim().parse().map_err(|_| ConfigError::Env {
                var: "TAXON_DEFAULT_LIMIT",
                value,
            })?);
        }
        let remote = RemoteLayer {
            endpoint: get("TAXON_REMOTE_ENDPOINT"),
            api_key: get("TAXON_REMOTE_API_KEY"),
            api_secret: get("TAXON_REMOTE_API_SECRET"),
        };
        if remote.endpoint.is_some() || remote.api_key.is_some() || remote.api_secret.is_some() {
            layer.remote = Some(remote);
        }
        Ok(layer)
    }
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(
            Self::global_config_path().as_deref(),
            explicit,
            &|var: &str| std::env::var(var).ok(),
        )
    }

    /// Load with the global file location and environment supplied by the caller
    pub fn load_from(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut layer = Layer::default();

        // A broken global file should not make every command unusable
        if let Some(path) = global.filter(|p| p.exists()) {
            match Layer::read(path) {
                Ok(global) => {
                    debug!(path = %path.display(), "config: loaded global file");
                    layer.merge(global);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "config: ignoring global file"),
            }
        }

        if let Some(path) = explicit {
            layer.merge(Layer::read(path)?);
            debug!(path = %path.display(), "config: loaded explicit file");
        }

        layer.merge(Layer::from_env(env)?);
        Ok(Self::resolve(layer))
    }

    fn resolve(layer: Layer) -> Self {
        let database = layer
            .database
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));
        let asset_dir = layer.asset_dir.unwrap_or_else(|| {
            database
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join("assets")
        });
        let remote = layer.remote.and_then(|r| {
            Some(RemoteConfig {
                endpoint: r.endpoint?,
                api_key: r.api_key.unwrap_or_default(),
                api_secret: r.api_secret.unwrap_or_default(),
            })
        });

        Config {
            database,
            asset_dir,
            public_url: layer.public_url,
            remote,
            default_limit: layer.default_limit.unwrap_or(DEFAULT_LIMIT),
        }
    }

    /// Where `--icon` files are copied before upload
    pub fn staging_dir(&self) -> PathBuf {
        self.asset_dir.join(".staging")
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "taxon")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(Layer::default())
    }
}
