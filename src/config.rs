//! Application configuration management.
//!
//! Settings are layered with figment: built-in defaults, then a TOML file,
//! then `FIDEDU_*` environment variables. Command-line flags are applied
//! on top by [`Config::apply_cli`].

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::duplicates::default_workers;
use crate::scanner::{WalkerConfig, DEFAULT_BUFFER_SIZE};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "FIDEDU_";

/// Errors that can occur while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// The layered configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of hashing worker threads (at least 1).
    pub workers: usize,
    /// Chunk size for content reads in bytes.
    pub buffer_size: usize,
    /// Minimum file size to consider.
    pub min_size: Option<u64>,
    /// Maximum file size to consider.
    pub max_size: Option<u64>,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Gitignore-style exclusion patterns.
    pub ignore_patterns: Vec<String>,
    /// Show progress bars.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            min_size: None,
            max_size: None,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            progress: true,
        }
    }
}

impl Config {
    /// Load configuration from defaults, a TOML file and the environment.
    ///
    /// With `explicit = Some(path)` the file must exist. Otherwise the
    /// platform default path is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or any layer fails
    /// to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path().filter(|p| p.is_file()),
        };

        if let Some(ref path) = file {
            log::debug!("Loading config from {}", path.display());
        }
        Self::figment(file.as_deref())
            .extract::<Self>()
            .map(Self::normalized)
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Build the layered figment without extracting it.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "fidedu").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(workers) = cli.worker_count() {
            self.workers = workers;
        }
        if cli.min_size.is_some() {
            self.min_size = cli.min_size;
        }
        if cli.max_size.is_some() {
            self.max_size = cli.max_size;
        }
        if cli.skip_hidden {
            self.skip_hidden = true;
        }
        self.ignore_patterns.extend(cli.ignore_patterns.iter().cloned());
        if cli.no_progress {
            self.progress = false;
        }
        self.normalized()
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_skip_hidden(self.skip_hidden)
            .with_min_size(self.min_size)
            .with_max_size(self.max_size)
            .with_ignore_patterns(self.ignore_patterns.clone())
    }

    fn normalized(mut self) -> Self {
        self.workers = self.workers.max(1);
        self
    }
}
