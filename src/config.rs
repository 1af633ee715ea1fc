//! Layered application settings.
//!
//! Values are merged in this order, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory, or the file given with
//!    `--config`
//! 3. `FINDDUPS_*` environment variables (`FINDDUPS_CHUNK_SIZE=65536`)
//! 4. Command-line flags
//!
//! ```toml
//! chunk_size = 65536
//! jobs = 4
//! skip_hidden = true
//! min_size = 1024
//! ignore_patterns = ["*.tmp", "node_modules/"]
//! respect_gitignore = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::duplicates::{ResolverConfig, DEFAULT_CHUNK_SIZE};
use crate::scanner::WalkerConfig;

/// Prefix of environment variables read as settings.
pub const ENV_PREFIX: &str = "FINDDUPS_";

/// Errors raised while loading settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// Settings could not be rendered as TOML.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bytes read per file per comparison step
    pub chunk_size: usize,
    /// Size buckets compared concurrently
    pub jobs: usize,
    /// Skip dot files and dot directories
    pub skip_hidden: bool,
    /// Leave empty files out of the report
    pub exclude_empty: bool,
    /// Ignore files smaller than this many bytes
    pub min_size: Option<u64>,
    /// Ignore files larger than this many bytes
    pub max_size: Option<u64>,
    /// Gitignore-style patterns to skip
    pub ignore_patterns: Vec<String>,
    /// Apply the `.gitignore` file at each root
    pub respect_gitignore: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            jobs: 1,
            skip_hidden: false,
            exclude_empty: false,
            min_size: None,
            max_size: None,
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
        }
    }
}

impl Settings {
    /// Default platform-specific config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "finddups").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Defaults, then the config file, then the environment.
    ///
    /// A missing default config file is skipped silently.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` names a missing file.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    if path.is_file() {
                        log::debug!("Loading config from {}", path.display());
                    }
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Extract settings from a prepared figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if any layer fails to parse.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Load the file and environment layers, then apply CLI flags.
    ///
    /// # Errors
    ///
    /// See [`Settings::figment`] and [`Settings::from_figment`].
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let figment = Self::figment(cli.config.as_deref())?;
        let mut settings = Self::from_figment(&figment)?;
        settings.apply_cli(cli);
        Ok(settings)
    }

    /// Overlay flags given on the command line.
    ///
    /// Boolean switches can only turn a setting on; ignore patterns are
    /// appended to those from lower layers.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(chunk_size) = cli.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(jobs) = cli.jobs {
            self.jobs = jobs;
        }
        if cli.min_size.is_some() {
            self.min_size = cli.min_size;
        }
        if cli.max_size.is_some() {
            self.max_size = cli.max_size;
        }
        self.skip_hidden |= cli.skip_hidden;
        self.exclude_empty |= cli.exclude_empty;
        self.respect_gitignore |= cli.respect_gitignore;
        self.ignore_patterns.extend(cli.ignore_patterns.iter().cloned());
    }

    /// Render as a TOML document usable as a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Walker configuration derived from these settings.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_skip_hidden(self.skip_hidden)
            .with_exclude_empty(self.exclude_empty)
            .with_min_size(self.min_size)
            .with_max_size(self.max_size)
            .with_ignore_patterns(self.ignore_patterns.clone())
            .with_respect_gitignore(self.respect_gitignore)
    }

    /// Resolver configuration derived from these settings.
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_chunk_size(self.chunk_size)
            .with_jobs(self.jobs)
    }
}
