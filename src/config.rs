// src/config.rs

//! User configuration
//!
//! Read from `$XDG_CONFIG_HOME/slurpy/config.toml`, falling back to
//! `~/.slurpy.toml`. Every key is optional:
//!
//! ```toml
//! aur_url = "https://aur.archlinux.org"
//! target_dir = "~/aur"
//! color = true
//! verbose = 1
//! pacman_conf = "/etc/pacman.conf"
//! sync_dir = "/var/lib/pacman/sync"
//! repos = ["core", "extra"]
//! timeout_secs = 30
//! ```

use crate::error::{Error, Result};
use crate::repository::DEFAULT_AUR_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// AUR base URL
    pub aur_url: String,

    /// Where packages are unpacked
    pub target_dir: PathBuf,

    /// Colored output
    pub color: bool,

    /// Verbosity level, same as repeating `-v`
    pub verbose: u8,

    /// pacman configuration listing the sync repositories
    pub pacman_conf: PathBuf,

    /// pacman sync database directory
    pub sync_dir: PathBuf,

    /// Sync repositories to consult, overriding pacman.conf
    pub repos: Option<Vec<String>>,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aur_url: DEFAULT_AUR_URL.to_string(),
            target_dir: PathBuf::from("."),
            color: false,
            verbose: 0,
            pacman_conf: PathBuf::from("/etc/pacman.conf"),
            sync_dir: PathBuf::from("/var/lib/pacman/sync"),
            repos: None,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default locations are
    /// tried in order and defaults are used if none exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match default_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::load_from(&path),
                None => {
                    debug!("No configuration file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse TOML configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        config.target_dir = expand_tilde(&config.target_dir);
        config.pacman_conf = expand_tilde(&config.pacman_conf);
        config.sync_dir = expand_tilde(&config.sync_dir);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.aur_url.starts_with("http://") || self.aur_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "aur_url must be an http(s) URL, got '{}'",
                self.aur_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Candidate configuration files, most preferred first
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("slurpy").join("config.toml"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".slurpy.toml"));
    }
    paths
}

/// Replace a leading `~` with the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
