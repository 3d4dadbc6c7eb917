//! CLI Configuration
//!
//! Two layers:
//! - [`Settings`]: the JSON file written by `volley login`
//!   (`$XDG_CONFIG_HOME/volley/config.json` or `~/.config/volley/config.json`).
//! - [`Config`]: the resolved runtime configuration, built once in `main` from
//!   flags, environment and the settings file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::api::DEFAULT_API_URL;

/// Fallback file when no home directory can be determined.
const FALLBACK_CONFIG_FILE: &str = ".volley-config.json";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted CLI settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub token: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl Settings {
    /// Load settings from `path`. A missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    debug!(path = %path.display(), error = %e, "Failed to read config file");
                }
                return Self::default();
            }
        };

        serde_json::from_slice(&data).unwrap_or_else(|e| {
            debug!(path = %path.display(), error = %e, "Ignoring invalid config file");
            Self::default()
        })
    }

    /// Write settings to `path`, creating parent directories.
    ///
    /// On Unix the file is restricted to the owner (0600).
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }

        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data).map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }

        Ok(())
    }

    /// Stored token, if any.
    pub fn token(&self) -> Option<&str> {
        Some(self.token.as_str()).filter(|t| !t.is_empty())
    }
}

/// Default location of the settings file.
///
/// `$XDG_CONFIG_HOME/volley/config.json` when set; otherwise
/// `~/.config/volley/config.json` (`%APPDATA%\volley\config.json` on Windows).
pub fn default_config_path() -> PathBuf {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(config_home).join("volley").join("config.json");
    }

    let base = if cfg!(windows) {
        dirs::config_dir()
    } else {
        dirs::home_dir().map(|home| home.join(".config"))
    };

    base.map_or_else(
        || PathBuf::from(FALLBACK_CONFIG_FILE),
        |dir| dir.join("volley").join("config.json"),
    )
}

/// Whether `url` points at the local machine.
fn is_local_url(url: &str) -> bool {
    url.contains("localhost") || url.contains("127.0.0.1")
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    pub verbose: bool,
    pub config_path: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Resolve configuration.
    ///
    /// API URL precedence: `api_url` argument (flag or `VOLLEY_API_URL`), then
    /// the settings file unless it points at localhost, then the production
    /// default. A local API must be requested explicitly.
    pub fn resolve(
        api_url: Option<String>,
        api_key: Option<String>,
        config_path: Option<PathBuf>,
        verbose: bool,
    ) -> Self {
        let config_path = config_path.unwrap_or_else(default_config_path);
        let settings = Settings::load(&config_path);

        let api_url = api_url
            .filter(|u| !u.is_empty())
            .or_else(|| {
                settings
                    .api_url
                    .clone()
                    .filter(|u| !u.is_empty() && !is_local_url(u))
            })
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            api_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            verbose,
            config_path,
            settings,
        }
    }

    /// Bearer credential: an explicit API key wins over the stored token.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().or_else(|| self.settings.token())
    }

    /// Persist `settings` to the configured path and keep them in memory.
    pub fn save_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        settings.save(&self.config_path)?;
        self.settings = settings;
        Ok(())
    }
}
