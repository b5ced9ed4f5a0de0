// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the rulesync configuration file to simplify the
//! process of serialization and deserialization. The configuration is a flat
//! set of settings: where the shared rules repository lives upstream, which
//! branch to track, and where to keep the local cache. Every field has a
//! sensible default, so a configuration file is optional.

use crate::path::{default_cache_dir, default_config_file};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::PathBuf,
    str::FromStr,
};

/// Rulesync configuration settings.
///
/// Deserialized from `$XDG_CONFIG_HOME/rulesync/config.toml` when that file
/// exists, otherwise constructed from defaults. The cache directory is kept
/// optional in the layout so that a partial configuration file can override
/// the upstream URL without pinning the cache location.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// URL of the upstream rules repository to clone and pull from.
    #[serde(default = "default_url")]
    pub url: String,

    /// Branch of the upstream rules repository to track.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Local cache directory holding the working copy of the rules
    /// repository. Defaults to `$XDG_DATA_HOME/rulesync/rules`.
    pub cache_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default configuration file location.
    ///
    /// A missing configuration file is not an error; defaults are used
    /// instead.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Deserialize`] if configuration parsing fails.
    /// - Return [`ConfigError::NoWayHome`] if the configuration file location
    ///   cannot be determined.
    pub fn load() -> Result<Self> {
        let path = default_config_file()?;
        match read_to_string(&path) {
            Ok(data) => data.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Resolve the cache directory, falling back to the XDG default.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoWayHome`] if no explicit cache directory is
    ///   set and the default location cannot be determined.
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(path) => Ok(path.clone()),
            None => Ok(default_cache_dir()?),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: default_url(),
            branch: default_branch(),
            cache_dir: None,
        }
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on cache directory field.
        if let Some(cache_dir) = settings.cache_dir {
            let expanded = shellexpand::full(cache_dir.to_string_lossy().as_ref())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned();
            settings.cache_dir = Some(PathBuf::from(expanded));
        }

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn default_url() -> String {
    "https://github.com/awkless/rules.git".into()
}

fn default_branch() -> String {
    "main".into()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Failed to determine configuration file location.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
