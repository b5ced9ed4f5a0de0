// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default absolute paths for the rules cache and the rulesync
//! configuration file. Nothing here touches the file system; callers decide
//! whether a returned path needs to be created.

use std::path::PathBuf;

/// Determine default absolute path to the rules cache directory.
///
/// Uses XDG Base Directory path `$XDG_DATA_HOME/rulesync/rules` as the
/// default location of the local rules repository. Does not check if the
/// path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_cache_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join("rulesync").join("rules"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the rulesync configuration file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/rulesync/config.toml`.
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_config_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("rulesync").join("config.toml"))
        .ok_or(NoWayHome)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
