// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git hook installation.
//!
//! Rulesync keeps deployed rules current by wiring itself into a project's
//! git lifecycle: post-checkout, post-merge, and post-rewrite re-run a
//! single-project deployment, and pre-commit additionally gates the commit
//! message through `rulesync check-commit`.
//!
//! Hook scripts are fixed templates whose single free variable is the
//! repository root, resolved at run time through `git rev-parse`. No path is
//! baked in at install time, so hooks stay valid when the project is moved
//! or operated on from a nested working directory. Installation is
//! idempotent: re-running it rewrites byte-identical scripts.

use crate::deploy::BatchOutcome;

use ignore::WalkBuilder;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Lifecycle points rulesync hooks into.
const HOOK_NAMES: [&str; 4] = ["post-checkout", "post-merge", "post-rewrite", "pre-commit"];

/// Directory names that never contain projects worth hooking.
const SKIP_DIRS: [&str; 3] = ["node_modules", "target", "vendor"];

/// Script installed for post-checkout, post-merge, and post-rewrite.
///
/// Deployment failures are swallowed: a hook that blocks a checkout over a
/// network hiccup would be worse than stale rules.
const RESYNC_HOOK: &str = "\
#!/bin/sh
# Installed by rulesync. Re-deploy shared rules after history moves.
root=\"$(git rev-parse --show-toplevel 2>/dev/null)\" || exit 0
rulesync --yes apply \"$root\" >/dev/null 2>&1 || true
exit 0
";

/// Script installed for pre-commit.
///
/// Re-deploys like the other hooks, then hands the commit message over to
/// `rulesync check-commit`, whose exit status decides the commit's fate.
/// Bypassable with `git commit --no-verify`.
const PRE_COMMIT_HOOK: &str = "\
#!/bin/sh
# Installed by rulesync. Re-deploy shared rules and gate the commit message.
root=\"$(git rev-parse --show-toplevel 2>/dev/null)\" || exit 0
rulesync --yes apply \"$root\" >/dev/null 2>&1 || true
gitdir=\"$(git rev-parse --git-dir)\"
exec rulesync check-commit \"$gitdir/COMMIT_EDITMSG\"
";

/// Install the rulesync hook set into one target project.
///
/// # Errors
///
/// - Return [`HookError::NotARepository`] if `target_dir` has no `.git`.
/// - Return [`HookError::Write`] if a hook script cannot be written or
///   marked executable.
#[instrument(skip(target_dir), level = "debug")]
pub fn install_hooks(target_dir: &Path) -> Result<()> {
    let git_dir = target_dir.join(".git");
    if !git_dir.exists() {
        return Err(HookError::NotARepository {
            path: target_dir.to_path_buf(),
        });
    }

    let hook_dir = git_dir.join("hooks");
    mkdirp::mkdirp(&hook_dir).map_err(|err| HookError::Write {
        source: err,
        path: hook_dir.clone(),
    })?;

    for name in HOOK_NAMES {
        let path = hook_dir.join(name);
        fs::write(&path, hook_script(name)).map_err(|err| HookError::Write {
            source: err,
            path: path.clone(),
        })?;
        mark_executable(&path).map_err(|err| HookError::Write {
            source: err,
            path: path.clone(),
        })?;
        debug!("wrote hook {:?}", path.display());
    }

    info!("installed hook set into {:?}", target_dir.display());

    Ok(())
}

/// Install the rulesync hook set into every repository under `base_dir`.
///
/// Discovery walks the directory tree while skipping hidden trees and
/// dependency caches ([`SKIP_DIRS`]). Each discovered repository is handled
/// independently; one failure never aborts the rest.
///
/// # Errors
///
/// - Return [`HookError::Walk`] if the directory walk itself cannot start.
pub fn install_hooks_batch(base_dir: &Path) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    for root in discover_repositories(base_dir)? {
        match install_hooks(&root) {
            Ok(()) => outcome.succeed(),
            Err(error) => {
                warn!("✗ {:?}: {error}", root.display());
                outcome.fail();
            }
        }
    }

    Ok(outcome)
}

/// Discover every repository root under `base_dir`.
fn discover_repositories(base_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut roots = Vec::new();
    let walk = WalkBuilder::new(base_dir)
        .follow_links(false)
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| !SKIP_DIRS.contains(&name))
                .unwrap_or(true)
        })
        .build();

    for entry in walk {
        let entry = entry.map_err(HookError::Walk)?;
        let path = entry.path();
        if path.is_dir() && path.join(".git").exists() {
            roots.push(path.to_path_buf());
        }
    }

    Ok(roots)
}

fn hook_script(name: &str) -> &'static str {
    match name {
        "pre-commit" => PRE_COMMIT_HOOK,
        _ => RESYNC_HOOK,
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}
#[cfg(windows)]
fn mark_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Hook installation error types.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Target project has no version control metadata.
    #[error("{path:?} is not a git repository")]
    NotARepository { path: PathBuf },

    /// Hook script cannot be written.
    #[error("cannot write hook {path:?}")]
    Write {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Repository discovery walk fails.
    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

/// Friendly result alias :3
type Result<T, E = HookError> = std::result::Result<T, E>;
