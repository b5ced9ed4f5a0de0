// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Source control capability.
//!
//! Rulesync only needs three things from a version control system: clone a
//! repository, pull a tracked branch, and answer whether a directory is a
//! repository at all. This seam keeps the synchronization state machine in
//! [`crate::cache`] agnostic of how those operations are carried out, and
//! lets tests substitute a fake that never touches the network.

use auth_git2::{GitAuthenticator, Prompter};
use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    Config, FetchOptions, RemoteCallbacks, Repository,
};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    path::{Path, PathBuf},
    time,
};
use tracing::{debug, info, instrument};

/// Layer of indirection for version control operations.
pub trait SourceControl {
    /// Clone repository at `url` into `dest`, checking out `branch`.
    fn clone_repo(&self, url: &str, dest: &Path, branch: &str) -> Result<()>;

    /// Pull `branch` from the "origin" remote of the repository at `path`.
    fn pull(&self, path: &Path, branch: &str) -> Result<()>;

    /// Check if `path` holds a repository.
    fn is_repository(&self, path: &Path) -> bool;
}

/// Source control through libgit2.
///
/// Clones display an indicatif progress bar, and any credentials the remote
/// demands are prompted for through the terminal with the progress bar
/// suspended for the duration of the prompt.
#[derive(Debug, Default)]
pub struct Git2Source;

impl SourceControl for Git2Source {
    /// Clone repository at `url` into `dest`, checking out `branch`.
    ///
    /// # Errors
    ///
    /// - Return [`SourceError::Git2`] if libgit2 operations fail.
    /// - Return [`SourceError::IndicatifStyleTemplate`] if the progress bar
    ///   style cannot be constructed.
    #[instrument(skip(self, url, dest), level = "debug")]
    fn clone_repo(&self, url: &str, dest: &Path, branch: &str) -> Result<()> {
        info!("clone {url} into {:?}", dest.display());
        let bar = ProgressBar::no_length();
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        bar.set_style(style);
        bar.set_message(url.to_string());
        bar.enable_steady_tick(time::Duration::from_millis(100));

        let prompter = SuspendedBarPrompter::new(bar);
        let authenticator = GitAuthenticator::default().set_prompter(prompter.clone());
        let config = Config::open_default()?;

        let mut throttle = time::Instant::now();
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));
        rc.transfer_progress(|progress| {
            let stats = progress.to_owned();
            let bar_size = stats.total_objects() as u64;
            let bar_pos = stats.received_objects() as u64;
            if throttle.elapsed() > time::Duration::from_millis(10) {
                throttle = time::Instant::now();
                prompter.bar.set_length(bar_size);
                prompter.bar.set_position(bar_pos);
            }
            true
        });

        let mut fo = FetchOptions::new();
        fo.remote_callbacks(rc);
        RepoBuilder::new()
            .branch(branch)
            .fetch_options(fo)
            .clone(url, dest)?;

        Ok(())
    }

    /// Pull `branch` from the "origin" remote of the repository at `path`.
    ///
    /// Only fast-forward updates are performed. The rules repository is a
    /// read-only mirror from rulesync's point of view, so a local history
    /// that diverged from upstream is reported as an error rather than
    /// merged.
    ///
    /// # Errors
    ///
    /// - Return [`SourceError::Git2`] if libgit2 operations fail.
    /// - Return [`SourceError::Diverged`] if the local branch cannot be
    ///   fast-forwarded to the fetched upstream tip.
    #[instrument(skip(self, path), level = "debug")]
    fn pull(&self, path: &Path, branch: &str) -> Result<()> {
        debug!("pull {branch} into {:?}", path.display());
        let repo = Repository::open(path)?;
        let mut remote = repo.find_remote("origin")?;

        let authenticator = GitAuthenticator::default();
        let config = Config::open_default()?;
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));
        let mut fo = FetchOptions::new();
        fo.remote_callbacks(rc);
        remote.fetch(&[branch], Some(&mut fo), None)?;

        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

        if analysis.is_up_to_date() {
            debug!("{:?} already up to date", path.display());
            return Ok(());
        }

        if !analysis.is_fast_forward() {
            return Err(SourceError::Diverged {
                path: path.to_path_buf(),
            });
        }

        let refname = format!("refs/heads/{branch}");
        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(fetch_commit.id(), "rulesync: fast-forward")?;
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
        info!("fast-forwarded {:?} to upstream tip", path.display());

        Ok(())
    }

    fn is_repository(&self, path: &Path) -> bool {
        Repository::open(path).is_ok()
    }
}

/// Git2 authentication prompter that suspends a progress bar.
#[derive(Debug, Clone)]
struct SuspendedBarPrompter {
    pub(crate) bar: ProgressBar,
}

impl SuspendedBarPrompter {
    fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for SuspendedBarPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| -> Option<String> {
            Password::new("password").without_confirmation().prompt().ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| -> Option<String> {
            Password::new("password").without_confirmation().prompt().ok()
        })
    }
}

/// Source control error types.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Local rules repository history diverged from upstream.
    #[error("rules repository at {path:?} diverged from upstream; refusing to merge")]
    Diverged { path: PathBuf },
}

/// Friendly result alias :3
type Result<T, E = SourceError> = std::result::Result<T, E>;
