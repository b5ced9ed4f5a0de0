// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Rules document distribution.
//!
//! Distribution materializes the canonical rules document inside a target
//! project, either as a full copy or as a symbolic link back into the rules
//! cache. A copy is an independent snapshot frozen at copy time; a link
//! always reflects the current cache content.
//!
//! # Pre-Existing Artifacts
//!
//! A target may already hold a rules artifact from an earlier deployment, or
//! a hand-written file the user cares about. Every overwrite path runs
//! through the same state machine:
//!
//! - absent: materialize, no questions asked.
//! - symbolic link to the canonical document, symlink mode: already
//!   satisfied, no prompt, no mutation.
//! - any other pre-existing artifact: ask first. Declining cancels the
//!   deployment and leaves the artifact byte-for-byte untouched. Accepting
//!   backs up a regular file to a `.backup` sibling before overwriting;
//!   symbolic links are not backed up, only removed.

use crate::{prompt::Confirmation, RULES_DOCUMENT};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// How the rules document should be materialized in a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    /// Independent byte-for-byte snapshot, frozen at copy time.
    Copy,

    /// Symbolic link that always reflects current cache content.
    Symlink,
}

impl Display for DeployMode {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Copy => fmt.write_str("copy"),
            Self::Symlink => fmt.write_str("symlink"),
        }
    }
}

/// Aggregate outcome of a batch operation.
///
/// Batch operations never fail fast; one bad target does not stop the rest.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub fail_count: usize,
}

impl BatchOutcome {
    /// Record one successful target.
    pub fn succeed(&mut self) {
        self.success_count += 1;
    }

    /// Record one failed target.
    pub fn fail(&mut self) {
        self.fail_count += 1;
    }

    /// Check if any target failed.
    pub fn has_failures(&self) -> bool {
        self.fail_count != 0
    }
}

impl Display for BatchOutcome {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "{} succeeded, {} failed",
            self.success_count, self.fail_count
        )
    }
}

/// Distributor of the canonical rules document.
#[derive(Debug)]
pub struct Distributor<C>
where
    C: Confirmation,
{
    document: PathBuf,
    confirm: C,
}

impl<C> Distributor<C>
where
    C: Confirmation,
{
    /// Construct a distributor for the canonical document at `document`.
    ///
    /// The document path should be absolute; it becomes the target of every
    /// symbolic link this distributor creates.
    pub fn new(document: impl Into<PathBuf>, confirm: C) -> Self {
        Self {
            document: document.into(),
            confirm,
        }
    }

    /// Deploy the rules document into one target project directory.
    ///
    /// The artifact lands at `<target_dir>/RULES.md`. See the module docs for
    /// how pre-existing artifacts are handled.
    ///
    /// # Errors
    ///
    /// - Return [`DeployError::MissingTarget`] if `target_dir` is not a
    ///   directory.
    /// - Return [`DeployError::Cancelled`] if the user declines to replace a
    ///   pre-existing artifact.
    /// - Return [`DeployError::Backup`] or [`DeployError::Write`] if file
    ///   system mutation fails.
    #[instrument(skip(self, target_dir), level = "debug")]
    pub fn deploy_into(&self, target_dir: &Path, mode: DeployMode) -> Result<()> {
        if !target_dir.is_dir() {
            return Err(DeployError::MissingTarget {
                path: target_dir.to_path_buf(),
            });
        }

        let target = target_dir.join(RULES_DOCUMENT);
        match artifact_state(&target, &self.document) {
            ArtifactState::Absent => {
                materialize(&self.document, &target, mode)?;
                info!("{mode} deployed rules into {:?}", target_dir.display());
            }
            ArtifactState::LinkToCanonical if mode == DeployMode::Symlink => {
                debug!("{:?} already links to the rules cache", target.display());
            }
            state => {
                self.replace(&target, state, mode)?;
                info!("{mode} replaced rules artifact in {:?}", target_dir.display());
            }
        }

        Ok(())
    }

    /// Deploy the rules document into many target project directories.
    ///
    /// Targets are processed strictly in sequence, and one target's failure
    /// never aborts the rest; failures are counted, logged, and moved past.
    pub fn deploy_batch(
        &self,
        target_dirs: impl IntoIterator<Item = impl AsRef<Path>>,
        mode: DeployMode,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for target_dir in target_dirs {
            let target_dir = target_dir.as_ref();
            match self.deploy_into(target_dir, mode) {
                Ok(()) => outcome.succeed(),
                Err(error) => {
                    warn!("✗ {:?}: {error}", target_dir.display());
                    outcome.fail();
                }
            }
        }

        outcome
    }

    /// Replace a pre-existing artifact after confirmation.
    fn replace(&self, target: &Path, state: ArtifactState, mode: DeployMode) -> Result<()> {
        let question = format!(
            "replace existing rules artifact at {:?}?",
            target.display()
        );
        if !self.confirm.confirm(&question)? {
            return Err(DeployError::Cancelled {
                path: target.to_path_buf(),
            });
        }

        match state {
            // Symbolic links carry no content of their own, so there is
            // nothing worth backing up.
            ArtifactState::LinkToCanonical | ArtifactState::LinkElsewhere => {
                remove_artifact(target)?;
            }
            ArtifactState::File => {
                back_up(target)?;
                remove_artifact(target)?;
            }
            ArtifactState::Absent => {}
        }

        materialize(&self.document, target, mode)
    }
}

/// State of a would-be artifact path relative to the canonical document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArtifactState {
    Absent,
    LinkToCanonical,
    LinkElsewhere,
    File,
}

/// Classify what currently sits at `path`.
pub(crate) fn artifact_state(path: &Path, canonical: &Path) -> ArtifactState {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return ArtifactState::Absent;
    };

    if !metadata.file_type().is_symlink() {
        return ArtifactState::File;
    }

    match fs::read_link(path) {
        Ok(destination) if destination == canonical => ArtifactState::LinkToCanonical,
        _ => ArtifactState::LinkElsewhere,
    }
}

/// Materialize the canonical document at `target` in the requested mode.
///
/// Assumes nothing sits at `target`; callers clear the path first.
pub(crate) fn materialize(document: &Path, target: &Path, mode: DeployMode) -> Result<()> {
    match mode {
        DeployMode::Copy => {
            fs::copy(document, target).map_err(|err| DeployError::Write {
                source: err,
                path: target.to_path_buf(),
            })?;
        }
        DeployMode::Symlink => {
            symlink(document, target).map_err(|err| DeployError::Write {
                source: err,
                path: target.to_path_buf(),
            })?;
        }
    }

    Ok(())
}

/// Copy a pre-existing artifact to its `.backup` sibling.
///
/// Backups are never pruned automatically; a later backup of the same
/// artifact overwrites the previous one.
pub(crate) fn back_up(target: &Path) -> Result<()> {
    let backup = backup_path(target);
    fs::copy(target, &backup).map_err(|err| DeployError::Backup {
        source: err,
        path: backup.clone(),
    })?;
    info!("backed up {:?} to {:?}", target.display(), backup.display());

    Ok(())
}

/// Determine the `.backup` sibling path of an artifact.
pub(crate) fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

fn remove_artifact(target: &Path) -> Result<()> {
    fs::remove_file(target).map_err(|err| DeployError::Write {
        source: err,
        path: target.to_path_buf(),
    })
}

#[cfg(unix)]
fn symlink(document: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(document, target)
}
#[cfg(windows)]
fn symlink(document: &Path, target: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(document, target)
}

/// Distribution error types.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Target project directory does not exist.
    #[error("target directory {path:?} does not exist")]
    MissingTarget { path: PathBuf },

    /// User declined to replace a pre-existing artifact.
    #[error("deployment to {path:?} cancelled")]
    Cancelled { path: PathBuf },

    /// Pre-existing artifact cannot be backed up.
    #[error("cannot write backup {path:?}")]
    Backup {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Artifact cannot be written.
    #[error("cannot write rules artifact {path:?}")]
    Write {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Confirmation prompt fails.
    #[error(transparent)]
    Prompt(#[from] crate::prompt::PromptError),
}

/// Friendly result alias :3
type Result<T, E = DeployError> = std::result::Result<T, E>;
