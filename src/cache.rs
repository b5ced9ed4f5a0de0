// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Rules cache synchronization.
//!
//! The __rules cache__ is a local working copy of the upstream rules
//! repository. Every rulesync operation reads the canonical rules document
//! out of this cache, so keeping it current is the mandatory first step of
//! everything the tool does.
//!
//! # Presence States
//!
//! Synchronization is a small state machine over what is already sitting at
//! the cache path:
//!
//! | state            | action                                              |
//! |------------------|-----------------------------------------------------|
//! | absent           | create the path, clone upstream into it             |
//! | present, git     | pull the tracked branch from origin                 |
//! | present, empty   | clone upstream directly into it                     |
//! | present, non-git | clone into a scratch directory, salvage the rules   |
//! |                  | document out of it, discard the scratch clone       |
//!
//! The non-git case exists so that a cache path the user has filled with
//! unrelated files is never destroyed; rulesync only drops the canonical
//! document next to whatever is already there.
//!
//! Concurrent synchronization against the same cache path is not coordinated.
//! One process per cache path is the supported arrangement.

use crate::{
    config::Settings,
    source::{Git2Source, SourceControl, SourceError},
    RULES_DOCUMENT,
};

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Local working copy of the upstream rules repository.
#[derive(Debug)]
pub struct RulesCache<S = Git2Source>
where
    S: SourceControl,
{
    root: PathBuf,
    url: String,
    branch: String,
    source: S,
}

impl RulesCache<Git2Source> {
    /// Construct a cache from user settings, backed by libgit2.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::NoWayHome`] if the cache location cannot be
    ///   resolved.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let root = settings
            .cache_root()
            .map_err(|_| SyncError::NoWayHome(crate::path::NoWayHome))?;

        Ok(Self::new(root, &settings.url, &settings.branch, Git2Source))
    }
}

impl<S> RulesCache<S>
where
    S: SourceControl,
{
    /// Construct a cache against an explicit root and source control client.
    pub fn new(
        root: impl Into<PathBuf>,
        url: impl Into<String>,
        branch: impl Into<String>,
        source: S,
    ) -> Self {
        Self {
            root: root.into(),
            url: url.into(),
            branch: branch.into(),
            source,
        }
    }

    /// Absolute path of the canonical rules document inside the cache.
    pub fn document_path(&self) -> PathBuf {
        self.root.join(RULES_DOCUMENT)
    }

    /// Ensure the cache exists and reflects upstream.
    ///
    /// Performs the presence-state action described in the module docs, then
    /// verifies that the canonical rules document is actually resolvable.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Source`] if clone or pull fails.
    /// - Return [`SyncError::DocumentMissing`] if the canonical document
    ///   still cannot be found after synchronization.
    #[instrument(skip(self), level = "debug")]
    pub fn ensure_current(&self) -> Result<()> {
        match self.presence()? {
            Presence::Absent => {
                info!("rules cache absent, cloning {} fresh", self.url);
                if let Some(parent) = self.root.parent() {
                    mkdirp::mkdirp(parent).map_err(|err| SyncError::CreateDir {
                        source: err,
                        path: parent.to_path_buf(),
                    })?;
                }
                self.source.clone_repo(&self.url, &self.root, &self.branch)?;
            }
            Presence::Git => {
                debug!("rules cache is a repository, pulling {}", self.branch);
                self.source.pull(&self.root, &self.branch)?;
            }
            Presence::Empty => {
                info!("rules cache directory empty, cloning {} into it", self.url);
                self.source.clone_repo(&self.url, &self.root, &self.branch)?;
            }
            Presence::NonGit => {
                warn!(
                    "rules cache {:?} holds unrelated files, salvaging only {}",
                    self.root.display(),
                    RULES_DOCUMENT
                );
                self.salvage_document()?;
            }
        }

        let document = self.document_path();
        if !document.exists() {
            return Err(SyncError::DocumentMissing { path: document });
        }

        Ok(())
    }

    fn presence(&self) -> Result<Presence> {
        if !self.root.exists() {
            return Ok(Presence::Absent);
        }

        if self.source.is_repository(&self.root) {
            return Ok(Presence::Git);
        }

        let mut entries = fs::read_dir(&self.root).map_err(|err| SyncError::Inspect {
            source: err,
            path: self.root.clone(),
        })?;

        if entries.next().is_none() {
            Ok(Presence::Empty)
        } else {
            Ok(Presence::NonGit)
        }
    }

    /// Clone upstream into a scratch directory, and copy only the canonical
    /// rules document into the cache path. The scratch clone is discarded
    /// when the temporary directory drops.
    fn salvage_document(&self) -> Result<()> {
        let scratch = tempfile::tempdir().map_err(|err| SyncError::Scratch { source: err })?;
        let clone_dest = scratch.path().join("rules");
        self.source.clone_repo(&self.url, &clone_dest, &self.branch)?;

        let from = clone_dest.join(RULES_DOCUMENT);
        let to = self.document_path();
        fs::copy(&from, &to).map_err(|err| SyncError::CopyDocument {
            source: err,
            from,
            to,
        })?;

        Ok(())
    }
}

/// Presence state of the cache path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Absent,
    Git,
    Empty,
    NonGit,
}

/// Rules cache synchronization error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Source control operations fail.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Cache location cannot be determined.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),

    /// Cache parent directory cannot be created.
    #[error("cannot create directory {path:?}")]
    CreateDir {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Cache path cannot be inspected.
    #[error("cannot inspect cache path {path:?}")]
    Inspect {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Scratch directory for the salvage clone cannot be created.
    #[error("cannot create scratch directory for clone")]
    Scratch { source: std::io::Error },

    /// Canonical document cannot be copied out of the scratch clone.
    #[error("cannot copy {from:?} to {to:?}")]
    CopyDocument {
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },

    /// Canonical document still missing after synchronization.
    #[error("rules document not found at {path:?} even after synchronization")]
    DocumentMissing { path: PathBuf },
}

/// Friendly result alias :3
type Result<T, E = SyncError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Fake source control client that records calls and materializes a
    /// rules document on clone.
    #[derive(Debug, Default)]
    struct FakeSource {
        calls: RefCell<Vec<String>>,
        repositories: RefCell<Vec<PathBuf>>,
    }

    impl FakeSource {
        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl SourceControl for &FakeSource {
        fn clone_repo(&self, url: &str, dest: &Path, _branch: &str) -> Result<(), SourceError> {
            self.calls.borrow_mut().push(format!("clone {url}"));
            fs::create_dir_all(dest).unwrap();
            fs::write(dest.join(RULES_DOCUMENT), "# rules\n").unwrap();
            self.repositories.borrow_mut().push(dest.to_path_buf());
            Ok(())
        }

        fn pull(&self, path: &Path, branch: &str) -> Result<(), SourceError> {
            self.calls
                .borrow_mut()
                .push(format!("pull {branch} {}", path.display()));
            Ok(())
        }

        fn is_repository(&self, path: &Path) -> bool {
            self.repositories.borrow().iter().any(|p| p == path)
        }
    }

    #[test]
    fn absent_cache_is_cloned() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("cache").join("rules");
        let source = FakeSource::default();
        let cache = RulesCache::new(&root, "https://blah.org/rules.git", "main", &source);

        cache.ensure_current()?;

        assert_eq!(source.calls(), vec!["clone https://blah.org/rules.git"]);
        assert!(cache.document_path().exists());

        Ok(())
    }

    #[test]
    fn present_git_cache_is_pulled() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("rules");
        let source = FakeSource::default();
        let cache = RulesCache::new(&root, "https://blah.org/rules.git", "main", &source);

        cache.ensure_current()?;
        cache.ensure_current()?;

        assert_eq!(
            source.calls(),
            vec![
                "clone https://blah.org/rules.git".to_string(),
                format!("pull main {}", root.display()),
            ]
        );

        Ok(())
    }

    #[test]
    fn empty_cache_directory_is_cloned_into() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("rules");
        fs::create_dir_all(&root)?;
        let source = FakeSource::default();
        let cache = RulesCache::new(&root, "https://blah.org/rules.git", "main", &source);

        cache.ensure_current()?;

        assert_eq!(source.calls(), vec!["clone https://blah.org/rules.git"]);
        assert!(cache.document_path().exists());

        Ok(())
    }

    #[test]
    fn non_git_cache_salvages_document_only() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("rules");
        fs::create_dir_all(&root)?;
        fs::write(root.join("unrelated.txt"), "keep me")?;
        let source = FakeSource::default();
        let cache = RulesCache::new(&root, "https://blah.org/rules.git", "main", &source);

        cache.ensure_current()?;

        // Clone went to a scratch path, not the cache root.
        assert!(!source.repositories.borrow().iter().any(|p| p == &root));
        assert!(cache.document_path().exists());
        assert_eq!(fs::read_to_string(root.join("unrelated.txt"))?, "keep me");

        Ok(())
    }

    #[test]
    fn missing_document_after_sync_is_an_error() {
        #[derive(Debug)]
        struct EmptyClone;

        impl SourceControl for EmptyClone {
            fn clone_repo(
                &self,
                _url: &str,
                dest: &Path,
                _branch: &str,
            ) -> Result<(), SourceError> {
                fs::create_dir_all(dest).unwrap();
                Ok(())
            }

            fn pull(&self, _path: &Path, _branch: &str) -> Result<(), SourceError> {
                Ok(())
            }

            fn is_repository(&self, _path: &Path) -> bool {
                false
            }
        }

        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("rules");
        let cache = RulesCache::new(&root, "https://blah.org/rules.git", "main", EmptyClone);

        let result = cache.ensure_current();
        assert!(matches!(result, Err(SyncError::DocumentMissing { .. })));
    }
}
