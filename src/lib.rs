// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shared engineering rules distribution.
//!
//! Rulesync keeps a local cache of a shared __rules repository__ current, and
//! distributes its canonical rules document into any number of target
//! projects. Distribution happens either by full copy (an independent
//! snapshot, frozen at copy time) or by symbolic link (always reflecting the
//! current state of the cache).
//!
//! # Rules Repository
//!
//! The rules repository is an ordinary Git repository whose only contract is
//! that it carries a canonical rules document named [`RULES_DOCUMENT`] at its
//! top-level. Rulesync clones this repository into a local cache directory on
//! first use, and pulls its tracked branch on every subsequent operation.
//! Every other feature of rulesync depends on this cache being current, so
//! synchronization always runs first.
//!
//! # Project Convention
//!
//! Beyond dropping a single copy of the rules document into a project,
//! rulesync can initialize a two-file convention: a nested [`RULES_DIR`]
//! directory holding the shared document (symlinked by preference, copied on
//! request) next to a generated project-specific overlay document. The shared
//! document states rules common to every project, while the overlay states
//! rules that only make sense for one.
//!
//! # Git Hooks
//!
//! To keep deployed copies from drifting, rulesync installs lifecycle hooks
//! (post-checkout, post-merge, post-rewrite, pre-commit) that re-run
//! distribution whenever project history moves. The pre-commit hook also
//! gates commit messages on the Conventional Commits shape.
//!
//! # See Also
//!
//! 1. [Conventional Commits](https://www.conventionalcommits.org/en/v1.0.0/)

pub mod cache;
pub mod commit;
pub mod config;
pub mod deploy;
pub mod hooks;
pub mod init;
pub mod path;
pub mod prompt;
pub mod source;

pub use cache::{RulesCache, SyncError};
pub use commit::validate_message;
pub use config::Settings;
pub use deploy::{BatchOutcome, DeployError, DeployMode, Distributor};
pub use hooks::{install_hooks, install_hooks_batch, HookError};
pub use init::{init_project, InitError};
pub use prompt::{AssumeYes, Confirmation, TerminalConfirmer};
pub use source::{Git2Source, SourceControl};

/// File name of the canonical rules document inside the rules repository.
pub const RULES_DOCUMENT: &str = "RULES.md";

/// Name of the nested rules directory that [`init::init_project`] maintains
/// inside a target project.
pub const RULES_DIR: &str = ".rules";

/// File name of the generated project-specific overlay document.
pub const PROJECT_RULES_DOCUMENT: &str = "PROJECT_RULES.md";
