// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Commit message validation.
//!
//! The pre-commit hook gates commit messages on the Conventional Commits
//! shape: `<type>(<scope>): <description>` with a fixed set of types, an
//! optional lowercase scope, and a description of at most 100 characters.
//! Merge commits are exempt, and a missing message file passes outright so
//! the hook never blocks workflows that write the message later than the
//! hook runs.
//!
//! # See Also
//!
//! 1. [Conventional Commits](https://www.conventionalcommits.org/en/v1.0.0/)

use regex::Regex;
use std::{fs::read_to_string, path::Path, sync::LazyLock};
use tracing::debug;

/// Shape of an acceptable commit subject line.
static SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(feat|fix|docs|style|refactor|perf|test|chore|build|ci|revert)(\([a-z0-9-]+\))?: .{1,100}$",
    )
    .expect("subject pattern must compile")
});

/// Guidance printed alongside every rejection.
pub const GUIDANCE: &str = "\
commit message must follow the Conventional Commits shape:

  <type>(<optional-scope>): <description>

  type:        feat fix docs style refactor perf test chore build ci revert
  scope:       lowercase letters, digits, and hyphens
  description: 1 to 100 characters

examples:

  feat(auth): add login endpoint
  fix: correct response code

bypass with `git commit --no-verify` if you must.";

/// Validate a full commit message.
///
/// Only the subject (first) line is inspected. Messages beginning with
/// `Merge` are exempted unconditionally, since git writes those itself.
///
/// # Errors
///
/// - Return [`CommitError::Malformed`] if the subject line does not match
///   the required shape.
pub fn validate_message(message: &str) -> Result<()> {
    let subject = message.lines().next().unwrap_or_default();
    if subject.starts_with("Merge") {
        debug!("merge commit subject, exempt from validation");
        return Ok(());
    }

    if SUBJECT.is_match(subject) {
        Ok(())
    } else {
        Err(CommitError::Malformed {
            subject: subject.to_string(),
        })
    }
}

/// Validate the commit message stored in `path`.
///
/// A missing file is a pass-through: the hook runs before some git workflows
/// have written the message file at all, and rejecting those would make the
/// gate unusable.
///
/// # Errors
///
/// - Return [`CommitError::Malformed`] if the stored subject line does not
///   match the required shape.
pub fn validate_message_file(path: &Path) -> Result<()> {
    let Ok(message) = read_to_string(path) else {
        debug!("no commit message at {:?}, passing through", path.display());
        return Ok(());
    };

    validate_message(&message)
}

/// Commit message validation error types.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// Subject line does not follow the required shape.
    #[error("rejected commit subject {subject:?}\n\n{GUIDANCE}")]
    Malformed { subject: String },
}

/// Friendly result alias :3
type Result<T, E = CommitError> = std::result::Result<T, E>;
