// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project rules convention initialization.
//!
//! Initialization builds a two-file convention inside a target project: a
//! nested `.rules/` directory containing the shared rules document (linked
//! by preference so it tracks the cache, copied on request) next to a
//! generated project-specific overlay document. The overlay comes from a
//! fixed template parameterized only by the project name; rulesync never
//! grows a general templating engine for it.
//!
//! Each step that would clobber something the user already has is gated by
//! its own confirmation, and declining any of them is non-fatal: the
//! initializer keeps going and still reports success as long as the shared
//! document ends up materialized.

use crate::{
    deploy::{artifact_state, back_up, materialize, ArtifactState, DeployError, DeployMode},
    prompt::Confirmation,
    PROJECT_RULES_DOCUMENT, RULES_DIR, RULES_DOCUMENT,
};

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Fixed template for the project-specific overlay document.
///
/// The single parameter is the project name, derived from the base name of
/// the target directory.
const PROJECT_RULES_TEMPLATE: &str = "\
# {{project}} Rules

Project-specific rules for {{project}}. These extend the shared rules in
RULES.md; where the two disagree, this document wins.

## Architecture

- <record project-specific architectural rules here>

## Conventions

- <record project-specific naming and layout conventions here>
";

/// Initialize the rules convention inside one target project.
///
/// # Errors
///
/// - Return [`InitError::MissingTarget`] if `target_dir` is not a directory.
/// - Return [`InitError::CreateDir`] if the nested rules directory cannot be
///   created.
/// - Return [`InitError::Template`] if the overlay document cannot be
///   written.
/// - Return [`InitError::Deploy`] if the shared document cannot be
///   materialized.
#[instrument(skip(document, target_dir, confirm), level = "debug")]
pub fn init_project(
    document: &Path,
    target_dir: &Path,
    confirm: &impl Confirmation,
) -> Result<()> {
    if !target_dir.is_dir() {
        return Err(InitError::MissingTarget {
            path: target_dir.to_path_buf(),
        });
    }

    let rules_dir = target_dir.join(RULES_DIR);
    mkdirp::mkdirp(&rules_dir).map_err(|err| InitError::CreateDir {
        source: err,
        path: rules_dir.clone(),
    })?;

    write_overlay(&rules_dir, project_name(target_dir).as_str(), confirm)?;
    materialize_shared(document, &rules_dir, confirm)?;

    info!(
        "initialized rules convention in {:?}",
        target_dir.display()
    );

    Ok(())
}

/// Generate the overlay document, asking before replacing an existing one.
///
/// Declining the replacement leaves the existing overlay untouched and is
/// not an error.
fn write_overlay(rules_dir: &Path, project: &str, confirm: &impl Confirmation) -> Result<()> {
    let overlay = rules_dir.join(PROJECT_RULES_DOCUMENT);
    if overlay.exists() {
        let question = format!("replace existing {:?}?", overlay.display());
        if !confirm.confirm(&question).map_err(DeployError::from)? {
            debug!("keeping existing overlay {:?}", overlay.display());
            return Ok(());
        }

        back_up(&overlay)?;
    }

    let content = PROJECT_RULES_TEMPLATE.replace("{{project}}", project);
    fs::write(&overlay, content).map_err(|err| InitError::Template {
        source: err,
        path: overlay.clone(),
    })?;
    info!("generated overlay {:?}", overlay.display());

    Ok(())
}

/// Materialize the shared rules document inside the nested rules directory.
///
/// An existing symbolic link is treated as current regardless of mode. An
/// existing regular file is refreshed in place after confirmation. When
/// nothing is there yet, the user chooses between a symbolic link
/// (preferred, auto-updating) and an independent copy.
fn materialize_shared(
    document: &Path,
    rules_dir: &Path,
    confirm: &impl Confirmation,
) -> Result<()> {
    let target = rules_dir.join(RULES_DOCUMENT);
    match artifact_state(&target, document) {
        ArtifactState::LinkToCanonical | ArtifactState::LinkElsewhere => {
            debug!("{:?} already linked, leaving as is", target.display());
        }
        ArtifactState::File => {
            let question = format!(
                "update existing copy at {:?} from the rules cache?",
                target.display()
            );
            if confirm.confirm(&question).map_err(DeployError::from)? {
                back_up(&target)?;
                materialize(document, &target, DeployMode::Copy)?;
            }
        }
        ArtifactState::Absent => {
            let question = format!(
                "symlink shared rules into {:?} (recommended; answering no copies instead)?",
                rules_dir.display()
            );
            let mode = if confirm.confirm(&question).map_err(DeployError::from)? {
                DeployMode::Symlink
            } else {
                DeployMode::Copy
            };
            materialize(document, &target, mode)?;
        }
    }

    Ok(())
}

/// Derive the project name from the base name of the target directory.
fn project_name(target_dir: &Path) -> String {
    let resolved = fs::canonicalize(target_dir).unwrap_or_else(|_| target_dir.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".into())
}

/// Initialization error types.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// Target project directory does not exist.
    #[error("target directory {path:?} does not exist")]
    MissingTarget { path: PathBuf },

    /// Nested rules directory cannot be created.
    #[error("cannot create rules directory {path:?}")]
    CreateDir {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Overlay document cannot be generated from the template.
    #[error("cannot generate overlay document {path:?}")]
    Template {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Shared document distribution fails.
    #[error(transparent)]
    Deploy(#[from] DeployError),
}

/// Friendly result alias :3
type Result<T, E = InitError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{doubles::DeclineAll, AssumeYes};
    use pretty_assertions::assert_eq;
    use std::fs::{read_to_string, write};

    struct Fixture {
        _temp: tempfile::TempDir,
        document: PathBuf,
        project: PathBuf,
    }

    impl Fixture {
        fn new() -> anyhow::Result<Self> {
            let temp = tempfile::tempdir()?;
            let document = temp.path().join(RULES_DOCUMENT);
            write(&document, "# canonical rules\n")?;
            let project = temp.path().join("widget");
            fs::create_dir(&project)?;

            Ok(Self {
                _temp: temp,
                document,
                project,
            })
        }

        fn rules_dir(&self) -> PathBuf {
            self.project.join(RULES_DIR)
        }
    }

    #[test]
    fn builds_two_file_convention() -> anyhow::Result<()> {
        let fixture = Fixture::new()?;

        init_project(&fixture.document, &fixture.project, &AssumeYes)?;

        let overlay = read_to_string(fixture.rules_dir().join(PROJECT_RULES_DOCUMENT))?;
        assert!(overlay.starts_with("# widget Rules"));
        assert!(!overlay.contains("{{project}}"));

        let shared = fixture.rules_dir().join(RULES_DOCUMENT);
        assert_eq!(fs::read_link(&shared)?, fixture.document);

        Ok(())
    }

    #[test]
    fn declining_overlay_replacement_is_not_fatal() -> anyhow::Result<()> {
        let fixture = Fixture::new()?;
        fs::create_dir(fixture.rules_dir())?;
        let overlay = fixture.rules_dir().join(PROJECT_RULES_DOCUMENT);
        write(&overlay, "my precious overlay\n")?;

        // DeclineAll also answers no to the symlink question, so the shared
        // document lands as a copy.
        init_project(&fixture.document, &fixture.project, &DeclineAll)?;

        assert_eq!(read_to_string(&overlay)?, "my precious overlay\n");
        let shared = fixture.rules_dir().join(RULES_DOCUMENT);
        assert!(!shared.is_symlink());
        assert_eq!(read_to_string(&shared)?, "# canonical rules\n");

        Ok(())
    }

    #[test]
    fn existing_link_is_treated_as_current() -> anyhow::Result<()> {
        let fixture = Fixture::new()?;

        init_project(&fixture.document, &fixture.project, &AssumeYes)?;
        init_project(&fixture.document, &fixture.project, &AssumeYes)?;

        let shared = fixture.rules_dir().join(RULES_DOCUMENT);
        assert_eq!(fs::read_link(&shared)?, fixture.document);

        Ok(())
    }

    #[test]
    fn stale_copy_is_refreshed_with_backup() -> anyhow::Result<()> {
        let fixture = Fixture::new()?;
        fs::create_dir(fixture.rules_dir())?;
        let shared = fixture.rules_dir().join(RULES_DOCUMENT);
        write(&shared, "# stale rules\n")?;

        init_project(&fixture.document, &fixture.project, &AssumeYes)?;

        assert_eq!(read_to_string(&shared)?, "# canonical rules\n");
        let backup = crate::deploy::backup_path(&shared);
        assert_eq!(read_to_string(backup)?, "# stale rules\n");

        Ok(())
    }

    #[test]
    fn missing_target_directory_fails() {
        let temp = tempfile::tempdir().unwrap();
        let document = temp.path().join(RULES_DOCUMENT);
        let missing = temp.path().join("nope");

        let result = init_project(&document, &missing, &AssumeYes);
        assert!(matches!(result, Err(InitError::MissingTarget { .. })));
    }
}
