// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! User confirmation capability.
//!
//! Every destructive choice rulesync makes is gated behind a yes/no question.
//! The question itself is a capability so that callers can swap the terminal
//! prompt out for an assume-yes implementation in batch or test contexts.

use tracing::debug;

/// Layer of indirection for yes/no questions.
pub trait Confirmation {
    /// Ask the user a yes/no question.
    ///
    /// # Errors
    ///
    /// - Return [`PromptError`] if the answer cannot be obtained.
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Interactive confirmation through the terminal.
#[derive(Debug, Default, Clone)]
pub struct TerminalConfirmer;

impl Confirmation for TerminalConfirmer {
    fn confirm(&self, question: &str) -> Result<bool> {
        let answer = inquire::Confirm::new(question)
            .with_default(false)
            .prompt()?;

        Ok(answer)
    }
}

/// Non-interactive confirmation that accepts everything.
///
/// Selected by the global `--yes` flag, and the implementation of choice for
/// hook scripts, which never have a terminal to ask through.
#[derive(Debug, Default, Clone)]
pub struct AssumeYes;

impl Confirmation for AssumeYes {
    fn confirm(&self, question: &str) -> Result<bool> {
        debug!("assume yes: {question}");
        Ok(true)
    }
}

impl Confirmation for Box<dyn Confirmation> {
    fn confirm(&self, question: &str) -> Result<bool> {
        (**self).confirm(question)
    }
}

/// Confirmation prompt failure.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct PromptError(#[from] inquire::InquireError);

/// Friendly result alias :3
type Result<T, E = PromptError> = std::result::Result<T, E>;
