// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use rulesync::{
    cache::RulesCache,
    commit::validate_message_file,
    config::Settings,
    deploy::{BatchOutcome, DeployMode, Distributor},
    hooks::{install_hooks, install_hooks_batch},
    init::init_project,
    prompt::{AssumeYes, Confirmation, TerminalConfirmer},
};

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::{ffi::OsString, path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "rulesync [options] <command> [dir]...",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Answer yes to every confirmation prompt.
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    fn run(self) -> Result<()> {
        let Some(command) = self.command else {
            // No sub-command is a request for usage, not a failure.
            Cli::command().print_help()?;
            return Ok(());
        };

        let confirm = confirmer(self.yes);
        match command {
            Command::Update => run_update(),
            Command::Init(opts) => run_init(opts, confirm),
            Command::Apply(opts) => run_apply(opts, confirm),
            Command::Link(opts) => run_link(opts, confirm),
            Command::Hooks(opts) => run_hooks(opts),
            Command::HooksBatch(opts) => run_hooks_batch(opts),
            Command::CheckCommit(opts) => run_check_commit(opts),
            Command::Unknown(args) => {
                eprintln!("unknown command {:?}", args.first().cloned().unwrap_or_default());
                Cli::command().print_help()?;
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Synchronize the local rules cache with upstream.
    #[command(override_usage = "rulesync update")]
    Update,

    /// Initialize the two-file rules convention inside a project.
    #[command(override_usage = "rulesync init [options] [dir]")]
    Init(TargetOptions),

    /// Copy the shared rules document into one or more projects.
    #[command(override_usage = "rulesync apply [options] [dir]...")]
    Apply(ApplyOptions),

    /// Symlink the shared rules document into a project.
    #[command(override_usage = "rulesync link [options] [dir]")]
    Link(TargetOptions),

    /// Install rulesync git hooks into a project.
    #[command(override_usage = "rulesync hooks [dir]")]
    Hooks(TargetOptions),

    /// Install rulesync git hooks into every repository under a directory.
    #[command(override_usage = "rulesync hooks-batch [dir]")]
    HooksBatch(TargetOptions),

    /// Validate a commit message file. Invoked by the pre-commit hook.
    #[command(hide = true)]
    CheckCommit(CheckCommitOptions),

    /// Catch-all so an unrecognized sub-command prints usage instead of
    /// failing the process.
    #[command(external_subcommand)]
    Unknown(Vec<OsString>),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct TargetOptions {
    /// Target project directory.
    #[arg(value_name = "dir", default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ApplyOptions {
    /// Target project directories.
    #[arg(value_name = "dir", default_value = ".")]
    pub dirs: Vec<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CheckCommitOptions {
    /// Path of the commit message file to validate.
    #[arg(value_name = "file")]
    pub file: PathBuf,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn confirmer(yes: bool) -> Box<dyn Confirmation> {
    if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirmer)
    }
}

/// Synchronize the cache and hand back the canonical document path.
fn synchronized_document() -> Result<PathBuf> {
    let settings = Settings::load()?;
    let cache = RulesCache::from_settings(&settings)?;
    cache.ensure_current()?;
    Ok(cache.document_path())
}

fn run_update() -> Result<()> {
    let document = synchronized_document()?;
    println!("✓ rules cache current at {:?}", document.display());
    Ok(())
}

fn run_init(opts: TargetOptions, confirm: Box<dyn Confirmation>) -> Result<()> {
    let document = synchronized_document()?;
    init_project(&document, &opts.dir, &confirm)?;
    println!("✓ initialized rules convention in {:?}", opts.dir.display());
    Ok(())
}

fn run_apply(opts: ApplyOptions, confirm: Box<dyn Confirmation>) -> Result<()> {
    let document = synchronized_document()?;
    let distributor = Distributor::new(document, confirm);
    let outcome = distributor.deploy_batch(&opts.dirs, DeployMode::Copy);
    report_batch(&outcome)
}

fn run_link(opts: TargetOptions, confirm: Box<dyn Confirmation>) -> Result<()> {
    let document = synchronized_document()?;
    let distributor = Distributor::new(document, confirm);
    distributor.deploy_into(&opts.dir, DeployMode::Symlink)?;
    println!("✓ linked shared rules into {:?}", opts.dir.display());
    Ok(())
}

fn run_hooks(opts: TargetOptions) -> Result<()> {
    synchronized_document()?;
    install_hooks(&opts.dir)?;
    println!("✓ installed hooks into {:?}", opts.dir.display());
    Ok(())
}

fn run_hooks_batch(opts: TargetOptions) -> Result<()> {
    synchronized_document()?;
    let outcome = install_hooks_batch(&opts.dir)?;
    report_batch(&outcome)
}

fn run_check_commit(opts: CheckCommitOptions) -> Result<()> {
    validate_message_file(&opts.file)?;
    Ok(())
}

/// Print a batch summary, and surface any per-item failure in the process
/// exit status.
fn report_batch(outcome: &BatchOutcome) -> Result<()> {
    if outcome.has_failures() {
        println!("✗ {outcome}");
        return Err(anyhow!("{} target(s) failed", outcome.fail_count));
    }

    println!("✓ {outcome}");
    Ok(())
}
