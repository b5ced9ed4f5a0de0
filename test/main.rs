// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! End-to-end synchronization and distribution tests against real local Git
//! repositories. No network involved: the "upstream" rules repository is a
//! bare fixture on disk that libgit2 clones and pulls through its path.

use rulesync::{
    cache::RulesCache,
    deploy::{DeployMode, Distributor},
    hooks::install_hooks,
    prompt::AssumeYes,
    source::Git2Source,
    RULES_DOCUMENT,
};

use anyhow::Result;
use git2::{IndexEntry, IndexTime, Repository, RepositoryInitOptions};
use pretty_assertions::assert_eq;
use std::{fs, path::Path};

/// Bare upstream rules repository fixture.
struct UpstreamFixture {
    repo: Repository,
}

impl UpstreamFixture {
    fn new(path: impl AsRef<Path>) -> Result<Self> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        opts.bare(true);
        let repo = Repository::init_opts(path.as_ref(), &opts)?;

        // INVARIANT: Always provide valid name and email.
        //   - Git will complain if this is not set in CI/CD environments.
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;

        Ok(Self { repo })
    }

    fn stage_and_commit(
        &self,
        filename: impl AsRef<Path>,
        contents: impl AsRef<str>,
    ) -> Result<()> {
        let entry = IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            file_size: contents.as_ref().len() as u32,
            id: self.repo.blob(contents.as_ref().as_bytes())?,
            flags: 0,
            flags_extended: 0,
            path: filename
                .as_ref()
                .as_os_str()
                .to_string_lossy()
                .into_owned()
                .as_bytes()
                .to_vec(),
        };

        // INVARIANT: Always use new tree produced by index after staging new entry.
        let mut index = self.repo.index()?;
        index.add_frombuffer(&entry, contents.as_ref().as_bytes())?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;

        // INVARIANT: Always determine latest parent commits to append to.
        let signature = self.repo.signature()?;
        let mut parents = Vec::new();
        if let Some(parent) = self.repo.head().ok().and_then(|head| head.target()) {
            parents.push(self.repo.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        // INVARIANT: Commit to HEAD by appending to obtained parent commits.
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            format!("docs: update {:?}", filename.as_ref()).as_ref(),
            &tree,
            &parents,
        )?;

        Ok(())
    }
}

#[test]
fn absent_cache_becomes_resolvable_document() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let upstream_path = temp.path().join("upstream.git");
    let upstream = UpstreamFixture::new(&upstream_path)?;
    upstream.stage_and_commit(RULES_DOCUMENT, "# shared rules v1\n")?;

    let cache_root = temp.path().join("cache").join("rules");
    let cache = RulesCache::new(
        &cache_root,
        upstream_path.to_string_lossy().into_owned(),
        "main",
        Git2Source,
    );

    cache.ensure_current()?;

    assert_eq!(
        fs::read_to_string(cache.document_path())?,
        "# shared rules v1\n"
    );

    Ok(())
}

#[test]
fn second_synchronization_pulls_upstream_changes() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let upstream_path = temp.path().join("upstream.git");
    let upstream = UpstreamFixture::new(&upstream_path)?;
    upstream.stage_and_commit(RULES_DOCUMENT, "# shared rules v1\n")?;

    let cache_root = temp.path().join("rules");
    let cache = RulesCache::new(
        &cache_root,
        upstream_path.to_string_lossy().into_owned(),
        "main",
        Git2Source,
    );
    cache.ensure_current()?;

    upstream.stage_and_commit(RULES_DOCUMENT, "# shared rules v2\n")?;
    cache.ensure_current()?;

    assert_eq!(
        fs::read_to_string(cache.document_path())?,
        "# shared rules v2\n"
    );

    Ok(())
}

#[test]
fn synchronized_document_distributes_by_copy_and_link() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let upstream_path = temp.path().join("upstream.git");
    let upstream = UpstreamFixture::new(&upstream_path)?;
    upstream.stage_and_commit(RULES_DOCUMENT, "# shared rules\n")?;

    let cache_root = temp.path().join("rules");
    let cache = RulesCache::new(
        &cache_root,
        upstream_path.to_string_lossy().into_owned(),
        "main",
        Git2Source,
    );
    cache.ensure_current()?;

    let copied = temp.path().join("copied-project");
    let linked = temp.path().join("linked-project");
    fs::create_dir(&copied)?;
    fs::create_dir(&linked)?;

    let distributor = Distributor::new(cache.document_path(), AssumeYes);
    distributor.deploy_into(&copied, DeployMode::Copy)?;
    distributor.deploy_into(&linked, DeployMode::Symlink)?;

    let copy = copied.join(RULES_DOCUMENT);
    assert!(!copy.is_symlink());
    assert_eq!(fs::read_to_string(copy)?, "# shared rules\n");

    let link = linked.join(RULES_DOCUMENT);
    assert_eq!(fs::read_link(link)?, cache.document_path());

    Ok(())
}

#[test]
fn hooks_install_into_real_repository() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let project = temp.path().join("project");
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(&project, &opts)?;

    install_hooks(&project)?;

    for name in ["post-checkout", "post-merge", "post-rewrite", "pre-commit"] {
        let hook = project.join(".git").join("hooks").join(name);
        assert!(hook.exists(), "{name} missing");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&hook)?.permissions().mode();
            assert_eq!(mode & 0o111, 0o111, "{name} not executable");
        }
    }

    Ok(())
}
