//! Version control adapter over a local git working tree.

use anyhow::{Context, Result, anyhow};
use git2::{BranchType, Repository, Signature};
use std::path::Path;

const COMMIT_AUTHOR: &str = "greenlight";
const COMMIT_EMAIL: &str = "greenlight@localhost";

/// The version control collaborator. One working tree per run; every commit
/// checkpoints the artifacts written since the last one. Only ever driven
/// from the single pipeline task, so no `Send`/`Sync` bound.
pub trait VersionControl {
    fn fetch(&self) -> Result<()>;
    /// Create and check out a new local branch from the current HEAD.
    /// Errors if the branch already exists.
    fn checkout_new_branch(&self, name: &str) -> Result<()>;
    /// Stage everything and commit. Returns the commit SHA.
    fn commit_all(&self, message: &str) -> Result<String>;
    fn push(&self, branch: &str) -> Result<()>;
    fn add_remote(&self, name: &str, url: &str) -> Result<()>;
}

/// git2-backed implementation of [`VersionControl`].
pub struct GitWorkspace {
    repo: Repository,
    /// Token for authenticated pushes over HTTPS, when available.
    token: Option<String>,
}

impl GitWorkspace {
    pub fn open(dir: &Path, token: Option<String>) -> Result<Self> {
        let repo = Repository::open(dir).context("Failed to open git repository")?;
        Ok(Self { repo, token })
    }

    /// Initialize a fresh repository with `main` as the initial branch.
    pub fn init(dir: &Path, token: Option<String>) -> Result<Self> {
        let repo = Repository::init(dir).context("Failed to initialize git repository")?;
        repo.set_head("refs/heads/main")
            .context("Failed to point HEAD at main")?;
        Ok(Self { repo, token })
    }

    fn head_commit(&self) -> Option<git2::Commit<'_>> {
        self.repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
    }

    fn callbacks(&self) -> git2::RemoteCallbacks<'_> {
        let mut callbacks = git2::RemoteCallbacks::new();
        if let Some(token) = self.token.clone() {
            callbacks.credentials(move |_url, _username, _allowed| {
                git2::Cred::userpass_plaintext("x-access-token", &token)
            });
        }
        callbacks
    }
}

impl VersionControl for GitWorkspace {
    fn fetch(&self) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote("origin")
            .context("Remote 'origin' not configured")?;
        let mut opts = git2::FetchOptions::new();
        opts.remote_callbacks(self.callbacks());
        remote
            .fetch(&[] as &[&str], Some(&mut opts), None)
            .context("Failed to fetch from origin")?;
        Ok(())
    }

    fn checkout_new_branch(&self, name: &str) -> Result<()> {
        if self.repo.find_branch(name, BranchType::Local).is_ok() {
            return Err(anyhow!("Branch '{name}' already exists"));
        }
        let head = self
            .head_commit()
            .ok_or_else(|| anyhow!("Repository has no commits to branch from"))?;
        self.repo
            .branch(name, &head, false)
            .with_context(|| format!("Failed to create branch '{name}'"))?;
        self.repo
            .set_head(&format!("refs/heads/{name}"))
            .with_context(|| format!("Failed to check out branch '{name}'"))?;
        self.repo
            .checkout_head(Some(git2::build::CheckoutBuilder::new().safe()))
            .context("Failed to update working tree for new branch")?;
        Ok(())
    }

    fn commit_all(&self, message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let sig = Signature::now(COMMIT_AUTHOR, COMMIT_EMAIL)?;

        // Unborn branch (fresh repo): initial commit has no parent
        let commit_id = if let Some(parent) = self.head_commit() {
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?
        } else {
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[])?
        };

        Ok(commit_id.to_string())
    }

    fn push(&self, branch: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote("origin")
            .context("Remote 'origin' not configured")?;
        let mut opts = git2::PushOptions::new();
        opts.remote_callbacks(self.callbacks());
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        remote
            .push(&[refspec.as_str()], Some(&mut opts))
            .with_context(|| format!("Failed to push branch '{branch}' to origin"))?;
        Ok(())
    }

    fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.repo
            .remote(name, url)
            .with_context(|| format!("Failed to add remote '{name}'"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn setup_repo() -> (GitWorkspace, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ws = GitWorkspace::init(dir.path(), None).unwrap();
        (ws, dir)
    }

    #[test]
    fn init_then_commit_all_creates_initial_commit() {
        let (ws, dir) = setup_repo();
        fs::write(dir.path().join("README.md"), "# hi").unwrap();
        let sha = ws.commit_all("chore: scaffold initial project").unwrap();
        assert_eq!(sha.len(), 40);

        let repo = Repository::open(dir.path()).unwrap();
        let head = repo.head().unwrap();
        assert_eq!(head.shorthand(), Some("main"));
        assert_eq!(
            head.peel_to_commit().unwrap().message(),
            Some("chore: scaffold initial project")
        );
    }

    #[test]
    fn commit_all_chains_parents() {
        let (ws, dir) = setup_repo();
        fs::write(dir.path().join("a.txt"), "one").unwrap();
        let first = ws.commit_all("first").unwrap();
        fs::write(dir.path().join("b.txt"), "two").unwrap();
        let second = ws.commit_all("second").unwrap();
        assert_ne!(first, second);

        let repo = Repository::open(dir.path()).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.parent_count(), 1);
        assert_eq!(head.parent(0).unwrap().id().to_string(), first);
    }

    #[test]
    fn checkout_new_branch_switches_head() {
        let (ws, dir) = setup_repo();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        ws.commit_all("init").unwrap();

        ws.checkout_new_branch("feature/add-caching").unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.head().unwrap().shorthand(), Some("feature/add-caching"));
    }

    #[test]
    fn checkout_new_branch_rejects_existing() {
        let (ws, dir) = setup_repo();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        ws.commit_all("init").unwrap();

        ws.checkout_new_branch("feature/dup").unwrap();
        let err = ws.checkout_new_branch("feature/dup").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn checkout_new_branch_requires_a_commit() {
        let (ws, _dir) = setup_repo();
        let err = ws.checkout_new_branch("feature/too-early").unwrap_err();
        assert!(err.to_string().contains("no commits"));
    }

    #[test]
    fn fetch_without_origin_is_an_error() {
        let (ws, _dir) = setup_repo();
        let err = ws.fetch().unwrap_err();
        assert!(err.to_string().contains("origin"));
    }

    #[test]
    fn add_remote_registers_origin() {
        let (ws, dir) = setup_repo();
        ws.add_remote("origin", "https://github.com/owner/repo.git")
            .unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        let remote = repo.find_remote("origin").unwrap();
        assert_eq!(remote.url(), Some("https://github.com/owner/repo.git"));
    }

    #[test]
    fn commits_on_branch_stay_off_main() {
        let (ws, dir) = setup_repo();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        ws.commit_all("init").unwrap();
        ws.checkout_new_branch("feature/work").unwrap();
        fs::write(dir.path().join("b.txt"), "y").unwrap();
        ws.commit_all("feat: work").unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let main = repo
            .find_branch("main", BranchType::Local)
            .unwrap()
            .get()
            .peel_to_commit()
            .unwrap();
        let feature = repo
            .find_branch("feature/work", BranchType::Local)
            .unwrap()
            .get()
            .peel_to_commit()
            .unwrap();
        assert_ne!(main.id(), feature.id());
        assert_eq!(feature.parent(0).unwrap().id(), main.id());
    }
}
